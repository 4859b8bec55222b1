use approx::assert_relative_eq;
use tuner_core::gate::SignalGate;
use tuner_core::synthetic::{ToneSource, Waveform};
use tuner_core::{Analyzer, PitchClass, PitchEstimator, ReferencePitch, TunerConfig, TunerReading};

fn tone(waveform: Waveform, frequency: f32, sample_rate: u32) -> Vec<f32> {
    ToneSource::sine(frequency, sample_rate)
        .with_waveform(waveform)
        .render(0, 2048)
}

fn pure_frequency(waveform: Waveform, frequency: f32, sample_rate: u32) {
    let signal = tone(waveform, frequency, sample_rate);
    let estimate = PitchEstimator::default()
        .estimate(&signal, sample_rate)
        .unwrap_or_else(|| panic!("{frequency} Hz at {sample_rate} Hz was not detected"));

    assert!(estimate.confidence > 0.9);
    assert_relative_eq!(estimate.frequency, frequency, max_relative = 0.01);
}

#[test]
fn sine_across_the_detection_range() {
    for &f in &[
        40.0, 41.2, 55.0, 82.41, 110.0, 146.83, 196.0, 261.63, 329.63, 440.0, 587.33, 700.0,
        790.0,
    ] {
        pure_frequency(Waveform::Sine, f, 44100);
    }
}

#[test]
fn sine_at_48k() {
    for &f in &[50.0, 98.0, 220.0, 440.0, 659.25, 790.0] {
        pure_frequency(Waveform::Sine, f, 48000);
    }
}

#[test]
fn square_signal() {
    pure_frequency(Waveform::Square, 220.0, 44100);
    pure_frequency(Waveform::Square, 440.0, 44100);
}

#[test]
fn white_noise_is_inconclusive() {
    // Linear congruential generator, deterministic across runs
    let mut state: u32 = 0x1234_5678;
    let noise: Vec<f32> = (0..2048)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 8) as f32 / (1u32 << 24) as f32 * 0.6 - 0.3
        })
        .collect();

    assert!(SignalGate::default().is_usable(&noise));
    assert!(PitchEstimator::default().estimate(&noise, 44100).is_none());

    let mut analyzer = Analyzer::new(&TunerConfig::default(), 44100);
    assert_eq!(analyzer.process(&noise), TunerReading::NoSignal);
}

#[test]
fn silence_never_reaches_the_estimator() {
    let mut analyzer = Analyzer::new(&TunerConfig::default(), 44100);
    let reading = analyzer.process(&tone(Waveform::Silence, 0.0, 44100));
    assert_eq!(reading, TunerReading::NoSignal);
    assert!(analyzer.estimate().is_none());
}

#[test]
fn identical_frames_give_identical_readings() {
    let frame = tone(Waveform::Sine, 293.66, 44100);
    let mut analyzer = Analyzer::new(&TunerConfig::default(), 44100);
    let first = analyzer.process(&frame);
    let second = analyzer.process(&frame);
    assert_eq!(first, second);

    let mut fresh = Analyzer::new(&TunerConfig::default(), 44100);
    assert_eq!(fresh.process(&frame), first);
    assert_eq!(first.note().map(|n| n.note), Some(PitchClass::D));
}

#[test]
fn reference_432_reads_a440_sharp() {
    let frame = tone(Waveform::Sine, 440.0, 48000);

    let mut standard = Analyzer::new(&TunerConfig::default(), 48000);
    let mut baroque = Analyzer::new(
        &TunerConfig::default().with_reference(ReferencePitch::A432),
        48000,
    );

    let at_440 = *standard.process(&frame).note().expect("reading at 440");
    let at_432 = *baroque.process(&frame).note().expect("reading at 432");

    assert_eq!(at_440.note, PitchClass::A);
    assert_eq!(at_432.note, PitchClass::A);
    assert!(at_432.cents > at_440.cents + 25);
}

#[test]
fn custom_gate_threshold_rejects_quiet_tones() {
    let config = TunerConfig {
        gate_threshold: 0.5,
        ..TunerConfig::default()
    };
    let mut analyzer = Analyzer::new(&config, 44100);
    // amplitude 0.5 sine has an RMS of about 0.35
    let reading = analyzer.process(&tone(Waveform::Sine, 440.0, 44100));
    assert_eq!(reading, TunerReading::NoSignal);
}
