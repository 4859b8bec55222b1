//! # Musical Tuning Module
//!
//! Converts a detected frequency into a chromatic note and a deviation in cents,
//! relative to a configurable A4 reference in twelve-tone equal temperament.
//!
//! ## Mapping
//! - `note_number = 12 * log2(f / a4)`: continuous semitones from A4
//! - `rounded = round(note_number)`: nearest tempered note
//! - `class = (rounded + 57) mod 12`: index into a chromatic table starting at C
//! - `cents = floor(100 * (note_number - rounded))`: positive is sharp

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ReferencePitch;
use crate::pitch::PitchEstimate;

/// Semitones from C0 to A4. Places A4 at index 9 of the chromatic table.
const A4_OFFSET_FROM_C0: i32 = 57;

/// One of the twelve pitch classes, starting at C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    /// The chromatic scale from C to B.
    pub const CHROMATIC: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Looks up a class by its position in [`PitchClass::CHROMATIC`], wrapping around.
    pub fn from_index(index: i32) -> Self {
        Self::CHROMATIC[index.rem_euclid(12) as usize]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A concrete tuner reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteReading {
    pub note: PitchClass,
    /// Octave in scientific pitch notation (A4 is octave 4).
    pub octave: i32,
    /// Deviation from the tempered note, roughly in (-50, 50]. Positive is sharp.
    pub cents: i32,
    /// The raw detected frequency in Hz.
    pub frequency: f32,
    /// Estimator confidence in [0, 1].
    pub confidence: f32,
}

impl fmt::Display for NoteReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} {:+}¢", self.note, self.octave, self.cents)
    }
}

/// What the tuner shows after one analysis cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TunerReading {
    /// Silence, noise, or an inconclusive cycle.
    #[default]
    NoSignal,
    Note(NoteReading),
}

impl TunerReading {
    pub fn note(&self) -> Option<&NoteReading> {
        match self {
            TunerReading::Note(reading) => Some(reading),
            TunerReading::NoSignal => None,
        }
    }

    pub fn is_signal(&self) -> bool {
        matches!(self, TunerReading::Note(_))
    }
}

impl fmt::Display for TunerReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TunerReading::Note(reading) => fmt::Display::fmt(reading, f),
            TunerReading::NoSignal => f.write_str("--"),
        }
    }
}

/// Maps frequencies to notes against a fixed A4 reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteMapper {
    reference: ReferencePitch,
}

impl NoteMapper {
    pub fn new(reference: ReferencePitch) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> ReferencePitch {
        self.reference
    }

    /// Continuous semitone distance of `frequency` from A4.
    pub fn note_number(&self, frequency: f32) -> f32 {
        12.0 * (frequency / self.reference.hz()).log2()
    }

    /// Maps a frequency to the nearest tempered note.
    ///
    /// Returns `None` for non-positive or non-finite frequencies; the gate and
    /// the confidence threshold keep those from reaching this stage.
    pub fn map(&self, frequency: f32) -> Option<NoteReading> {
        if !(frequency > 0.0 && frequency.is_finite()) {
            return None;
        }

        let note_number = self.note_number(frequency);
        let rounded = note_number.round();
        let semitone = rounded as i32 + A4_OFFSET_FROM_C0;
        let cents = (100.0 * (note_number - rounded)).floor() as i32;

        Some(NoteReading {
            note: PitchClass::from_index(semitone),
            octave: semitone.div_euclid(12),
            cents,
            frequency,
            confidence: 1.0,
        })
    }

    /// Maps a pitch estimate, carrying its confidence into the reading.
    pub fn map_estimate(&self, estimate: &PitchEstimate) -> TunerReading {
        match self.map(estimate.frequency) {
            Some(reading) => TunerReading::Note(NoteReading {
                confidence: estimate.confidence,
                ..reading
            }),
            None => TunerReading::NoSignal,
        }
    }
}

impl Default for NoteMapper {
    fn default() -> Self {
        Self::new(ReferencePitch::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map440(frequency: f32) -> NoteReading {
        NoteMapper::new(ReferencePitch::A440)
            .map(frequency)
            .expect("positive frequency")
    }

    #[test]
    fn a4_is_exact() {
        let reading = map440(440.0);
        assert_eq!(reading.note, PitchClass::A);
        assert_eq!(reading.octave, 4);
        assert_eq!(reading.cents, 0);
    }

    #[test]
    fn middle_c() {
        let reading = map440(261.63);
        assert_eq!(reading.note, PitchClass::C);
        assert_eq!(reading.octave, 4);
        assert!(reading.cents.abs() <= 1, "cents = {}", reading.cents);
    }

    #[test]
    fn a_sharp_4() {
        let reading = map440(466.16);
        assert_eq!(reading.note, PitchClass::ASharp);
        assert!(reading.cents.abs() <= 1, "cents = {}", reading.cents);
    }

    #[test]
    fn low_e_string() {
        let reading = map440(82.41);
        assert_eq!(reading.note, PitchClass::E);
        assert_eq!(reading.octave, 2);
    }

    #[test]
    fn lower_reference_reads_sharp() {
        let at_440 = map440(440.0);
        let at_432 = NoteMapper::new(ReferencePitch::A432).map(440.0).unwrap();
        assert_eq!(at_432.note, at_440.note);
        assert!(at_432.cents > at_440.cents);
        assert_eq!(at_432.cents, 31);
    }

    #[test]
    fn slightly_flat_is_negative() {
        // 10 cents below A4
        let reading = map440(440.0 * 2f32.powf(-10.0 / 1200.0));
        assert_eq!(reading.note, PitchClass::A);
        assert!((-11..=-9).contains(&reading.cents), "cents = {}", reading.cents);
    }

    #[test]
    fn quarter_tone_sharp_rounds_up_a_semitone() {
        // 60 cents above A4 is 40 cents below A#4
        let reading = map440(440.0 * 2f32.powf(60.0 / 1200.0));
        assert_eq!(reading.note, PitchClass::ASharp);
        assert!((-41..=-39).contains(&reading.cents), "cents = {}", reading.cents);
    }

    #[test]
    fn non_positive_frequency_is_rejected() {
        let mapper = NoteMapper::default();
        assert!(mapper.map(0.0).is_none());
        assert!(mapper.map(-5.0).is_none());
        assert!(mapper.map(f32::NAN).is_none());
    }

    #[test]
    fn sub_c0_frequencies_wrap_class_index() {
        // B-1 is below C0; the index must still land in the table
        let reading = map440(15.43);
        assert_eq!(reading.note, PitchClass::B);
        assert_eq!(reading.octave, -1);
    }

    #[test]
    fn display_formats() {
        assert_eq!(TunerReading::NoSignal.to_string(), "--");
        let reading = TunerReading::Note(map440(440.0));
        assert_eq!(reading.to_string(), "A4 +0¢");
    }
}
