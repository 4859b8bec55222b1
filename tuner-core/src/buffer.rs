//! # Sample Buffer Module
//!
//! Holds the most recent audio samples for analysis. Capture callbacks hand over
//! frames of arbitrary length; the window keeps only the newest `capacity`
//! samples and never reallocates after construction.

/// Fixed-capacity window over the most recent samples of a stream.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: Vec<f32>,
    filled: usize,
    sample_rate: u32,
}

impl SampleWindow {
    /// Creates an empty window holding up to `capacity` samples.
    pub fn new(capacity: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![0.0; capacity],
            filled: 0,
            sample_rate,
        }
    }

    /// Appends a frame, discarding the oldest samples once the window is full.
    ///
    /// Frames longer than the capacity replace the whole window with their tail.
    pub fn push(&mut self, frame: &[f32]) {
        let capacity = self.samples.len();
        if frame.len() >= capacity {
            self.samples
                .copy_from_slice(&frame[frame.len() - capacity..]);
            self.filled = capacity;
            return;
        }

        let keep = self.filled.min(capacity - frame.len());
        // Move the newest `keep` samples to the front, then append the frame.
        let start = self.filled - keep;
        self.samples.copy_within(start..self.filled, 0);
        self.samples[keep..keep + frame.len()].copy_from_slice(frame);
        self.filled = keep + frame.len();
    }

    /// The buffered samples, oldest first.
    pub fn samples(&self) -> &[f32] {
        &self.samples[..self.filled]
    }

    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn is_full(&self) -> bool {
        self.filled == self.samples.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Forgets all buffered samples without releasing the storage.
    pub fn clear(&mut self) {
        self.filled = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_frames_accumulate_in_order() {
        let mut window = SampleWindow::new(4, 8000);
        window.push(&[1.0, 2.0]);
        window.push(&[3.0]);
        assert_eq!(window.samples(), &[1.0, 2.0, 3.0]);
        assert!(!window.is_full());
    }

    #[test]
    fn overflow_keeps_newest_samples() {
        let mut window = SampleWindow::new(4, 8000);
        window.push(&[1.0, 2.0, 3.0]);
        window.push(&[4.0, 5.0]);
        assert_eq!(window.samples(), &[2.0, 3.0, 4.0, 5.0]);
        assert!(window.is_full());
    }

    #[test]
    fn long_frame_replaces_window_with_its_tail() {
        let mut window = SampleWindow::new(3, 8000);
        window.push(&[1.0]);
        window.push(&[2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(window.samples(), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn empty_frame_is_a_no_op() {
        let mut window = SampleWindow::new(3, 8000);
        window.push(&[1.0, 2.0]);
        window.push(&[]);
        assert_eq!(window.samples(), &[1.0, 2.0]);
    }

    #[test]
    fn storage_is_reused() {
        let mut window = SampleWindow::new(2048, 44100);
        let before = window.samples.as_ptr();
        for _ in 0..10 {
            window.push(&[0.5; 512]);
        }
        window.clear();
        window.push(&[0.25; 3000]);
        assert_eq!(window.samples.as_ptr(), before);
        assert_eq!(window.capacity(), 2048);
        assert_eq!(window.sample_rate(), 44100);
    }
}
