//! Signal conditioning: single-pole low-pass filters and the small median
//! filter used to smooth single-event FF estimates.

use core::f32::consts::PI;

/// A single-pole (RC) low-pass filter, parameterized by cutoff frequency and
/// loop rate at construction.
#[derive(Debug, Clone, Copy)]
pub struct LowPassFilter {
    alpha: f32,
    output: f32,
    initialized: bool,
}

impl LowPassFilter {
    /// `cutoff_hz` is the -3dB point; `loop_rate_hz` is the sample rate this
    /// filter will be driven at.
    pub fn new(cutoff_hz: f32, loop_rate_hz: f32) -> Self {
        let dt = 1.0 / loop_rate_hz;
        let rc = 1.0 / (2.0 * PI * cutoff_hz);
        let alpha = dt / (dt + rc);
        Self {
            alpha,
            output: 0.0,
            initialized: false,
        }
    }

    /// Advance the filter by one sample and return the new output.
    ///
    /// Non-finite input is ignored and the previous output returned
    /// unchanged, since a single corrupt telemetry sample must never poison
    /// the filter state.
    pub fn apply(&mut self, input: f32) -> f32 {
        if !input.is_finite() {
            return self.output;
        }
        if !self.initialized {
            self.output = input;
            self.initialized = true;
            return self.output;
        }
        self.output += self.alpha * (input - self.output);
        self.output
    }

    /// Current filter output without advancing it.
    pub fn value(&self) -> f32 {
        self.output
    }

    /// Reset the filter, as on `start`. The next `apply` call seeds the
    /// output directly from its input rather than blending.
    pub fn reset(&mut self) {
        self.output = 0.0;
        self.initialized = false;
    }
}

/// A small fixed-size median filter over the last `N` samples.
///
/// The tuner only ever uses `N = 2`; kept generic because the median of a
/// ring buffer is the same computation regardless of width.
#[derive(Debug, Clone, Copy)]
pub struct MedianFilter<const N: usize> {
    buf: [f32; N],
    len: usize,
    next: usize,
}

impl<const N: usize> MedianFilter<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0.0; N],
            len: 0,
            next: 0,
        }
    }

    /// Push a sample and return the median of the buffered window.
    ///
    /// Non-finite input is dropped rather than inserted, so one bad estimate
    /// cannot corrupt the next `N - 1` outputs.
    pub fn apply(&mut self, input: f32) -> f32 {
        if !input.is_finite() {
            return self.median();
        }
        self.buf[self.next] = input;
        self.next = (self.next + 1) % N;
        self.len = (self.len + 1).min(N);
        self.median()
    }

    fn median(&self) -> f32 {
        if self.len == 0 {
            return 0.0;
        }
        let mut sorted = self.buf;
        let slice = &mut sorted[..self.len];
        slice.sort_by(|a, b| a.partial_cmp(b).unwrap_or(core::cmp::Ordering::Equal));
        let mid = self.len / 2;
        if self.len % 2 == 0 {
            (slice[mid - 1] + slice[mid]) / 2.0
        } else {
            slice[mid]
        }
    }

    /// Reset to empty, as on `start`.
    pub fn reset(&mut self) {
        self.len = 0;
        self.next = 0;
    }
}

impl<const N: usize> Default for MedianFilter<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn low_pass_first_sample_seeds_output() {
        let mut f = LowPassFilter::new(0.75, 400.0);
        assert_relative_eq!(f.apply(10.0), 10.0);
    }

    #[test]
    fn low_pass_converges_toward_constant_input() {
        let mut f = LowPassFilter::new(0.75, 400.0);
        let mut last = f.apply(0.0);
        for _ in 0..2000 {
            last = f.apply(10.0);
        }
        assert_relative_eq!(last, 10.0, epsilon = 0.01);
    }

    #[test]
    fn low_pass_ignores_non_finite_input() {
        let mut f = LowPassFilter::new(0.75, 400.0);
        f.apply(5.0);
        let before = f.value();
        f.apply(f32::NAN);
        assert_eq!(f.value(), before);
    }

    #[test]
    fn median_of_two_is_their_average() {
        let mut m: MedianFilter<2> = MedianFilter::new();
        m.apply(1.0);
        let out = m.apply(3.0);
        assert_relative_eq!(out, 2.0);
    }

    #[test]
    fn median_single_sample_returns_itself() {
        let mut m: MedianFilter<2> = MedianFilter::new();
        assert_relative_eq!(m.apply(7.0), 7.0);
    }
}
