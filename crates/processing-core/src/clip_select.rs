//! Clip window selection.
//!
//! Every proxy is cut from a single window of [`CLIP_DURATION_SECS`] placed
//! uniformly at random inside the source. Sources shorter than the window
//! are rejected, which is an expected outcome rather than an error.

use proxygen_media_model::clip::{ClipSelection, ClipWindow, CLIP_DURATION_SECS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniformly distributed floats.
pub trait RandomSource: Send {
    /// Draw a value from the closed range `[lo, hi]`.
    fn next_float(&mut self, lo: f64, hi: f64) -> f64;
}

/// Unseeded generator backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_float(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        rand::thread_rng().gen_range(lo..=hi)
    }
}

/// Seeded generator for reproducible runs.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_float(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..=hi)
    }
}

/// Picks the clip window for a source of known duration.
#[derive(Debug, Clone, Copy)]
pub struct ClipSelector {
    window_secs: f64,
}

impl ClipSelector {
    pub fn new() -> Self {
        Self {
            window_secs: CLIP_DURATION_SECS,
        }
    }

    /// Choose a window inside a source lasting `total_duration_secs`.
    pub fn select(&self, total_duration_secs: f64, rng: &mut dyn RandomSource) -> ClipSelection {
        if !total_duration_secs.is_finite() {
            return ClipSelection::Rejected {
                reason: "unknown duration".to_string(),
            };
        }
        if total_duration_secs < self.window_secs {
            return ClipSelection::Rejected {
                reason: "too short".to_string(),
            };
        }

        let max_start = total_duration_secs - self.window_secs;
        // Clamp guards against generators that stray outside the range.
        let start = rng.next_float(0.0, max_start).clamp(0.0, max_start);
        ClipSelection::Window(ClipWindow::starting_at(start))
    }
}

impl Default for ClipSelector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Always returns the same position within the range.
    struct FixedFraction(f64);

    impl RandomSource for FixedFraction {
        fn next_float(&mut self, lo: f64, hi: f64) -> f64 {
            lo + (hi - lo) * self.0
        }
    }

    /// Returns a value outside any sane range.
    struct Wild;

    impl RandomSource for Wild {
        fn next_float(&mut self, _lo: f64, hi: f64) -> f64 {
            hi + 100.0
        }
    }

    fn window(selection: ClipSelection) -> ClipWindow {
        match selection {
            ClipSelection::Window(window) => window,
            other => panic!("expected a window, got {other:?}"),
        }
    }

    #[test]
    fn test_short_clip_is_rejected() {
        let selection = ClipSelector::new().select(3.0, &mut ThreadRandom);
        assert_eq!(
            selection,
            ClipSelection::Rejected {
                reason: "too short".to_string()
            }
        );
    }

    #[test]
    fn test_exact_length_starts_at_zero() {
        let w = window(ClipSelector::new().select(5.0, &mut ThreadRandom));
        assert_eq!(w.start_secs, 0.0);
        assert_eq!(w.duration_secs, 5.0);
    }

    #[test]
    fn test_injected_source_controls_start() {
        let selector = ClipSelector::new();
        assert_eq!(window(selector.select(25.0, &mut FixedFraction(0.0))).start_secs, 0.0);
        assert_eq!(window(selector.select(25.0, &mut FixedFraction(1.0))).start_secs, 20.0);
        assert_eq!(window(selector.select(25.0, &mut FixedFraction(0.5))).start_secs, 10.0);
    }

    #[test]
    fn test_out_of_range_source_is_clamped() {
        let w = window(ClipSelector::new().select(12.0, &mut Wild));
        assert!(w.fits_within(12.0));
    }

    #[test]
    fn test_non_finite_duration_is_rejected() {
        let selector = ClipSelector::new();
        assert!(matches!(
            selector.select(f64::NAN, &mut ThreadRandom),
            ClipSelection::Rejected { .. }
        ));
        assert!(matches!(
            selector.select(f64::INFINITY, &mut ThreadRandom),
            ClipSelection::Rejected { .. }
        ));
    }

    #[test]
    fn test_seeded_source_is_reproducible() {
        let selector = ClipSelector::new();
        let a = selector.select(600.0, &mut SeededRandom::new(42));
        let b = selector.select(600.0, &mut SeededRandom::new(42));
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_short_durations_are_rejected(d in 0.0f64..5.0) {
            let selection = ClipSelector::new().select(d, &mut ThreadRandom);
            let is_rejected = matches!(selection, ClipSelection::Rejected { .. });
            prop_assert!(is_rejected);
        }

        #[test]
        fn prop_windows_fit_inside_source(d in 5.0f64..100_000.0, seed in any::<u64>()) {
            let selection = ClipSelector::new().select(d, &mut SeededRandom::new(seed));
            match selection {
                ClipSelection::Window(w) => {
                    prop_assert!(w.start_secs >= 0.0);
                    prop_assert!(w.start_secs <= d - 5.0);
                    prop_assert_eq!(w.duration_secs, 5.0);
                }
                ClipSelection::Rejected { reason } => {
                    prop_assert!(false, "unexpected rejection: {}", reason);
                }
            }
        }
    }
}
