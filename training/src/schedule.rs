//! Sample-count-driven learning-rate and momentum schedules.

use ml_core::HyperParameters;

/// Annealed learning rate after `samples_seen` training rows.
///
/// `rate / (1 + rate_annealing * samples_seen)`.
#[inline]
pub(crate) fn effective_rate(params: &HyperParameters, samples_seen: u64) -> f32 {
    params.rate / (1.0 + params.rate_annealing * samples_seen as f32)
}

/// Piecewise-linear momentum: `momentum_start` at zero samples, interpolated
/// up to `momentum_stable` over `momentum_ramp` samples, constant afterwards.
#[inline]
pub(crate) fn effective_momentum(params: &HyperParameters, samples_seen: u64) -> f32 {
    if params.momentum_ramp == 0 || samples_seen >= params.momentum_ramp {
        return params.momentum_stable;
    }
    let t = samples_seen as f32 / params.momentum_ramp as f32;
    params.momentum_start + (params.momentum_stable - params.momentum_start) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> HyperParameters {
        HyperParameters {
            rate: 0.005,
            rate_annealing: 1e-6,
            momentum_start: 0.5,
            momentum_ramp: 100_000,
            momentum_stable: 0.9,
            ..Default::default()
        }
    }

    #[test]
    fn rate_anneals_with_samples() {
        let p = params();
        assert_eq!(effective_rate(&p, 0), 0.005);
        let annealed = effective_rate(&p, 1_000_000);
        assert!((annealed - 0.005 / 2.0).abs() < 1e-9);
    }

    #[test]
    fn momentum_boundaries() {
        let p = params();
        assert_eq!(effective_momentum(&p, 0), 0.5);
        assert_eq!(effective_momentum(&p, 100_000), 0.9);
        assert_eq!(effective_momentum(&p, 1_000_000), 0.9);
    }

    #[test]
    fn momentum_midpoint_interpolates() {
        let p = params();
        let mid = effective_momentum(&p, 50_000);
        assert!((mid - 0.7).abs() < 1e-6);
    }

    #[test]
    fn momentum_is_monotonic_on_the_ramp() {
        let p = params();
        let mut prev = effective_momentum(&p, 0);
        for n in (0..=100_000u64).step_by(5_000) {
            let m = effective_momentum(&p, n);
            assert!(m >= prev, "momentum decreased at {n} samples");
            prev = m;
        }
    }

    #[test]
    fn zero_ramp_jumps_to_stable() {
        let p = HyperParameters {
            momentum_ramp: 0,
            ..params()
        };
        assert_eq!(effective_momentum(&p, 0), 0.9);
    }
}
