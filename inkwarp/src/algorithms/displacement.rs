//! Deterministic displacement field.
//!
//! Offsets are pure functions of `(mode, index, t, strength, frequency, seed)`
//! built on a sine hash, so a given parameter set always produces the same
//! distortion.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Rounds halves towards positive infinity, so `-0.5` steps to `0`.
#[inline]
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// `frac(sin(v) * 10000)`, in `[0, 1)`.
#[inline]
pub fn rand(v: f64) -> f64 {
    let x = v.sin() * 10000.0;
    x - x.floor()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistortionMode {
    Noise,
    Jitter,
    Hand,
    Roughen,
    Tear,
    InkSpread,
    Offset,
    #[default]
    #[serde(other)]
    PrintPress,
}

impl DistortionMode {
    pub const ALL: [DistortionMode; 8] = [
        DistortionMode::Noise,
        DistortionMode::Jitter,
        DistortionMode::Hand,
        DistortionMode::Roughen,
        DistortionMode::Tear,
        DistortionMode::InkSpread,
        DistortionMode::Offset,
        DistortionMode::PrintPress,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DistortionMode::Noise => "noise",
            DistortionMode::Jitter => "jitter",
            DistortionMode::Hand => "hand",
            DistortionMode::Roughen => "roughen",
            DistortionMode::Tear => "tear",
            DistortionMode::InkSpread => "ink-spread",
            DistortionMode::Offset => "offset",
            DistortionMode::PrintPress => "print-press",
        }
    }

    /// Unknown ids fall back to print-press.
    pub fn from_id(id: &str) -> DistortionMode {
        Self::ALL.into_iter().find(|m| m.as_str() == id).unwrap_or_default()
    }

    /// Offset `(dx, dy)` for one sample.
    pub fn offset(self, index: usize, t: f64, strength: f64, frequency: f64, seed: f64) -> (f64, f64) {
        let i = index as f64;
        let base = rand(seed + i * 12.9898);
        let alt = rand(seed * 2.133 + i * 78.233);
        let a = base - 0.5;
        let b = alt - 0.5;
        let s = strength;
        let phase = (t * frequency * 2.0 + seed * 0.1) * PI;
        match self {
            DistortionMode::Noise => (phase.sin() * s, phase.cos() * s),
            DistortionMode::Jitter => (a * s, b * s),
            DistortionMode::Hand => ((phase * 0.6).sin() * 0.8 * s, (phase * 0.9).sin() * 0.8 * s),
            DistortionMode::Roughen => {
                let step = |c: f64| round_half_up(c * 4.0) / 4.0;
                (step(a) * 1.2 * s, step(b) * 1.2 * s)
            }
            DistortionMode::Tear => {
                let saw = (t * frequency * 0.6).rem_euclid(1.0);
                let spike = if base > 0.86 { 1.8 } else { 1.0 };
                ((saw - 0.5) * s * 2.2 * spike, b * s * 0.6 * spike)
            }
            DistortionMode::InkSpread => (0.4 * a * s, 0.4 * b * s),
            DistortionMode::Offset => {
                let theta = seed.rem_euclid(360.0).to_radians();
                (theta.cos() * 0.6 * s + 0.2 * a * s, theta.sin() * 0.6 * s + 0.2 * b * s)
            }
            DistortionMode::PrintPress => {
                let spike = if base > 0.9 { 1.7 } else { 0.9 };
                (a * s * spike, b * s * spike)
            }
        }
    }
}

impl std::fmt::Display for DistortionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frequency the field actually runs at: gentle below 50, slower growth above.
pub fn effective_frequency(frequency: f64) -> f64 {
    let f = if frequency <= 50.0 { frequency / 6.0 } else { 50.0 / 6.0 + (frequency - 50.0) / 8.0 };
    f.max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rand_is_a_fraction() {
        for v in [0.0, 1.0, -3.5, 12.9898, 1e6] {
            let r = rand(v);
            assert!((0.0..1.0).contains(&r), "rand({v}) = {r}");
        }
        assert_eq!(rand(0.0), 0.0);
    }

    #[test]
    fn mode_ids_round_trip_and_fall_back() {
        for m in DistortionMode::ALL {
            assert_eq!(DistortionMode::from_id(m.as_str()), m);
            let json = serde_json::to_string(&m).unwrap();
            assert_eq!(json, format!("\"{}\"", m.as_str()));
        }
        assert_eq!(DistortionMode::from_id("wobble"), DistortionMode::PrintPress);
        let m: DistortionMode = serde_json::from_str("\"wobble\"").unwrap();
        assert_eq!(m, DistortionMode::PrintPress);
    }

    #[test]
    fn zero_strength_means_zero_offset() {
        for m in DistortionMode::ALL {
            let (dx, dy) = m.offset(7, 0.3, 0.0, 3.0, 8.0);
            assert_eq!(dx.abs() + dy.abs(), 0.0, "{m}");
        }
    }

    #[test]
    fn jitter_is_bounded_by_half_strength() {
        for i in 0..200 {
            let (dx, dy) = DistortionMode::Jitter.offset(i, 0.0, 10.0, 1.0, 8.0);
            assert!(dx.abs() <= 5.0 && dy.abs() <= 5.0);
        }
    }

    #[test]
    fn roughen_steps_are_quarters() {
        assert_eq!(round_half_up(-0.5), 0.0);
        assert_eq!(round_half_up(0.5), 1.0);
        for i in 0..100 {
            let (dx, _) = DistortionMode::Roughen.offset(i, 0.0, 1.0, 1.0, 3.0);
            let q = dx / 1.2 * 4.0;
            assert!((q - q.round()).abs() < 1e-9);
        }
    }

    fn close(got: (f64, f64), want: (f64, f64)) -> bool {
        (got.0 - want.0).abs() < 1e-9 && (got.1 - want.1).abs() < 1e-9
    }

    /// First index whose `base` hash with seed 0 is above `threshold`.
    fn spiking_index(threshold: f64) -> usize {
        (1..1000).find(|&i| rand(i as f64 * 12.9898) > threshold).expect("some index spikes")
    }

    // With seed 0 and index 0 both hashes are 0, so a = b = -0.5.

    #[test]
    fn hashed_modes_at_the_origin() {
        let at = |m: DistortionMode| m.offset(0, 0.3, 10.0, 4.0, 0.0);
        assert!(close(at(DistortionMode::Jitter), (-5.0, -5.0)));
        assert!(close(at(DistortionMode::Roughen), (-6.0, -6.0)));
        assert!(close(at(DistortionMode::InkSpread), (-2.0, -2.0)));
        assert!(close(at(DistortionMode::PrintPress), (-4.5, -4.5)));
    }

    #[test]
    fn noise_and_hand_follow_the_phase() {
        // t·f·2 = 0.5, phase = π/2
        assert!(close(DistortionMode::Noise.offset(5, 0.25, 3.0, 1.0, 0.0), (3.0, 0.0)));
        // phase = π; sin(0.6π) = 0.9510565163, sin(0.9π) = 0.3090169944
        let hand = DistortionMode::Hand.offset(5, 0.5, 10.0, 1.0, 0.0);
        assert!(close(hand, (7.608452130361228, 2.472135954999579)), "{hand:?}");
        // seed 10 shifts the phase by π
        let shifted = DistortionMode::Noise.offset(0, 0.0, 2.0, 1.0, 10.0);
        assert!(close(shifted, (0.0, -2.0)), "{shifted:?}");
    }

    #[test]
    fn tear_saw_and_spike() {
        // saw = (0.5·2·0.6) mod 1 = 0.6
        let calm = DistortionMode::Tear.offset(0, 0.5, 10.0, 2.0, 0.0);
        assert!(close(calm, (2.2, -3.0)), "{calm:?}");

        let i = spiking_index(0.86);
        let b = rand(i as f64 * 78.233) - 0.5;
        let spiked = DistortionMode::Tear.offset(i, 0.5, 10.0, 2.0, 0.0);
        assert!(close(spiked, (0.1 * 10.0 * 2.2 * 1.8, b * 10.0 * 0.6 * 1.8)), "{spiked:?}");
    }

    #[test]
    fn print_press_spike() {
        let i = spiking_index(0.9);
        let a = rand(i as f64 * 12.9898) - 0.5;
        let b = rand(i as f64 * 78.233) - 0.5;
        let spiked = DistortionMode::PrintPress.offset(i, 0.0, 10.0, 1.0, 0.0);
        assert!(close(spiked, (a * 17.0, b * 17.0)), "{spiked:?}");
    }

    #[test]
    fn offset_angle_comes_from_seed_in_degrees() {
        // θ = 0, plus a 0.2 share of the -0.5 hashes
        assert!(close(DistortionMode::Offset.offset(0, 0.7, 10.0, 9.0, 0.0), (5.0, -1.0)));
        // 450 wraps to 90°
        let seed = 450.0;
        let a = rand(seed) - 0.5;
        let b = rand(seed * 2.133) - 0.5;
        let (dx, dy) = DistortionMode::Offset.offset(0, 0.0, 10.0, 1.0, seed);
        assert!((dx - 2.0 * a).abs() < 1e-9, "{dx}");
        assert!((dy - (6.0 + 2.0 * b)).abs() < 1e-9, "{dy}");
    }

    #[test]
    fn effective_frequency_curve() {
        assert_eq!(effective_frequency(0.0), 1.0);
        assert!((effective_frequency(20.0) - 20.0 / 6.0).abs() < 1e-12);
        assert!((effective_frequency(66.0) - (50.0 / 6.0 + 2.0)).abs() < 1e-12);
    }
}
