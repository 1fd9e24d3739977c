use serde::{Deserialize, Serialize};
use std::fmt;

/// Maps a raw feature value to a sub-score in `[0, 1]`.
///
/// A closed set of shapes selected by the `shape` tag in configuration:
///
/// ```yaml
/// tortuosity: { shape: linear, zero_at: 1.0, one_at: 2.5 }
/// duration_hours: { shape: trapezoid, low: 0.5, plateau_start: 2, plateau_end: 6, high: 10 }
/// season_match: { shape: step, threshold: 0.5 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Membership {
    /// 0 at `zero_at`, 1 at `one_at`, linear in between and clamped outside.
    /// Descending when `zero_at > one_at`.
    Linear { zero_at: f64, one_at: f64 },
    /// 0 at or outside `low`/`high`, 1 at `peak`.
    Triangular { low: f64, peak: f64, high: f64 },
    /// 1 across the plateau, ramps down to 0 at `low` and `high`.
    Trapezoid {
        low: f64,
        plateau_start: f64,
        plateau_end: f64,
        high: f64,
    },
    /// `above` when value >= `threshold`, `below` otherwise.
    Step {
        threshold: f64,
        #[serde(default)]
        below: f64,
        #[serde(default = "default_step_above")]
        above: f64,
    },
}

fn default_step_above() -> f64 {
    1.0
}

impl Membership {
    pub fn step(threshold: f64) -> Self {
        Membership::Step {
            threshold,
            below: 0.0,
            above: 1.0,
        }
    }

    /// Check the shape parameters. Returns a description of the first problem.
    pub fn validate(&self) -> Result<(), String> {
        let params: Vec<f64> = match *self {
            Membership::Linear { zero_at, one_at } => vec![zero_at, one_at],
            Membership::Triangular { low, peak, high } => vec![low, peak, high],
            Membership::Trapezoid {
                low,
                plateau_start,
                plateau_end,
                high,
            } => vec![low, plateau_start, plateau_end, high],
            Membership::Step {
                threshold,
                below,
                above,
            } => vec![threshold, below, above],
        };
        if params.iter().any(|p| !p.is_finite()) {
            return Err("parameters must be finite".to_string());
        }

        match *self {
            Membership::Linear { zero_at, one_at } if zero_at == one_at => {
                Err("zero_at and one_at must differ".to_string())
            }
            Membership::Triangular { low, peak, high } if !(low <= peak && peak <= high && low < high) => {
                Err("expected low <= peak <= high with low < high".to_string())
            }
            Membership::Trapezoid {
                low,
                plateau_start,
                plateau_end,
                high,
            } if !(low <= plateau_start && plateau_start <= plateau_end && plateau_end <= high) => Err(
                "expected low <= plateau_start <= plateau_end <= high".to_string(),
            ),
            Membership::Step { below, above, .. }
                if !(0.0..=1.0).contains(&below) || !(0.0..=1.0).contains(&above) =>
            {
                Err("below and above must lie within [0, 1]".to_string())
            }
            _ => Ok(()),
        }
    }

    /// Sub-score for `value`, always within `[0, 1]`. Non-finite input scores 0.
    pub fn apply(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return 0.0;
        }
        let score = match *self {
            Membership::Linear { zero_at, one_at } => (value - zero_at) / (one_at - zero_at),
            Membership::Triangular { low, peak, high } => {
                if value == peak {
                    1.0
                } else if value <= low || value >= high {
                    0.0
                } else if value < peak {
                    (value - low) / (peak - low)
                } else {
                    (high - value) / (high - peak)
                }
            }
            Membership::Trapezoid {
                low,
                plateau_start,
                plateau_end,
                high,
            } => {
                if value >= plateau_start && value <= plateau_end {
                    1.0
                } else if value <= low || value >= high {
                    0.0
                } else if value < plateau_start {
                    (value - low) / (plateau_start - low)
                } else {
                    (high - value) / (high - plateau_end)
                }
            }
            Membership::Step {
                threshold,
                below,
                above,
            } => {
                if value >= threshold {
                    above
                } else {
                    below
                }
            }
        };
        if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl fmt::Display for Membership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Membership::Linear { zero_at, one_at } => write!(f, "linear {} -> {}", zero_at, one_at),
            Membership::Triangular { low, peak, high } => {
                write!(f, "triangular {} / {} / {}", low, peak, high)
            }
            Membership::Trapezoid {
                low,
                plateau_start,
                plateau_end,
                high,
            } => write!(
                f,
                "trapezoid {} / {}-{} / {}",
                low, plateau_start, plateau_end, high
            ),
            Membership::Step {
                threshold,
                below,
                above,
            } => write!(f, "step at {} ({} / {})", threshold, below, above),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_ascending() {
        let m = Membership::Linear { zero_at: 1.0, one_at: 3.0 };
        assert_eq!(m.apply(0.0), 0.0);
        assert_eq!(m.apply(1.0), 0.0);
        assert_eq!(m.apply(2.0), 0.5);
        assert_eq!(m.apply(3.0), 1.0);
        assert_eq!(m.apply(10.0), 1.0);
    }

    #[test]
    fn test_linear_descending() {
        let m = Membership::Linear { zero_at: 5.0, one_at: 2.0 };
        assert_eq!(m.apply(1.0), 1.0);
        assert_eq!(m.apply(3.5), 0.5);
        assert_eq!(m.apply(6.0), 0.0);
    }

    #[test]
    fn test_triangular() {
        let m = Membership::Triangular { low: 0.0, peak: 2.0, high: 6.0 };
        assert_eq!(m.apply(-1.0), 0.0);
        assert_eq!(m.apply(1.0), 0.5);
        assert_eq!(m.apply(2.0), 1.0);
        assert_eq!(m.apply(4.0), 0.5);
        assert_eq!(m.apply(6.0), 0.0);
    }

    #[test]
    fn test_triangular_with_peak_on_edge() {
        let m = Membership::Triangular { low: 0.0, peak: 0.0, high: 4.0 };
        assert_eq!(m.apply(0.0), 1.0);
        assert_eq!(m.apply(2.0), 0.5);
    }

    #[test]
    fn test_trapezoid() {
        let m = Membership::Trapezoid {
            low: 0.5,
            plateau_start: 2.0,
            plateau_end: 6.0,
            high: 10.0,
        };
        assert_eq!(m.apply(0.5), 0.0);
        assert_eq!(m.apply(1.25), 0.5);
        assert_eq!(m.apply(2.0), 1.0);
        assert_eq!(m.apply(6.0), 1.0);
        assert_eq!(m.apply(8.0), 0.5);
        assert_eq!(m.apply(12.0), 0.0);
    }

    #[test]
    fn test_step_threshold_inclusive() {
        let m = Membership::step(0.5);
        assert_eq!(m.apply(0.0), 0.0);
        assert_eq!(m.apply(0.5), 1.0);
        assert_eq!(m.apply(1.0), 1.0);

        let inverted = Membership::Step { threshold: 0.5, below: 1.0, above: 0.2 };
        assert_eq!(inverted.apply(0.0), 1.0);
        assert_eq!(inverted.apply(0.7), 0.2);
    }

    #[test]
    fn test_non_finite_input_scores_zero() {
        let m = Membership::Linear { zero_at: 5.0, one_at: 2.0 };
        assert_eq!(m.apply(f64::NAN), 0.0);
        assert_eq!(m.apply(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        assert!(Membership::Linear { zero_at: 1.0, one_at: 1.0 }.validate().is_err());
        assert!(Membership::Triangular { low: 3.0, peak: 2.0, high: 4.0 }.validate().is_err());
        assert!(Membership::Trapezoid {
            low: 0.0,
            plateau_start: 5.0,
            plateau_end: 4.0,
            high: 6.0
        }
        .validate()
        .is_err());
        assert!(Membership::Step { threshold: 0.5, below: 0.0, above: 2.0 }.validate().is_err());
        assert!(Membership::Linear { zero_at: f64::NAN, one_at: 1.0 }.validate().is_err());
        assert!(Membership::step(0.5).validate().is_ok());
    }

    #[test]
    fn test_membership_yaml_parse() {
        let yaml = r#"
shape: trapezoid
low: 0.5
plateau_start: 2
plateau_end: 6
high: 10
"#;
        let m: Membership = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(
            m,
            Membership::Trapezoid {
                low: 0.5,
                plateau_start: 2.0,
                plateau_end: 6.0,
                high: 10.0
            }
        );
    }

    #[test]
    fn test_step_yaml_defaults() {
        let m: Membership = serde_saphyr::from_str("shape: step\nthreshold: 0.5\n").unwrap();
        assert_eq!(m, Membership::step(0.5));
    }
}
