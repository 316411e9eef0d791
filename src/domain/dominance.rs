// Dead-time / lag-time dominance classification and Lambda bounds
use serde::{Deserialize, Serialize};

/// tau / Td at or below this is dead-time dominant.
pub const DEAD_TIME_DOMINANT_RATIO: f64 = 2.0;
/// tau / Td at or above this is lag-time dominant.
pub const LAG_TIME_DOMINANT_RATIO: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dominance {
    DeadTime,
    LagTime,
    General,
}

/// Admissible Lambda range. Unset until a classification produced it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LambdaBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub dominance: Dominance,
    pub min_lambda: f64,
    /// `None` means the previous upper bound is kept.
    pub max_lambda: Option<f64>,
}

impl Classification {
    pub fn apply_to(&self, bounds: &mut LambdaBounds) {
        bounds.min = Some(self.min_lambda);
        if let Some(max) = self.max_lambda {
            bounds.max = Some(max);
        }
    }
}

/// Classifies a test from its dead time and time constant. Returns `None`
/// when either is undefined or tau is not positive; callers then keep the
/// previous classification.
pub fn classify(dead_time: Option<f64>, time_constant: Option<f64>) -> Option<Classification> {
    let tau = time_constant.filter(|tau| *tau > 0.0)?;
    let td = dead_time?;

    if td == 0.0 {
        return Some(Classification {
            dominance: Dominance::General,
            min_lambda: 0.8 * tau,
            max_lambda: Some(4.0 * tau),
        });
    }

    let ratio = tau / td;
    let classification = if ratio <= DEAD_TIME_DOMINANT_RATIO {
        Classification {
            dominance: Dominance::DeadTime,
            min_lambda: 2.0 * td,
            max_lambda: Some(4.0 * tau),
        }
    } else if ratio >= LAG_TIME_DOMINANT_RATIO {
        Classification {
            dominance: Dominance::LagTime,
            min_lambda: 0.8 * tau,
            max_lambda: Some(4.0 * tau),
        }
    } else {
        // Only the lower bound moves in the general band; the upper bound
        // stays at whatever an earlier classification left.
        Classification {
            dominance: Dominance::General,
            min_lambda: (2.0 * td).max(0.8 * tau),
            max_lambda: None,
        }
    };

    Some(classification)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_dead_time_is_general() {
        let c = classify(Some(0.0), Some(50.0)).unwrap();
        assert_eq!(c.dominance, Dominance::General);
        assert_eq!(c.min_lambda, 40.0);
        assert_eq!(c.max_lambda, Some(200.0));
    }

    #[test]
    fn test_dead_time_dominant() {
        for (td, tau) in [(10.0, 20.0), (10.0, 5.0), (3.0, 1.5)] {
            let c = classify(Some(td), Some(tau)).unwrap();
            assert_eq!(c.dominance, Dominance::DeadTime);
            assert_eq!(c.min_lambda, 2.0 * td);
            assert_eq!(c.max_lambda, Some(4.0 * tau));
        }
    }

    #[test]
    fn test_lag_time_dominant() {
        for (td, tau) in [(5.0, 50.0), (2.0, 8.0)] {
            let c = classify(Some(td), Some(tau)).unwrap();
            assert_eq!(c.dominance, Dominance::LagTime);
            assert_eq!(c.min_lambda, 0.8 * tau);
            assert_eq!(c.max_lambda, Some(4.0 * tau));
        }
    }

    #[test]
    fn test_general_band_keeps_previous_upper_bound() {
        let c = classify(Some(10.0), Some(30.0)).unwrap();
        assert_eq!(c.dominance, Dominance::General);
        assert_eq!(c.min_lambda, 24.0);
        assert_eq!(c.max_lambda, None);

        let mut bounds = LambdaBounds {
            min: Some(1.0),
            max: Some(75.0),
        };
        c.apply_to(&mut bounds);
        assert_eq!(bounds.min, Some(24.0));
        assert_eq!(bounds.max, Some(75.0));
    }

    #[test]
    fn test_skips_undefined_inputs() {
        assert!(classify(Some(5.0), None).is_none());
        assert!(classify(Some(5.0), Some(0.0)).is_none());
        assert!(classify(Some(5.0), Some(-3.0)).is_none());
        assert!(classify(None, Some(10.0)).is_none());
    }
}
