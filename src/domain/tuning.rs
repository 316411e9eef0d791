// Lambda and Cohen-Coon tuning formulas
use super::bump_test::Identification;
use super::process_loop::ProcessType;
use serde::{Deserialize, Serialize};

pub const GAIN_DECIMALS: i32 = 3;
pub const INTEGRAL_DECIMALS: i32 = 1;
pub const DERIVATIVE_DECIMALS: i32 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TuningMethod {
    #[default]
    Lambda,
    CohenCoon,
}

/// Controller gain, integral (reset) time and derivative (rate) time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidSettings {
    pub gain: f64,
    pub integral_time: f64,
    pub derivative_time: f64,
}

impl PidSettings {
    /// Builds settings rounded to the reporting precision, or `None` if any
    /// term is not finite.
    pub fn rounded(gain: f64, integral_time: f64, derivative_time: f64) -> Option<Self> {
        if !(gain.is_finite() && integral_time.is_finite() && derivative_time.is_finite()) {
            return None;
        }
        Some(Self {
            gain: round_to(gain, GAIN_DECIMALS),
            integral_time: round_to(integral_time, INTEGRAL_DECIMALS),
            derivative_time: round_to(derivative_time, DERIVATIVE_DECIMALS),
        })
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Per-test controller settings for one method. `None` when the
/// identification does not support the method's formulas.
pub fn tune(
    method: TuningMethod,
    process_type: ProcessType,
    identification: &Identification,
    lambda: f64,
) -> Option<PidSettings> {
    let td = identification.dead_time?;
    let kc = identification.process_gain.filter(|kc| *kc != 0.0)?;

    match (method, process_type) {
        (TuningMethod::Lambda, ProcessType::FirstOrder) => {
            let tau = identification.time_constant?;
            if lambda + td <= 0.0 {
                return None;
            }
            let gain = tau / (kc * (lambda + td));
            let derivative = (td * tau) / (td + lambda);
            PidSettings::rounded(gain, tau, derivative)
        }
        (TuningMethod::Lambda, ProcessType::Integrating | ProcessType::IntegratingWithLag) => {
            if lambda + td <= 0.0 {
                return None;
            }
            let integral = 2.0 * lambda + td;
            let gain = integral / (kc.abs() * (lambda + td).powi(2));
            PidSettings::rounded(gain, integral, 0.0)
        }
        (TuningMethod::CohenCoon, ProcessType::FirstOrder) => {
            let tau = identification.time_constant?;
            if td <= 0.0 {
                return None;
            }
            let r = td / tau;
            let gain = (1.0 / kc) * (1.0 / r) * (4.0 / 3.0 + r / 4.0);
            let integral = td * (32.0 + 6.0 * r) / (13.0 + 8.0 * r);
            let derivative = td * 4.0 / (11.0 + 2.0 * r);
            PidSettings::rounded(gain, integral, derivative)
        }
        // Cohen-Coon assumes a self-regulating first-order-plus-dead-time model.
        (TuningMethod::CohenCoon, ProcessType::Integrating | ProcessType::IntegratingWithLag) => {
            None
        }
    }
}
