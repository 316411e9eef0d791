// Tuning record domain model and aggregation across bump tests
use super::bump_test::{BumpTest, BumpTestId};
use super::error::{TuningError, TuningResult};
use super::process_loop::{LoopId, ProcessType};
use super::tuning::{
    DERIVATIVE_DECIMALS, GAIN_DECIMALS, INTEGRAL_DECIMALS, PidSettings, TuningMethod, round_to,
};
use serde::Serialize;
use std::collections::BTreeSet;

pub type TuningRecordId = u64;

pub const DEFAULT_GAIN: f64 = 0.0;
pub const DEFAULT_INTEGRAL_TIME: f64 = 1.0;
pub const DEFAULT_DERIVATIVE_TIME: f64 = 0.0;
pub const DEFAULT_MIN_LAMBDA: f64 = 1.0;
pub const DEFAULT_MAX_LAMBDA: f64 = 100.0;

const LAMBDA_DECIMALS: i32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct TuningRecord {
    pub id: TuningRecordId,
    pub loop_id: LoopId,
    pub bump_test_ids: BTreeSet<BumpTestId>,
    pub method: TuningMethod,
    pub lambda_value: f64,
    pub min_lambda: f64,
    pub max_lambda: f64,
    pub gain: f64,
    pub integral_time: f64,
    pub derivative_time: f64,
    pub acceptable_filter_time: f64,
}

impl TuningRecord {
    pub fn new(
        id: TuningRecordId,
        loop_id: LoopId,
        method: TuningMethod,
        lambda_value: f64,
        acceptable_filter_time: f64,
    ) -> TuningResult<Self> {
        validate_lambda(lambda_value)?;
        Ok(Self {
            id,
            loop_id,
            bump_test_ids: BTreeSet::new(),
            method,
            lambda_value,
            min_lambda: DEFAULT_MIN_LAMBDA,
            max_lambda: DEFAULT_MAX_LAMBDA,
            gain: DEFAULT_GAIN,
            integral_time: DEFAULT_INTEGRAL_TIME,
            derivative_time: DEFAULT_DERIVATIVE_TIME,
            acceptable_filter_time,
        })
    }

    pub fn set_lambda(&mut self, lambda_value: f64) -> TuningResult<()> {
        validate_lambda(lambda_value)?;
        self.lambda_value = lambda_value;
        Ok(())
    }

    pub fn lambda_in_range(&self) -> bool {
        self.lambda_value >= self.min_lambda && self.lambda_value <= self.max_lambda
    }

    pub fn settings(&self) -> PidSettings {
        PidSettings {
            gain: self.gain,
            integral_time: self.integral_time,
            derivative_time: self.derivative_time,
        }
    }

    fn reset(&mut self) {
        self.gain = DEFAULT_GAIN;
        self.integral_time = DEFAULT_INTEGRAL_TIME;
        self.derivative_time = DEFAULT_DERIVATIVE_TIME;
        self.min_lambda = DEFAULT_MIN_LAMBDA;
        self.max_lambda = DEFAULT_MAX_LAMBDA;
    }

    /// Retunes every test with the current Lambda and replaces the
    /// aggregate with the mean of the tests the selected method could tune.
    /// `tests` must already be restricted to this record's loop.
    pub fn aggregate(&mut self, process_type: ProcessType, tests: &mut [BumpTest]) {
        for test in tests.iter_mut() {
            test.retune(process_type, self.lambda_value);
        }

        let tuned: Vec<(&BumpTest, PidSettings)> = tests
            .iter()
            .filter_map(|test| test.tuning(self.method).map(|settings| (test, settings)))
            .collect();

        if tuned.is_empty() {
            self.reset();
            return;
        }

        let count = tuned.len() as f64;
        let mean = |term: fn(&PidSettings) -> f64| {
            tuned.iter().map(|(_, settings)| term(settings)).sum::<f64>() / count
        };
        self.gain = round_to(mean(|s| s.gain), GAIN_DECIMALS);
        self.integral_time = round_to(mean(|s| s.integral_time), INTEGRAL_DECIMALS);
        self.derivative_time = round_to(mean(|s| s.derivative_time), DERIVATIVE_DECIMALS);

        self.min_lambda = tuned
            .iter()
            .filter_map(|(test, _)| test.lambda_bounds.min)
            .reduce(f64::max)
            .map(|min| round_to(min, LAMBDA_DECIMALS))
            .unwrap_or(DEFAULT_MIN_LAMBDA);
        self.max_lambda = tuned
            .iter()
            .filter_map(|(test, _)| test.lambda_bounds.max)
            .reduce(f64::min)
            .map(|max| round_to(max, LAMBDA_DECIMALS))
            .unwrap_or(DEFAULT_MAX_LAMBDA);

        if self.min_lambda > self.max_lambda {
            tracing::warn!(
                "Tuning record {} has no common lambda range: min {} > max {}",
                self.id,
                self.min_lambda,
                self.max_lambda
            );
        }
    }
}

fn validate_lambda(lambda_value: f64) -> TuningResult<()> {
    if !lambda_value.is_finite() || lambda_value <= 0.0 {
        return Err(TuningError::InvalidLambda(lambda_value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bump_test::{Identification, IdentificationState};
    use crate::domain::dominance::LambdaBounds;
    use crate::domain::trend::tests::at;

    fn identified_test(id: BumpTestId, tau: f64, bounds: LambdaBounds) -> BumpTest {
        let mut test = BumpTest::new(id, 1, at(0), at(100), ProcessType::FirstOrder).unwrap();
        test.state = IdentificationState::Identified;
        test.identification = Identification {
            dead_time: Some(0.0),
            time_constant: Some(tau),
            process_gain: Some(1.0),
            delta_pv: Some(10.0),
            delta_cv: Some(10.0),
        };
        test.lambda_bounds = bounds;
        test
    }

    fn record() -> TuningRecord {
        TuningRecord::new(1, 1, TuningMethod::Lambda, 10.0, 0.5).unwrap()
    }

    #[test]
    fn test_empty_set_resets_to_defaults() {
        let mut record = record();
        record.gain = 4.2;
        record.min_lambda = 30.0;

        record.aggregate(ProcessType::FirstOrder, &mut []);

        assert_eq!(record.gain, 0.0);
        assert_eq!(record.integral_time, 1.0);
        assert_eq!(record.derivative_time, 0.0);
        assert_eq!(record.min_lambda, 1.0);
        assert_eq!(record.max_lambda, 100.0);
    }

    #[test]
    fn test_mean_of_per_test_gains() {
        let mut record = record();
        let mut tests = vec![
            identified_test(
                1,
                5.0,
                LambdaBounds {
                    min: Some(4.0),
                    max: Some(20.0),
                },
            ),
            identified_test(
                2,
                7.0,
                LambdaBounds {
                    min: Some(5.6),
                    max: Some(28.0),
                },
            ),
        ];

        record.aggregate(ProcessType::FirstOrder, &mut tests);

        assert_eq!(tests[0].lambda_tuning.unwrap().gain, 0.5);
        assert_eq!(tests[1].lambda_tuning.unwrap().gain, 0.7);
        assert_eq!(record.gain, 0.6);
        assert_eq!(record.integral_time, 6.0);
        assert_eq!(record.derivative_time, 0.0);
        assert_eq!(record.min_lambda, 5.6);
        assert_eq!(record.max_lambda, 20.0);
    }

    #[test]
    fn test_untunable_tests_are_left_out() {
        let mut record = record();
        let mut incomplete = identified_test(2, 7.0, LambdaBounds::default());
        incomplete.state = IdentificationState::Incomplete;
        let mut tests = vec![identified_test(1, 5.0, LambdaBounds::default()), incomplete];

        record.aggregate(ProcessType::FirstOrder, &mut tests);

        assert_eq!(record.gain, 0.5);
        assert_eq!(tests[1].lambda_tuning, None);
        assert_eq!(record.min_lambda, DEFAULT_MIN_LAMBDA);
        assert_eq!(record.max_lambda, DEFAULT_MAX_LAMBDA);
    }

    #[test]
    fn test_method_selects_outputs() {
        let mut record = record();
        record.method = TuningMethod::CohenCoon;
        // Cohen-Coon is undefined without dead time, so nothing aggregates.
        let mut tests = vec![identified_test(1, 5.0, LambdaBounds::default())];

        record.aggregate(ProcessType::FirstOrder, &mut tests);

        assert!(tests[0].lambda_tuning.is_some());
        assert_eq!(record.gain, DEFAULT_GAIN);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let mut record = record();
        let mut tests = vec![identified_test(
            1,
            5.0,
            LambdaBounds {
                min: Some(4.0),
                max: Some(20.0),
            },
        )];

        record.aggregate(ProcessType::FirstOrder, &mut tests);
        let first = (record.settings(), record.min_lambda, record.max_lambda);
        record.aggregate(ProcessType::FirstOrder, &mut tests);
        assert_eq!((record.settings(), record.min_lambda, record.max_lambda), first);
    }

    #[test]
    fn test_lambda_must_be_positive() {
        let mut record = record();
        assert!(matches!(record.set_lambda(0.0), Err(TuningError::InvalidLambda(_))));
        assert!(record.set_lambda(f64::INFINITY).is_err());
        assert!(record.set_lambda(15.0).is_ok());
        assert_eq!(record.lambda_value, 15.0);
    }
}
