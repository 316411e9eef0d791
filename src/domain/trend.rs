// Trend chart and cleaned time-series domain models
use super::error::{TuningError, TuningResult};
use super::process_loop::LoopId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ChartId = u64;

/// Fraction of the PV change reached after one time constant.
pub const FIRST_ORDER_RESPONSE_FRACTION: f64 = 0.632;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: DateTime<Utc>,
    pub pv: f64,
    pub cv: f64,
}

impl Sample {
    pub fn new(time: DateTime<Utc>, pv: f64, cv: f64) -> Self {
        Self { time, pv, cv }
    }
}

/// Chronologically ordered (PV, CV) samples in UTC, as handed over by the
/// preprocessor. Timestamps are strictly increasing.
#[derive(Debug, Clone, Serialize)]
pub struct TimeSeries {
    samples: Vec<Sample>,
}

impl TimeSeries {
    pub fn new(samples: Vec<Sample>) -> TuningResult<Self> {
        if samples.is_empty() {
            return Err(TuningError::MalformedSeries(
                "series contains no samples".to_string(),
            ));
        }

        for (index, sample) in samples.iter().enumerate() {
            if !sample.pv.is_finite() || !sample.cv.is_finite() {
                return Err(TuningError::MalformedSeries(format!(
                    "non-finite value at {}",
                    sample.time
                )));
            }
            if index > 0 && samples[index - 1].time >= sample.time {
                return Err(TuningError::MalformedSeries(format!(
                    "timestamp {} is duplicated or out of order",
                    sample.time
                )));
            }
        }

        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Samples inside `[start, end]`. Falls back to the whole series when
    /// the window holds no samples.
    pub fn window(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Window<'_> {
        let from = self.samples.partition_point(|s| s.time < start);
        let to = self.samples.partition_point(|s| s.time <= end);

        if from < to {
            Window {
                samples: &self.samples[from..to],
            }
        } else {
            tracing::debug!(
                "No samples between {} and {}, using the full series",
                start,
                end
            );
            Window {
                samples: &self.samples,
            }
        }
    }
}

/// A non-empty slice of a [`TimeSeries`].
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    samples: &'a [Sample],
}

impl<'a> Window<'a> {
    pub fn first(&self) -> &'a Sample {
        &self.samples[0]
    }

    pub fn last(&self) -> &'a Sample {
        &self.samples[self.samples.len() - 1]
    }

    pub fn delta_pv(&self) -> f64 {
        self.last().pv - self.first().pv
    }

    pub fn delta_cv(&self) -> f64 {
        self.last().cv - self.first().cv
    }

    /// Earliest time at which CV holds the value it ends the window with.
    /// That is the last sample itself when no earlier one matches.
    pub fn final_cv_time(&self) -> DateTime<Utc> {
        let last = self.last();
        self.samples[..self.samples.len() - 1]
            .iter()
            .find(|s| s.cv == last.cv)
            .map_or(last.time, |s| s.time)
    }

    /// Earliest time whose PV is closest to `start + fraction * delta_pv`.
    pub fn pv_fraction_time(&self, fraction: f64) -> DateTime<Utc> {
        let target = self.first().pv + fraction * self.delta_pv();
        let mut best = self.first();
        for sample in self.samples {
            if (sample.pv - target).abs() < (best.pv - target).abs() {
                best = sample;
            }
        }
        best.time
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendChart {
    pub id: ChartId,
    pub loop_id: LoopId,
    pub uploaded_at: DateTime<Utc>,
    pub description: Option<String>,
    pub series: TimeSeries,
}

impl TrendChart {
    pub fn new(
        id: ChartId,
        loop_id: LoopId,
        description: Option<String>,
        series: TimeSeries,
    ) -> Self {
        Self {
            id,
            loop_id,
            uploaded_at: Utc::now(),
            description,
            series,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    pub(crate) fn at(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    fn series(points: &[(i64, f64, f64)]) -> TimeSeries {
        TimeSeries::new(
            points
                .iter()
                .map(|&(t, pv, cv)| Sample::new(at(t), pv, cv))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_unordered_and_empty_series() {
        assert!(TimeSeries::new(Vec::new()).is_err());

        let unordered = vec![Sample::new(at(5), 1.0, 1.0), Sample::new(at(1), 1.0, 1.0)];
        assert!(matches!(
            TimeSeries::new(unordered),
            Err(TuningError::MalformedSeries(_))
        ));

        let duplicated = vec![Sample::new(at(1), 1.0, 1.0), Sample::new(at(1), 2.0, 1.0)];
        assert!(TimeSeries::new(duplicated).is_err());
    }

    #[test]
    fn test_window_is_inclusive() {
        let s = series(&[(0, 1.0, 0.0), (10, 2.0, 0.0), (20, 3.0, 0.0), (30, 4.0, 0.0)]);
        let window = s.window(at(10), at(20));
        assert_eq!(window.first().time, at(10));
        assert_eq!(window.last().time, at(20));
        assert_eq!(window.delta_pv(), 1.0);
    }

    #[test]
    fn test_empty_window_falls_back_to_full_series() {
        let s = series(&[(0, 1.0, 5.0), (10, 2.0, 7.0)]);
        let window = s.window(at(100), at(200));
        assert_eq!(window.first().time, at(0));
        assert_eq!(window.last().time, at(10));
        assert_eq!(window.delta_cv(), 2.0);
    }

    #[test]
    fn test_final_cv_time_finds_first_occurrence_of_final_value() {
        let s = series(&[
            (0, 20.0, 10.0),
            (5, 20.0, 30.0),
            (10, 21.0, 30.0),
            (15, 25.0, 30.0),
        ]);
        assert_eq!(s.window(at(0), at(15)).final_cv_time(), at(5));
    }

    #[test]
    fn test_final_cv_time_is_last_sample_when_cv_still_moving() {
        let s = series(&[(0, 20.0, 10.0), (5, 20.0, 20.0), (10, 21.0, 30.0)]);
        assert_eq!(s.window(at(0), at(10)).final_cv_time(), at(10));
    }

    #[test]
    fn test_pv_fraction_time_picks_closest_sample() {
        let s = series(&[
            (0, 0.0, 0.0),
            (10, 30.0, 1.0),
            (20, 62.0, 1.0),
            (30, 90.0, 1.0),
            (40, 100.0, 1.0),
        ]);
        let window = s.window(at(0), at(40));
        assert_eq!(window.pv_fraction_time(FIRST_ORDER_RESPONSE_FRACTION), at(20));
    }
}
