// Trend service - Use cases for trend charts and bump tests
use crate::application::loop_locks::LoopLocks;
use crate::application::recompute::{
    load_bump_test, load_chart, load_loop, load_record, recompute_bump_test,
    recompute_tuning_record,
};
use crate::application::tuning_repository::TuningRepository;
use crate::domain::bump_test::{BumpTest, BumpTestId, Markers};
use crate::domain::error::TuningResult;
use crate::domain::process_loop::{LoopId, ProcessLoop};
use crate::domain::trend::{ChartId, Sample, TimeSeries, TrendChart};
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Clone)]
pub struct TrendService {
    repository: Arc<dyn TuningRepository>,
    locks: Arc<LoopLocks>,
}

impl TrendService {
    pub fn new(repository: Arc<dyn TuningRepository>, locks: Arc<LoopLocks>) -> Self {
        Self { repository, locks }
    }

    pub async fn list_charts(&self, loop_id: LoopId) -> TuningResult<Vec<TrendChart>> {
        load_loop(self.repository.as_ref(), loop_id).await?;
        Ok(self.repository.list_charts(loop_id).await?)
    }

    /// Store a cleaned recording for a loop.
    pub async fn create_chart(
        &self,
        loop_id: LoopId,
        description: Option<String>,
        samples: Vec<Sample>,
    ) -> TuningResult<TrendChart> {
        let series = TimeSeries::new(samples)?;
        load_loop(self.repository.as_ref(), loop_id).await?;

        let chart = TrendChart::new(self.repository.next_id().await?, loop_id, description, series);
        self.repository.save_chart(chart.clone()).await?;

        tracing::info!(
            "Created trend chart {} for loop {} with {} samples",
            chart.id,
            loop_id,
            chart.series.samples().len()
        );
        Ok(chart)
    }

    /// Delete a chart and its bump tests, dropping them from the loop's
    /// tuning record.
    pub async fn delete_chart(&self, id: ChartId) -> TuningResult<()> {
        let chart = load_chart(self.repository.as_ref(), id).await?;
        let _guard = self.locks.acquire(chart.loop_id).await;
        let process_loop = load_loop(self.repository.as_ref(), chart.loop_id).await?;

        let tests = self.repository.list_bump_tests(id).await?;
        let test_ids: Vec<BumpTestId> = tests.iter().map(|t| t.id).collect();
        for test_id in &test_ids {
            self.repository.delete_bump_test(*test_id).await?;
        }
        self.repository.delete_chart(id).await?;

        self.forget_tests(&process_loop, &test_ids).await?;
        tracing::info!("Deleted trend chart {} with {} bump tests", id, test_ids.len());
        Ok(())
    }

    pub async fn list_bump_tests(&self, chart_id: ChartId) -> TuningResult<Vec<BumpTest>> {
        load_chart(self.repository.as_ref(), chart_id).await?;
        Ok(self.repository.list_bump_tests(chart_id).await?)
    }

    pub async fn get_bump_test(&self, id: BumpTestId) -> TuningResult<BumpTest> {
        load_bump_test(self.repository.as_ref(), id).await
    }

    /// Mark a bump test window on a chart. Markers are added afterwards.
    pub async fn create_bump_test(
        &self,
        chart_id: ChartId,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> TuningResult<BumpTest> {
        let chart = load_chart(self.repository.as_ref(), chart_id).await?;
        let _guard = self.locks.acquire(chart.loop_id).await;
        let process_loop = load_loop(self.repository.as_ref(), chart.loop_id).await?;

        let mut test = BumpTest::new(
            self.repository.next_id().await?,
            chart_id,
            start_time,
            end_time,
            process_loop.process_type,
        )?;
        test.recompute(&process_loop, &chart.series);
        self.repository.save_bump_test(test.clone()).await?;

        tracing::info!(
            "Created bump test {} on chart {}: {} -> {}",
            test.id,
            chart_id,
            start_time,
            end_time
        );
        Ok(test)
    }

    /// Set any subset of T1..T4 and TCV, then recompute the test and, when
    /// it contributes to its loop's tuning record, the record.
    pub async fn set_markers(&self, id: BumpTestId, markers: Markers) -> TuningResult<BumpTest> {
        let test = load_bump_test(self.repository.as_ref(), id).await?;
        let chart = load_chart(self.repository.as_ref(), test.chart_id).await?;
        let _guard = self.locks.acquire(chart.loop_id).await;

        // Reload under the lock so a concurrent cascade is not overwritten.
        let mut test = load_bump_test(self.repository.as_ref(), id).await?;
        test.set_markers(markers);
        self.repository.save_bump_test(test).await?;

        let test = recompute_bump_test(self.repository.as_ref(), id).await?;

        let process_loop = load_loop(self.repository.as_ref(), chart.loop_id).await?;
        let record = load_record(self.repository.as_ref(), process_loop.tuning_record_id).await?;
        if record.bump_test_ids.contains(&id) {
            recompute_tuning_record(self.repository.as_ref(), record.id).await?;
            return load_bump_test(self.repository.as_ref(), id).await;
        }

        Ok(test)
    }

    pub async fn delete_bump_test(&self, id: BumpTestId) -> TuningResult<()> {
        let test = load_bump_test(self.repository.as_ref(), id).await?;
        let chart = load_chart(self.repository.as_ref(), test.chart_id).await?;
        let _guard = self.locks.acquire(chart.loop_id).await;
        let process_loop = load_loop(self.repository.as_ref(), chart.loop_id).await?;

        self.repository.delete_bump_test(id).await?;
        self.forget_tests(&process_loop, &[id]).await?;

        tracing::info!("Deleted bump test {}", id);
        Ok(())
    }

    async fn forget_tests(
        &self,
        process_loop: &ProcessLoop,
        test_ids: &[BumpTestId],
    ) -> TuningResult<()> {
        let mut record = load_record(self.repository.as_ref(), process_loop.tuning_record_id).await?;
        let before = record.bump_test_ids.len();
        record.bump_test_ids.retain(|id| !test_ids.contains(id));

        if record.bump_test_ids.len() != before {
            self.repository.save_record(record.clone()).await?;
            recompute_tuning_record(self.repository.as_ref(), record.id).await?;
        }
        Ok(())
    }
}
