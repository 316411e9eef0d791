// Explicit recompute operations: identification, dominance, tuning, aggregation
//
// Every function here is idempotent and persists what it touches. Callers
// hold the owning loop's lock from `LoopLocks` around the call.
use crate::application::tuning_repository::TuningRepository;
use crate::domain::bump_test::{BumpTest, BumpTestId};
use crate::domain::error::{TuningError, TuningResult};
use crate::domain::process_loop::{LoopId, ProcessLoop};
use crate::domain::trend::{ChartId, TrendChart};
use crate::domain::tuning_record::{TuningRecord, TuningRecordId};

pub async fn load_loop(repository: &dyn TuningRepository, id: LoopId) -> TuningResult<ProcessLoop> {
    repository
        .get_loop(id)
        .await?
        .ok_or(TuningError::LoopNotFound(id))
}

pub async fn load_chart(repository: &dyn TuningRepository, id: ChartId) -> TuningResult<TrendChart> {
    repository
        .get_chart(id)
        .await?
        .ok_or(TuningError::ChartNotFound(id))
}

pub async fn load_bump_test(
    repository: &dyn TuningRepository,
    id: BumpTestId,
) -> TuningResult<BumpTest> {
    repository
        .get_bump_test(id)
        .await?
        .ok_or(TuningError::BumpTestNotFound(id))
}

pub async fn load_record(
    repository: &dyn TuningRepository,
    id: TuningRecordId,
) -> TuningResult<TuningRecord> {
    repository
        .get_record(id)
        .await?
        .ok_or(TuningError::RecordNotFound(id))
}

/// Re-identify one bump test and re-derive its dominance and Lambda bounds.
pub async fn recompute_bump_test(
    repository: &dyn TuningRepository,
    id: BumpTestId,
) -> TuningResult<BumpTest> {
    let mut test = load_bump_test(repository, id).await?;
    let chart = load_chart(repository, test.chart_id).await?;
    let process_loop = load_loop(repository, chart.loop_id).await?;

    test.recompute(&process_loop, &chart.series);
    tracing::debug!(
        "Recomputed bump test {}: state={:?} identification={:?}",
        test.id,
        test.state,
        test.identification
    );

    repository.save_bump_test(test.clone()).await?;
    Ok(test)
}

/// Retune every contributing test with the record's Lambda and rebuild the
/// aggregate. References to tests of another loop, or to tests that no
/// longer exist, are skipped with a warning.
pub async fn recompute_tuning_record(
    repository: &dyn TuningRepository,
    id: TuningRecordId,
) -> TuningResult<TuningRecord> {
    let mut record = load_record(repository, id).await?;
    let process_loop = load_loop(repository, record.loop_id).await?;

    let mut tests = Vec::with_capacity(record.bump_test_ids.len());
    for test_id in &record.bump_test_ids {
        let Some(test) = repository.get_bump_test(*test_id).await? else {
            tracing::warn!(
                "Tuning record {} references missing bump test {}",
                record.id,
                test_id
            );
            continue;
        };

        let owner = repository.get_chart(test.chart_id).await?.map(|c| c.loop_id);
        if owner != Some(record.loop_id) {
            tracing::warn!(
                "Ignoring bump test {} (loop {:?}) referenced by tuning record {} of loop {}",
                test.id,
                owner,
                record.id,
                record.loop_id
            );
            continue;
        }

        tests.push(test);
    }

    record.aggregate(process_loop.process_type, &mut tests);
    tracing::debug!(
        "Aggregated {} bump tests into record {}: gain={} ti={} td={} lambda=[{}, {}]",
        tests.len(),
        record.id,
        record.gain,
        record.integral_time,
        record.derivative_time,
        record.min_lambda,
        record.max_lambda
    );

    for test in tests {
        repository.save_bump_test(test).await?;
    }
    repository.save_record(record.clone()).await?;

    Ok(record)
}

/// Recompute every bump test of a loop, then its tuning record.
pub async fn recompute_loop(
    repository: &dyn TuningRepository,
    id: LoopId,
) -> TuningResult<TuningRecord> {
    let process_loop = load_loop(repository, id).await?;

    for chart in repository.list_charts(id).await? {
        for mut test in repository.list_bump_tests(chart.id).await? {
            test.recompute(&process_loop, &chart.series);
            repository.save_bump_test(test).await?;
        }
    }

    recompute_tuning_record(repository, process_loop.tuning_record_id).await
}
