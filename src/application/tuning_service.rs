// Tuning service - Use cases for a loop's tuning record
use crate::application::loop_locks::LoopLocks;
use crate::application::recompute::{
    load_bump_test, load_loop, load_record, recompute_loop, recompute_tuning_record,
};
use crate::application::tuning_repository::TuningRepository;
use crate::domain::bump_test::BumpTestId;
use crate::domain::error::{TuningError, TuningResult};
use crate::domain::process_loop::LoopId;
use crate::domain::tuning::TuningMethod;
use crate::domain::tuning_record::TuningRecord;
use std::sync::Arc;

#[derive(Clone)]
pub struct TuningService {
    repository: Arc<dyn TuningRepository>,
    locks: Arc<LoopLocks>,
}

impl TuningService {
    pub fn new(repository: Arc<dyn TuningRepository>, locks: Arc<LoopLocks>) -> Self {
        Self { repository, locks }
    }

    pub async fn get_record(&self, loop_id: LoopId) -> TuningResult<TuningRecord> {
        let process_loop = load_loop(self.repository.as_ref(), loop_id).await?;
        load_record(self.repository.as_ref(), process_loop.tuning_record_id).await
    }

    pub async fn set_lambda(&self, loop_id: LoopId, lambda_value: f64) -> TuningResult<TuningRecord> {
        self.mutate(loop_id, |record| record.set_lambda(lambda_value))
            .await
            .inspect(|record| {
                if !record.lambda_in_range() {
                    tracing::warn!(
                        "Lambda {} for loop {} is outside the admissible range [{}, {}]",
                        record.lambda_value,
                        loop_id,
                        record.min_lambda,
                        record.max_lambda
                    );
                }
            })
    }

    pub async fn set_method(
        &self,
        loop_id: LoopId,
        method: TuningMethod,
    ) -> TuningResult<TuningRecord> {
        self.mutate(loop_id, |record| {
            record.method = method;
            Ok(())
        })
        .await
    }

    /// Assign a bump test to the loop's record. Tests of other loops are
    /// accepted and then ignored by the aggregation.
    pub async fn add_bump_test(
        &self,
        loop_id: LoopId,
        test_id: BumpTestId,
    ) -> TuningResult<TuningRecord> {
        load_bump_test(self.repository.as_ref(), test_id).await?;
        self.mutate(loop_id, |record| {
            record.bump_test_ids.insert(test_id);
            Ok(())
        })
        .await
    }

    pub async fn remove_bump_test(
        &self,
        loop_id: LoopId,
        test_id: BumpTestId,
    ) -> TuningResult<TuningRecord> {
        let exists = self.repository.get_bump_test(test_id).await?.is_some();
        self.mutate(loop_id, |record| {
            if !record.bump_test_ids.remove(&test_id) && !exists {
                return Err(TuningError::BumpTestNotFound(test_id));
            }
            Ok(())
        })
        .await
    }

    /// Recompute every bump test of the loop and the record.
    pub async fn recompute(&self, loop_id: LoopId) -> TuningResult<TuningRecord> {
        let _guard = self.locks.acquire(loop_id).await;
        recompute_loop(self.repository.as_ref(), loop_id).await
    }

    async fn mutate<F>(&self, loop_id: LoopId, change: F) -> TuningResult<TuningRecord>
    where
        F: FnOnce(&mut TuningRecord) -> TuningResult<()> + Send,
    {
        let _guard = self.locks.acquire(loop_id).await;
        let process_loop = load_loop(self.repository.as_ref(), loop_id).await?;
        let mut record = load_record(self.repository.as_ref(), process_loop.tuning_record_id).await?;

        change(&mut record)?;
        self.repository.save_record(record.clone()).await?;

        recompute_tuning_record(self.repository.as_ref(), record.id).await
    }
}
