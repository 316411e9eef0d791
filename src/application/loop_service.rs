// Loop service - Use cases for process loops and their cascades
use crate::application::loop_locks::LoopLocks;
use crate::application::recompute::{load_loop, load_record, recompute_loop};
use crate::application::tuning_repository::TuningRepository;
use crate::domain::error::TuningResult;
use crate::domain::process_loop::{EngineeringRange, LoopId, ProcessLoop, ProcessType};
use crate::domain::tuning_record::TuningRecord;
use crate::infrastructure::config::TuningSettings;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
pub struct LoopDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub process_type: ProcessType,
    #[serde(default)]
    pub pv_range: EngineeringRange,
    #[serde(default)]
    pub output_range: EngineeringRange,
}

/// Partial edit of a loop. Process type changes go through
/// [`LoopService::set_process_type`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoopUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub pv_range: Option<EngineeringRange>,
    pub output_range: Option<EngineeringRange>,
}

#[derive(Clone)]
pub struct LoopService {
    repository: Arc<dyn TuningRepository>,
    locks: Arc<LoopLocks>,
    settings: TuningSettings,
}

impl LoopService {
    pub fn new(
        repository: Arc<dyn TuningRepository>,
        locks: Arc<LoopLocks>,
        settings: TuningSettings,
    ) -> Self {
        Self {
            repository,
            locks,
            settings,
        }
    }

    pub async fn list_loops(&self) -> TuningResult<Vec<ProcessLoop>> {
        Ok(self.repository.list_loops().await?)
    }

    pub async fn get_loop(&self, id: LoopId) -> TuningResult<ProcessLoop> {
        load_loop(self.repository.as_ref(), id).await
    }

    /// Create a loop together with its tuning record.
    pub async fn create_loop(&self, draft: LoopDraft) -> TuningResult<ProcessLoop> {
        let loop_id = self.repository.next_id().await?;
        let record_id = self.repository.next_id().await?;

        let process_loop = ProcessLoop::new(
            loop_id,
            draft.name,
            draft.description,
            draft.process_type,
            draft.pv_range,
            draft.output_range,
            record_id,
        )?;
        let record = TuningRecord::new(
            record_id,
            loop_id,
            self.settings.default_method,
            self.settings.default_lambda,
            self.settings.acceptable_filter_time,
        )?;

        self.repository.save_record(record).await?;
        self.repository.save_loop(process_loop.clone()).await?;

        tracing::info!(
            "Created loop {} '{}' ({}) with tuning record {}",
            process_loop.id,
            process_loop.name,
            process_loop.process_type,
            record_id
        );
        Ok(process_loop)
    }

    pub async fn update_loop(&self, id: LoopId, update: LoopUpdate) -> TuningResult<ProcessLoop> {
        let _guard = self.locks.acquire(id).await;
        let mut process_loop = load_loop(self.repository.as_ref(), id).await?;

        if let Some(pv_range) = update.pv_range {
            pv_range.validate("process variable")?;
        }
        if let Some(output_range) = update.output_range {
            output_range.validate("output")?;
        }

        let ranges_changed = update.pv_range.is_some_and(|r| r != process_loop.pv_range)
            || update.output_range.is_some_and(|r| r != process_loop.output_range);

        if let Some(name) = update.name {
            process_loop.name = name;
        }
        if let Some(description) = update.description {
            process_loop.description = description;
        }
        if let Some(pv_range) = update.pv_range {
            process_loop.pv_range = pv_range;
        }
        if let Some(output_range) = update.output_range {
            process_loop.output_range = output_range;
        }
        self.repository.save_loop(process_loop.clone()).await?;

        if ranges_changed {
            tracing::debug!("Engineering ranges of loop {} changed, recomputing", id);
            recompute_loop(self.repository.as_ref(), id).await?;
        }

        Ok(process_loop)
    }

    /// Change the process type, relabel every owned bump test and recompute
    /// the whole loop.
    pub async fn set_process_type(
        &self,
        id: LoopId,
        process_type: ProcessType,
    ) -> TuningResult<ProcessLoop> {
        let _guard = self.locks.acquire(id).await;
        let mut process_loop = load_loop(self.repository.as_ref(), id).await?;

        if process_loop.process_type != process_type {
            tracing::info!(
                "Loop {} process type {} -> {}",
                id,
                process_loop.process_type,
                process_type
            );
            process_loop.process_type = process_type;
            self.repository.save_loop(process_loop.clone()).await?;
        }

        recompute_loop(self.repository.as_ref(), id).await?;
        Ok(process_loop)
    }

    /// Copy the current aggregate of the loop's tuning record into the
    /// loop's officially adopted settings.
    pub async fn adopt_tuning(&self, id: LoopId) -> TuningResult<ProcessLoop> {
        let _guard = self.locks.acquire(id).await;
        let mut process_loop = load_loop(self.repository.as_ref(), id).await?;
        let record = load_record(self.repository.as_ref(), process_loop.tuning_record_id).await?;

        process_loop.adopt(record.id, record.settings());
        self.repository.save_loop(process_loop.clone()).await?;

        tracing::info!(
            "Loop {} adopted gain={} ti={} td={}",
            id,
            record.gain,
            record.integral_time,
            record.derivative_time
        );
        Ok(process_loop)
    }

    /// Delete a loop with its charts, bump tests and tuning record.
    pub async fn delete_loop(&self, id: LoopId) -> TuningResult<()> {
        {
            let _guard = self.locks.acquire(id).await;
            let process_loop = load_loop(self.repository.as_ref(), id).await?;

            for chart in self.repository.list_charts(id).await? {
                for test in self.repository.list_bump_tests(chart.id).await? {
                    self.repository.delete_bump_test(test.id).await?;
                }
                self.repository.delete_chart(chart.id).await?;
            }
            self.repository
                .delete_record(process_loop.tuning_record_id)
                .await?;
            self.repository.delete_loop(id).await?;
        }
        self.locks.forget(id);

        tracing::info!("Deleted loop {}", id);
        Ok(())
    }
}
