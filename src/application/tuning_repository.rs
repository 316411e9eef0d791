// Repository trait for tuning data access
use crate::domain::bump_test::{BumpTest, BumpTestId};
use crate::domain::process_loop::{LoopId, ProcessLoop};
use crate::domain::trend::{ChartId, TrendChart};
use crate::domain::tuning_record::{TuningRecord, TuningRecordId};
use async_trait::async_trait;

/// Persistence for the tuning entities. `save_*` methods insert or replace
/// the whole entity; deletes do not cascade.
#[async_trait]
pub trait TuningRepository: Send + Sync {
    /// Allocate an id unique across all entity kinds
    async fn next_id(&self) -> anyhow::Result<u64>;

    async fn list_loops(&self) -> anyhow::Result<Vec<ProcessLoop>>;
    async fn get_loop(&self, id: LoopId) -> anyhow::Result<Option<ProcessLoop>>;
    async fn save_loop(&self, process_loop: ProcessLoop) -> anyhow::Result<()>;
    async fn delete_loop(&self, id: LoopId) -> anyhow::Result<bool>;

    async fn list_charts(&self, loop_id: LoopId) -> anyhow::Result<Vec<TrendChart>>;
    async fn get_chart(&self, id: ChartId) -> anyhow::Result<Option<TrendChart>>;
    async fn save_chart(&self, chart: TrendChart) -> anyhow::Result<()>;
    async fn delete_chart(&self, id: ChartId) -> anyhow::Result<bool>;

    async fn list_bump_tests(&self, chart_id: ChartId) -> anyhow::Result<Vec<BumpTest>>;
    async fn get_bump_test(&self, id: BumpTestId) -> anyhow::Result<Option<BumpTest>>;
    async fn save_bump_test(&self, test: BumpTest) -> anyhow::Result<()>;
    async fn delete_bump_test(&self, id: BumpTestId) -> anyhow::Result<bool>;

    async fn get_record(&self, id: TuningRecordId) -> anyhow::Result<Option<TuningRecord>>;
    async fn save_record(&self, record: TuningRecord) -> anyhow::Result<()>;
    async fn delete_record(&self, id: TuningRecordId) -> anyhow::Result<bool>;
}
