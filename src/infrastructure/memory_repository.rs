// In-memory repository implementation
use crate::application::tuning_repository::TuningRepository;
use crate::domain::bump_test::{BumpTest, BumpTestId};
use crate::domain::process_loop::{LoopId, ProcessLoop};
use crate::domain::trend::{ChartId, TrendChart};
use crate::domain::tuning_record::{TuningRecord, TuningRecordId};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Store {
    loops: BTreeMap<LoopId, ProcessLoop>,
    charts: BTreeMap<ChartId, TrendChart>,
    bump_tests: BTreeMap<BumpTestId, BumpTest>,
    records: BTreeMap<TuningRecordId, TuningRecord>,
}

/// Process-local storage. Each save replaces the whole entity, so
/// concurrent writers to the same entity resolve as last-writer-wins.
#[derive(Debug)]
pub struct InMemoryRepository {
    store: RwLock<Store>,
    next_id: AtomicU64,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Store::default()),
            next_id: AtomicU64::new(1),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Store>> {
        self.store
            .read()
            .map_err(|_| anyhow!("repository lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Store>> {
        self.store
            .write()
            .map_err(|_| anyhow!("repository lock poisoned"))
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TuningRepository for InMemoryRepository {
    async fn next_id(&self) -> Result<u64> {
        Ok(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    async fn list_loops(&self) -> Result<Vec<ProcessLoop>> {
        Ok(self.read()?.loops.values().cloned().collect())
    }

    async fn get_loop(&self, id: LoopId) -> Result<Option<ProcessLoop>> {
        Ok(self.read()?.loops.get(&id).cloned())
    }

    async fn save_loop(&self, process_loop: ProcessLoop) -> Result<()> {
        self.write()?.loops.insert(process_loop.id, process_loop);
        Ok(())
    }

    async fn delete_loop(&self, id: LoopId) -> Result<bool> {
        Ok(self.write()?.loops.remove(&id).is_some())
    }

    async fn list_charts(&self, loop_id: LoopId) -> Result<Vec<TrendChart>> {
        Ok(self
            .read()?
            .charts
            .values()
            .filter(|c| c.loop_id == loop_id)
            .cloned()
            .collect())
    }

    async fn get_chart(&self, id: ChartId) -> Result<Option<TrendChart>> {
        Ok(self.read()?.charts.get(&id).cloned())
    }

    async fn save_chart(&self, chart: TrendChart) -> Result<()> {
        self.write()?.charts.insert(chart.id, chart);
        Ok(())
    }

    async fn delete_chart(&self, id: ChartId) -> Result<bool> {
        Ok(self.write()?.charts.remove(&id).is_some())
    }

    async fn list_bump_tests(&self, chart_id: ChartId) -> Result<Vec<BumpTest>> {
        Ok(self
            .read()?
            .bump_tests
            .values()
            .filter(|t| t.chart_id == chart_id)
            .cloned()
            .collect())
    }

    async fn get_bump_test(&self, id: BumpTestId) -> Result<Option<BumpTest>> {
        Ok(self.read()?.bump_tests.get(&id).cloned())
    }

    async fn save_bump_test(&self, test: BumpTest) -> Result<()> {
        self.write()?.bump_tests.insert(test.id, test);
        Ok(())
    }

    async fn delete_bump_test(&self, id: BumpTestId) -> Result<bool> {
        Ok(self.write()?.bump_tests.remove(&id).is_some())
    }

    async fn get_record(&self, id: TuningRecordId) -> Result<Option<TuningRecord>> {
        Ok(self.read()?.records.get(&id).cloned())
    }

    async fn save_record(&self, record: TuningRecord) -> Result<()> {
        self.write()?.records.insert(record.id, record);
        Ok(())
    }

    async fn delete_record(&self, id: TuningRecordId) -> Result<bool> {
        Ok(self.write()?.records.remove(&id).is_some())
    }
}
