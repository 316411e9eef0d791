// Shared service wiring and recordings for application tests
use crate::application::loop_locks::LoopLocks;
use crate::application::loop_service::{LoopDraft, LoopService};
use crate::application::trend_service::TrendService;
use crate::application::tuning_repository::TuningRepository;
use crate::application::tuning_service::TuningService;
use crate::domain::bump_test::{BumpTest, Markers};
use crate::domain::process_loop::{EngineeringRange, LoopId, ProcessLoop, ProcessType};
use crate::domain::trend::tests::at;
use crate::domain::trend::{Sample, TrendChart};
use crate::infrastructure::config::TuningSettings;
use crate::infrastructure::memory_repository::InMemoryRepository;
use std::sync::Arc;

/// PV 20 -> 40 and CV 10 -> 30 on 0-100 ranges. CV settles at t=10, PV
/// leaves its start value at t=15 and passes 63.2% at t=65.
pub fn first_order_samples() -> Vec<Sample> {
    vec![
        Sample::new(at(0), 20.0, 10.0),
        Sample::new(at(10), 20.0, 30.0),
        Sample::new(at(15), 20.5, 30.0),
        Sample::new(at(40), 28.0, 30.0),
        Sample::new(at(65), 32.6, 30.0),
        Sample::new(at(120), 38.0, 30.0),
        Sample::new(at(200), 40.0, 30.0),
    ]
}

/// CV steps 50 -> 55 at t=7 while PV ramps.
pub fn integrating_samples() -> Vec<Sample> {
    vec![
        Sample::new(at(0), 10.0, 50.0),
        Sample::new(at(7), 10.0, 55.0),
        Sample::new(at(30), 14.0, 55.0),
        Sample::new(at(60), 20.0, 55.0),
    ]
}

pub struct Fixture {
    pub repository: Arc<dyn TuningRepository>,
    pub loop_service: LoopService,
    pub trend_service: TrendService,
    pub tuning_service: TuningService,
}

impl Fixture {
    pub fn new() -> Self {
        let repository: Arc<dyn TuningRepository> = Arc::new(InMemoryRepository::new());
        let locks = Arc::new(LoopLocks::new());
        Self {
            loop_service: LoopService::new(
                repository.clone(),
                locks.clone(),
                TuningSettings::default(),
            ),
            trend_service: TrendService::new(repository.clone(), locks.clone()),
            tuning_service: TuningService::new(repository.clone(), locks),
            repository,
        }
    }

    async fn create_loop(&self, name: &str, process_type: ProcessType) -> ProcessLoop {
        self.loop_service
            .create_loop(LoopDraft {
                name: name.to_string(),
                description: String::new(),
                process_type,
                pv_range: EngineeringRange::default(),
                output_range: EngineeringRange::default(),
            })
            .await
            .unwrap()
    }

    pub async fn first_order_loop(&self, name: &str) -> ProcessLoop {
        self.create_loop(name, ProcessType::FirstOrder).await
    }

    pub async fn integrating_loop(&self, name: &str) -> ProcessLoop {
        self.create_loop(name, ProcessType::Integrating).await
    }

    pub async fn first_order_chart(&self, loop_id: LoopId) -> TrendChart {
        self.trend_service
            .create_chart(loop_id, Some("step on FV-1".to_string()), first_order_samples())
            .await
            .unwrap()
    }

    /// Bump test over the whole first-order recording with T1, T2 and T4
    /// set; T3 is located at 65s unless `t3` pins it.
    pub async fn first_order_test_with_t3(&self, loop_id: LoopId, t3: Option<i64>) -> BumpTest {
        let chart = self.first_order_chart(loop_id).await;
        let test = self
            .trend_service
            .create_bump_test(chart.id, at(0), at(200))
            .await
            .unwrap();
        self.trend_service
            .set_markers(
                test.id,
                Markers {
                    t1: Some(at(0)),
                    t2: Some(at(15)),
                    t3: t3.map(at),
                    t4: Some(at(200)),
                    tcv: None,
                },
            )
            .await
            .unwrap()
    }

    /// Td = 5s, tau = 50s, Kc = 1.0
    pub async fn identified_first_order_test(&self, loop_id: LoopId) -> BumpTest {
        self.first_order_test_with_t3(loop_id, None).await
    }

    /// Td = 3s, Kc = 20 / (10 * 5) = 0.4
    pub async fn identified_integrating_test(&self, loop_id: LoopId) -> BumpTest {
        let chart = self
            .trend_service
            .create_chart(loop_id, None, integrating_samples())
            .await
            .unwrap();
        let test = self
            .trend_service
            .create_bump_test(chart.id, at(0), at(60))
            .await
            .unwrap();
        self.trend_service
            .set_markers(
                test.id,
                Markers {
                    t1: Some(at(0)),
                    t2: Some(at(10)),
                    t3: Some(at(30)),
                    t4: Some(at(50)),
                    tcv: None,
                },
            )
            .await
            .unwrap()
    }
}
