// Application state for HTTP handlers
use crate::application::loop_service::LoopService;
use crate::application::trend_service::TrendService;
use crate::application::tuning_service::TuningService;

#[derive(Clone)]
pub struct AppState {
    pub loop_service: LoopService,
    pub trend_service: TrendService,
    pub tuning_service: TuningService,
}
