// Presentation layer - HTTP adapter over the tuning services
pub mod app_state;
pub mod handlers;
