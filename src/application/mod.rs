// Application layer - Use cases over the tuning repository
pub mod loop_locks;
pub mod loop_service;
pub mod recompute;
pub mod trend_service;
pub mod tuning_repository;
pub mod tuning_service;

#[cfg(test)]
pub(crate) mod fixtures;
