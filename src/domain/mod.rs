pub mod dominance;
pub mod error;
pub mod process_loop;
pub mod trend;
pub mod tuning;
pub mod tuning_record;
