pub mod planner;
pub mod retry;

pub use planner::{ItineraryService, PlanStage};
pub use retry::RetryPolicy;
