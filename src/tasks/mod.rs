pub mod humiture;
pub mod random_walk;

pub use humiture::{HumitureTelemetry, PollStats};
pub use random_walk::WalkTelemetry;

#[cfg(target_os = "none")]
pub use humiture::humiture_task;
#[cfg(target_os = "none")]
pub use random_walk::random_walk_task;
