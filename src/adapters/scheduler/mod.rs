mod manual;
mod thread;

pub use manual::ManualScheduler;
pub use thread::{DueCallback, ThreadScheduler};
