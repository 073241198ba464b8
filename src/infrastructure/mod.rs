pub mod subscriptions;
pub mod task_pool;

pub use subscriptions::SubscriptionRegistry;
pub use task_pool::{run_bounded, TaskPoolOptions};
