pub mod batch_state;
pub mod file_ctx;
pub mod file_task;

pub use batch_state::{BatchState, SharedBatchState};
pub use file_ctx::FileCtx;
pub use file_task::{FileOutcome, FileTask};
