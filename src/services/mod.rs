pub mod event_emitter;
pub mod local_dir_handler;
pub mod progress_aggregator;
pub mod result_finalizer;
pub mod state_tracker;
pub mod upload_handler;

pub use event_emitter::EventEmitter;
pub use local_dir_handler::LocalDirHandler;
pub use progress_aggregator::{ProgressAggregator, ProgressUpdate};
pub use result_finalizer::ResultFinalizer;
pub use state_tracker::StateTracker;
pub use upload_handler::{ProgressStream, StartedUpload, UploadControl, UploadHandler};
