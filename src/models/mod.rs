pub mod event;
pub mod file;
pub mod loaders;
pub mod progress;
pub mod result;

pub use event::{BatchEvent, FileSlot};
pub use file::{RemoteFile, UploadFile};
pub use loaders::load_upload_files;
pub use progress::ProgressSample;
pub use result::{BatchResult, FileResult};
