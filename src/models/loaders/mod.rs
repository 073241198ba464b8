pub mod dir_loader;

pub use dir_loader::load_upload_files;
