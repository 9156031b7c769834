//! HTTP downloading and progress tracking.

pub mod http;
pub mod progress;

pub use http::HttpDownloader;
pub use progress::ProgressTracker;
