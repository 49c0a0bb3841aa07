mod client;
mod retry;
mod task;

pub use client::{sha1_file, Downloader};
pub use retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};
pub use task::{dedup_by_destination, DownloadTask};
