mod http;
mod retry;

pub use http::HttpTransport;
pub use retry::{retry, BackoffStrategy, RetryPolicy};
