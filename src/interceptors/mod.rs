use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::InterceptorError;

/// Observer of each instruction/reply exchange, e.g. for diagnosing contract drift.
#[async_trait]
pub trait Interceptor: Send + Sync + Debug {
    async fn save(&self, instruction: &str, reply: &str) -> Result<(), InterceptorError>;
}

pub mod file;
pub use file::FileInterceptor;
