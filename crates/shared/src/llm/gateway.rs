use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

pub type GenerateFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, TextGenerationError>> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum TextGenerationError {
    #[error("text generation request timed out")]
    Timeout,
    #[error("text generation provider request failed: {0}")]
    ProviderFailure(String),
    #[error("text generation provider returned an invalid payload: {0}")]
    InvalidPayload(String),
}

/// The text-generation capability: given a formatted prompt, return
/// freeform text. Nothing about the output is guaranteed; callers parse
/// defensively.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a>;
}
