use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::BoxStream;
use thiserror::Error;

use crate::models::Message;

/// Failure of a chat completion call.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StreamError {
    #[error("Completion request failed: {0}")]
    Request(String),

    #[error("Completion stream interrupted: {0}")]
    Interrupted(String),

    #[error("No output from the assistant for {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Assistant is not configured: {0}")]
    Configuration(String),
}

/// One upstream call: raw prior turns plus the composite prompt for this turn.
#[derive(Clone, Debug)]
pub struct CompletionRequest {
    pub history: Vec<Message>,
    pub prompt: String,
}

/// Incremental text deltas. Finite; ends on exhaustion or the first error.
pub type TextStream = BoxStream<'static, Result<String, StreamError>>;

pub type CompletionFuture = Pin<Box<dyn Future<Output = Result<TextStream, StreamError>> + Send>>;

/// Language-model streaming endpoint.
///
/// The returned future resolves once the upstream accepted the request; an
/// error there means nothing was streamed.
pub trait CompletionBackend: Send + Sync {
    fn stream_completion(&self, request: CompletionRequest) -> CompletionFuture;
}

impl CompletionBackend for Arc<dyn CompletionBackend> {
    fn stream_completion(&self, request: CompletionRequest) -> CompletionFuture {
        (**self).stream_completion(request)
    }
}
