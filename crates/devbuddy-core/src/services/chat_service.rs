use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use github_client::GitTreeItem;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::completion::{CompletionBackend, CompletionRequest, StreamError};
use super::context_assembler::ContextAssembler;
use crate::models::{ChatOrchestrator, ProjectFile, TurnHandle};

/// How a driven turn ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed,
    Failed(StreamError),
    /// Stopped by the user or superseded by a reset; nothing more was written.
    Cancelled,
}

/// Drives one chat turn from prompt assembly to the last chunk.
#[derive(Clone)]
pub struct ChatService {
    backend: Arc<dyn CompletionBackend>,
    assembler: ContextAssembler,
    idle_timeout: Duration,
}

impl ChatService {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        assembler: ContextAssembler,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            assembler,
            idle_timeout,
        }
    }

    pub fn assembler(&self) -> &ContextAssembler {
        &self.assembler
    }

    /// Raw prior turns plus the composite prompt for `handle`'s input.
    pub fn prepare_request(
        &self,
        handle: &TurnHandle,
        focus: &ProjectFile,
        open_files: &[ProjectFile],
        tree: &[GitTreeItem],
    ) -> CompletionRequest {
        CompletionRequest {
            history: handle.history().to_vec(),
            prompt: self
                .assembler
                .build_prompt(focus, open_files, tree, handle.user_text()),
        }
    }

    /// Stream the reply for `handle` into `chat`.
    ///
    /// The lock is taken only for each state update. Every wait on the
    /// upstream (the initial call and each following chunk) is bounded by
    /// the idle timeout, so the turn always returns to idle.
    pub async fn run_turn(
        &self,
        chat: &Mutex<ChatOrchestrator>,
        handle: TurnHandle,
        request: CompletionRequest,
    ) -> TurnOutcome {
        let started = tokio::select! {
            _ = handle.cancelled() => return TurnOutcome::Cancelled,
            result = tokio::time::timeout(
                self.idle_timeout,
                self.backend.stream_completion(request),
            ) => result,
        };

        let mut stream = match started {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return fail(chat, &handle, e),
            Err(_) => return fail(chat, &handle, StreamError::Timeout(self.idle_timeout)),
        };

        let accepted = chat.lock().mark_streaming(&handle);
        if !accepted {
            return TurnOutcome::Cancelled;
        }

        let mut chunks = 0usize;
        loop {
            let next = tokio::select! {
                _ = handle.cancelled() => {
                    debug!(chunks, "Chat stream cancelled");
                    return TurnOutcome::Cancelled;
                }
                next = tokio::time::timeout(self.idle_timeout, stream.next()) => next,
            };

            match next {
                Ok(Some(Ok(chunk))) => {
                    let applied = chat.lock().apply_chunk(&handle, &chunk);
                    if !applied {
                        debug!(chunks, "Discarding chunks of a superseded turn");
                        return TurnOutcome::Cancelled;
                    }
                    chunks += 1;
                }
                Ok(Some(Err(e))) => return fail(chat, &handle, e),
                Ok(None) => {
                    let completed = chat.lock().complete_turn(&handle);
                    if !completed {
                        return TurnOutcome::Cancelled;
                    }
                    info!(chunks, "Chat turn completed");
                    return TurnOutcome::Completed;
                }
                Err(_) => return fail(chat, &handle, StreamError::Timeout(self.idle_timeout)),
            }
        }
    }
}

fn fail(chat: &Mutex<ChatOrchestrator>, handle: &TurnHandle, error: StreamError) -> TurnOutcome {
    let applied = chat.lock().fail_turn(handle, &error);
    if applied {
        TurnOutcome::Failed(error)
    } else {
        warn!(error = %error, "Dropping failure of a superseded turn");
        TurnOutcome::Cancelled
    }
}
