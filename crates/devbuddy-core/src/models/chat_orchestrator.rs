use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{debug, warn};

use super::message::{Message, Role};
use crate::services::StreamError;

pub const FALLBACK_ERROR_TEXT: &str = "Connection to the assistant failed. Please try again.";

const GREETING_ID: &str = "welcome";
const RECONNECT_GREETING_ID: &str = "welcome-repo";

/// Phase of the current turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatPhase {
    Idle,
    Sending,
    Streaming,
}

/// Ticket for the turn started by [`ChatOrchestrator::begin_turn`].
///
/// Carries everything the stream driver needs without holding the lock:
/// the raw history preceding this turn, the user's text and the id of the
/// placeholder that chunks are written into.
#[derive(Clone, Debug)]
pub struct TurnHandle {
    turn_id: u64,
    generation: u64,
    placeholder_id: String,
    user_text: String,
    history: Vec<Message>,
    cancel: Arc<Notify>,
}

impl TurnHandle {
    pub fn placeholder_id(&self) -> &str {
        &self.placeholder_id
    }

    pub fn user_text(&self) -> &str {
        &self.user_text
    }

    /// Messages that preceded this turn, in order, with their raw content.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Resolves when the turn is stopped or superseded by a reset.
    pub async fn cancelled(&self) {
        self.cancel.notified().await;
    }
}

struct ActiveTurn {
    turn_id: u64,
    placeholder_id: String,
    accumulated: String,
    cancel: Arc<Notify>,
}

/// Chat transcript plus the single-turn state machine
/// `Idle -> Sending -> Streaming -> Idle`.
///
/// Only one turn may be in flight; input arriving while a turn is active is
/// rejected, not queued. Resets bump a generation counter so chunks of a
/// superseded turn are ignored.
pub struct ChatOrchestrator {
    messages: Vec<Message>,
    phase: ChatPhase,
    active: Option<ActiveTurn>,
    generation: u64,
    next_turn_id: u64,
}

impl ChatOrchestrator {
    /// Transcript opened with a greeting for `connection` (or the local playground).
    pub fn new(connection: Option<&str>) -> Self {
        let greeting = format!(
            "Hello! Connected to repository {}. I can see the file structure. \
             Open the files you want me to analyze in depth.",
            connection.unwrap_or("Local")
        );
        Self {
            messages: vec![Message::model(greeting).with_id(GREETING_ID)],
            phase: ChatPhase::Idle,
            active: None,
            generation: 0,
            next_turn_id: 0,
        }
    }

    /// Start a turn for `input`.
    ///
    /// Returns `None` (and leaves the transcript untouched) for blank input or
    /// while another turn is in flight. Otherwise appends the user message and
    /// an empty model placeholder.
    pub fn begin_turn(&mut self, input: &str) -> Option<TurnHandle> {
        if input.trim().is_empty() {
            return None;
        }
        if self.phase != ChatPhase::Idle {
            debug!(phase = ?self.phase, "Rejecting input while a turn is in flight");
            return None;
        }

        let history = self.messages.clone();
        let user_message = Message::user(input);
        let placeholder = Message::model(String::new());
        let placeholder_id = placeholder.id.clone();

        self.messages.push(user_message);
        self.messages.push(placeholder);

        self.next_turn_id += 1;
        let cancel = Arc::new(Notify::new());
        self.active = Some(ActiveTurn {
            turn_id: self.next_turn_id,
            placeholder_id: placeholder_id.clone(),
            accumulated: String::new(),
            cancel: cancel.clone(),
        });
        self.phase = ChatPhase::Sending;

        Some(TurnHandle {
            turn_id: self.next_turn_id,
            generation: self.generation,
            placeholder_id,
            user_text: input.to_string(),
            history,
            cancel,
        })
    }

    /// Whether `handle` still owns the in-flight turn.
    pub fn is_current(&self, handle: &TurnHandle) -> bool {
        handle.generation == self.generation
            && self
                .active
                .as_ref()
                .is_some_and(|turn| turn.turn_id == handle.turn_id)
    }

    /// The upstream call accepted the request.
    pub fn mark_streaming(&mut self, handle: &TurnHandle) -> bool {
        if !self.is_current(handle) {
            return false;
        }
        self.phase = ChatPhase::Streaming;
        true
    }

    /// Append a delta and publish the full accumulated text into the
    /// placeholder. Returns `false` when the turn is no longer current.
    pub fn apply_chunk(&mut self, handle: &TurnHandle, chunk: &str) -> bool {
        if !self.is_current(handle) {
            return false;
        }
        let Some(turn) = self.active.as_mut() else {
            return false;
        };

        turn.accumulated.push_str(chunk);
        self.phase = ChatPhase::Streaming;

        if let Some(message) = self
            .messages
            .iter_mut()
            .find(|m| m.id == turn.placeholder_id)
        {
            message.content.clone_from(&turn.accumulated);
        }
        true
    }

    /// The stream ended normally.
    pub fn complete_turn(&mut self, handle: &TurnHandle) -> bool {
        if !self.is_current(handle) {
            return false;
        }
        self.active = None;
        self.phase = ChatPhase::Idle;
        true
    }

    /// The upstream call failed.
    ///
    /// Partial output is kept as-is. If nothing was produced the empty
    /// placeholder is replaced by a fallback error message.
    pub fn fail_turn(&mut self, handle: &TurnHandle, error: &StreamError) -> bool {
        if !self.is_current(handle) {
            return false;
        }
        let Some(turn) = self.active.take() else {
            return false;
        };
        self.phase = ChatPhase::Idle;

        warn!(error = %error, partial_len = turn.accumulated.len(), "Chat turn failed");

        if turn.accumulated.is_empty() {
            self.messages.retain(|m| m.id != turn.placeholder_id);
            self.messages.push(Message::model(FALLBACK_ERROR_TEXT));
        }
        true
    }

    /// Stop the in-flight turn, keeping whatever was streamed so far. A
    /// placeholder that never received output is removed.
    pub fn stop(&mut self) -> bool {
        let Some(turn) = self.active.take() else {
            return false;
        };
        turn.cancel.notify_one();
        if turn.accumulated.is_empty() {
            self.messages.retain(|m| m.id != turn.placeholder_id);
        }
        self.phase = ChatPhase::Idle;
        debug!(turn_id = turn.turn_id, "Chat turn stopped");
        true
    }

    /// New repository connection: a single greeting naming it.
    pub fn reset_for_connection(&mut self, connection: &str) {
        self.supersede_active();
        self.messages = vec![
            Message::model(format!(
                "Environment reconfigured for {connection}. Ready to help with the code."
            ))
            .with_id(RECONNECT_GREETING_ID),
        ];
    }

    /// Empty the transcript.
    pub fn clear(&mut self) {
        self.supersede_active();
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn phase(&self) -> ChatPhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == ChatPhase::Idle
    }

    /// Most recent model message, if any.
    pub fn last_model_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Model)
    }

    fn supersede_active(&mut self) {
        if let Some(turn) = self.active.take() {
            turn.cancel.notify_one();
        }
        self.generation += 1;
        self.phase = ChatPhase::Idle;
    }
}

impl Default for ChatOrchestrator {
    fn default() -> Self {
        Self::new(None)
    }
}
