//! Session and context orchestration for the DevBuddy repository assistant.
//!
//! The crate owns everything between the repository host and the language
//! model: the open-file workspace, the bounded prompt context, the streaming
//! chat state machine and the controller that ties them to user actions.

pub mod controllers;
pub mod error;
pub mod logging;
pub mod models;
pub mod repositories;
pub mod services;
pub mod settings;

pub use controllers::{AppController, Notice, NoticeKind, SidebarView};
pub use error::AppError;
pub use models::{
    ChatOrchestrator, ChatPhase, Message, ProjectFile, Role, Session, ViewMode, WorkspaceStore,
};
pub use services::{ChatService, CompletionBackend, ContextAssembler, StreamError, TurnOutcome};
pub use settings::Settings;
