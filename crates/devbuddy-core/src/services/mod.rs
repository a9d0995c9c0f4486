pub mod agent_client;
pub mod chat_service;
pub mod completion;
pub mod context_assembler;
pub mod persona;

pub use agent_client::{AgentClient, RigCompletionBackend, UnconfiguredBackend};
pub use chat_service::{ChatService, TurnOutcome};
pub use completion::{CompletionBackend, CompletionRequest, StreamError, TextStream};
pub use context_assembler::{ContextAssembler, TREE_LISTING_LIMIT, build_context};
pub use persona::{PersonaKind, build_persona, classify_language};
