pub mod chat_orchestrator;
pub mod docs;
pub mod message;
pub mod project_file;
pub mod session;
pub mod workspace_store;

pub use chat_orchestrator::{ChatOrchestrator, ChatPhase, TurnHandle};
pub use docs::{DocSection, find_doc};
pub use message::{Message, Role};
pub use project_file::ProjectFile;
pub use session::{ConnectedRepo, Epoch, Session};
pub use workspace_store::{ViewMode, WorkspaceStore, derive_view_mode};
