pub mod backend;
pub mod classify;
pub mod config;
pub mod controller;
pub mod state;
pub mod widget;

// Re-export main types for convenience
pub use backend::{BackendError, ChatBackend, ChatReply, HealthStatus, HttpBackend, SourceRef};
pub use classify::{FailureKind, FAILURE_PREFIX, PLACEHOLDER_REPLY};
pub use config::{Config, Settings, DEFAULT_BASE_URL, DEFAULT_GREETING};
pub use controller::ChatController;
pub use state::{ConversationStore, Message, MessageId, Sender};
pub use widget::ChatWidget;
