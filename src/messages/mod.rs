pub mod log;
pub mod types;

pub use log::{LogEvent, LogMutator, MessageLog};
pub use types::{Message, RetrievalSettings, Role};
