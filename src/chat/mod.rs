pub mod session;
pub mod worker;

pub use session::{ChatSession, SessionStatus, SharedStatus};
pub use worker::{ChatCommand, ChatEvent, ChatWorker, TurnKind};
