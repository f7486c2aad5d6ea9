//! egui front end

pub mod app;
pub mod components;
pub mod state;
pub mod theme;

pub use app::RagChatApp;
pub use state::{AppState, View};
pub use theme::Theme;
