mod input_bar;
mod message_list;
mod permission_prompt;
mod settings_panel;
mod suggested_questions;

pub use input_bar::InputBar;
pub use message_list::MessageList;
pub use permission_prompt::PermissionPrompt;
pub use settings_panel::SettingsPanel;
pub use suggested_questions::SuggestedQuestions;
