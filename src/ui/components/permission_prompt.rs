//! Fallback prompt shown when microphone access fails

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub struct PermissionPrompt<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> PermissionPrompt<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ctx: &egui::Context) {
        if !self.state.permission_prompt_visible() {
            return;
        }

        let mut allow = false;
        let mut deny = false;

        egui::Window::new("Microphone access")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(
                    RichText::new("Voice input needs access to your microphone.")
                        .color(self.theme.text_primary),
                );
                ui.label(
                    RichText::new("Allow access to try again, or deny to keep typing.")
                        .size(12.0)
                        .color(self.theme.text_muted),
                );
                ui.add_space(self.theme.spacing_sm);

                ui.horizontal(|ui| {
                    allow = ui
                        .add(egui::Button::new("Allow").fill(self.theme.primary))
                        .clicked();
                    deny = ui.button("Deny").clicked();
                });
            });

        if allow {
            self.state.allow_microphone();
        } else if deny {
            self.state.deny_microphone();
        }
    }
}
