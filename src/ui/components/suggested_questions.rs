//! Questions offered before the first message

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub struct SuggestedQuestions<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> SuggestedQuestions<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let enabled = self.state.can_submit();
        let mut chosen = None;

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(self.theme.spacing_lg);
                    ui.label(
                        RichText::new("Suggested questions")
                            .size(20.0)
                            .color(self.theme.text_primary),
                    );
                    ui.add_space(self.theme.spacing);

                    for question in &self.state.suggested_questions {
                        let button = egui::Button::new(
                            RichText::new(question).color(self.theme.text_primary),
                        )
                        .fill(self.theme.bg_secondary)
                        .rounding(self.theme.card_rounding)
                        .min_size(egui::vec2(ui.available_width().min(560.0), 40.0));

                        if ui.add_enabled(enabled, button).clicked() {
                            chosen = Some(question.clone());
                        }
                        ui.add_space(self.theme.spacing_sm);
                    }
                });
            });

        if let Some(question) = chosen {
            self.state.send_suggested(&question);
        }
    }
}
