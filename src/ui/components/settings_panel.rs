//! Retrieval options sent with each text message

use crate::messages::RetrievalSettings;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub struct SettingsPanel<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> SettingsPanel<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let enabled = !self.state.is_busy();
        let theme = self.theme;
        let settings = &mut self.state.settings;

        ui.add_enabled_ui(enabled, |ui| {
            option_group(ui, theme, "Approach", &RetrievalSettings::APPROACHES, &mut settings.approach);
            ui.add_space(theme.spacing);
            option_group(
                ui,
                theme,
                "Chunk size",
                &RetrievalSettings::CHUNK_SIZES,
                &mut settings.chunk_size,
            );
            ui.add_space(theme.spacing);
            option_group(ui, theme, "Retriever", &RetrievalSettings::RETRIEVERS, &mut settings.retriever);
        });
    }
}

fn option_group(ui: &mut egui::Ui, theme: &Theme, title: &str, options: &[&str], selected: &mut String) {
    ui.label(
        RichText::new(title)
            .size(13.0)
            .strong()
            .color(theme.text_secondary),
    );
    ui.add_space(4.0);

    for option in options {
        if ui.radio(selected.as_str() == *option, *option).clicked() {
            *selected = option.to_string();
        }
    }
}
