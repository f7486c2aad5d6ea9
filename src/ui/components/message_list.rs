//! Message list component
//!
//! Displays the conversation, growing in place while a reply streams in.

use crate::messages::Message;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Align, Color32, RichText};

pub struct MessageList<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> MessageList<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let messages = self.state.log.snapshot();
        let typing = self.state.typing_index();

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.add_space(self.theme.spacing);

                    if messages.is_empty() {
                        self.show_empty_state(ui);
                    }

                    for (index, message) in messages.iter().enumerate() {
                        self.show_message(ui, message, typing == Some(index));
                        ui.add_space(self.theme.spacing_sm);
                    }

                    ui.add_space(self.theme.spacing);
                });
            });
    }

    fn show_empty_state(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(80.0);
            ui.label(
                RichText::new("Ask a question to start the conversation.")
                    .size(14.0)
                    .color(self.theme.text_muted),
            );
        });
    }

    fn show_message(&self, ui: &mut egui::Ui, message: &Message, typing: bool) {
        let is_user = message.is_user();
        let bubble_color = if is_user {
            self.theme.user_bubble
        } else {
            self.theme.assistant_bubble
        };
        let text_color = if is_user {
            Color32::WHITE
        } else {
            self.theme.text_primary
        };
        let align = if is_user { Align::RIGHT } else { Align::LEFT };

        ui.with_layout(egui::Layout::top_down(align), |ui| {
            ui.label(
                RichText::new(if is_user { "You" } else { "Assistant" })
                    .size(12.0)
                    .color(self.theme.text_muted),
            );

            ui.add_space(2.0);

            let max_width = ui.available_width() * 0.75;

            egui::Frame::none()
                .fill(bubble_color)
                .rounding(self.theme.bubble_rounding)
                .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                .show(ui, |ui| {
                    ui.set_max_width(max_width);

                    if typing {
                        self.show_typing_indicator(ui);
                    } else {
                        let label = if is_user { "User message" } else { "Assistant message" };
                        let response = ui.label(RichText::new(&message.content).color(text_color));
                        let text = format!("{}: {}", label, message.content);
                        response.widget_info(|| {
                            egui::WidgetInfo::labeled(egui::WidgetType::Label, true, &text)
                        });
                    }
                });

            let mut footer = message.timestamp.format("%H:%M").to_string();
            if let Some(settings) = message.metadata() {
                footer.push_str(&format!(
                    "  ·  {} · {} · {}",
                    settings.approach, settings.chunk_size, settings.retriever
                ));
            }
            ui.label(RichText::new(footer).size(10.0).color(self.theme.text_muted));
        });
    }

    fn show_typing_indicator(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let t = ui.ctx().input(|i| i.time);
            for dot in 0..3 {
                let alpha = ((t * 3.0 + dot as f64 * 0.5).sin() * 0.5 + 0.5) as f32;
                ui.label(
                    RichText::new("●")
                        .size(10.0)
                        .color(self.theme.text_muted.gamma_multiply(alpha)),
                );
            }
        })
        .response
        .widget_info(|| egui::WidgetInfo::labeled(egui::WidgetType::Label, true, "Assistant is typing"));

        ui.ctx().request_repaint();
    }
}
