//! Input bar component
//!
//! Text input, record toggle and send button.

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Key, RichText, Vec2};

pub struct InputBar<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> InputBar<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing_sm)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    if self.state.audio_enabled() {
                        self.show_record_button(ui);
                        ui.add_space(self.theme.spacing_sm);
                    }

                    self.show_text_input(ui);

                    ui.add_space(self.theme.spacing_sm);

                    self.show_send_button(ui);
                });
            });
    }

    fn show_record_button(&mut self, ui: &mut egui::Ui) {
        let is_recording = self.state.is_recording();
        let is_submitting = self.state.is_submitting();
        let enabled = is_recording || (!is_submitting && !self.state.is_busy());

        let (icon, label, color) = if is_recording {
            ("⏹", "Stop recording", self.theme.recording)
        } else if is_submitting {
            ("⏳", "Processing recording", self.theme.warning)
        } else {
            ("🎤", "Record voice", self.theme.text_secondary)
        };

        let mut button = egui::Button::new(RichText::new(icon).size(20.0).color(color))
            .min_size(Vec2::splat(40.0))
            .rounding(self.theme.button_rounding);
        if is_recording {
            button = button.fill(self.theme.recording.gamma_multiply(0.2));
        }

        let response = ui.add_enabled(enabled, button);
        response.widget_info(|| egui::WidgetInfo::labeled(egui::WidgetType::Button, enabled, label));

        let button_rect = response.rect;
        let clicked = response.clicked();
        let cancel = response.secondary_clicked();
        response.on_hover_text(if is_recording {
            "Click to stop and send, right-click to discard"
        } else {
            label
        });

        if cancel && is_recording {
            self.state.cancel_recording();
        } else if clicked {
            if is_recording {
                self.state.stop_recording();
            } else {
                self.state.start_recording();
            }
        }

        if is_recording {
            // Ring grows with the input level
            let level = self.state.recording_level().clamp(0.0, 1.0);
            let radius = button_rect.width() / 2.0 + 2.0 + level * 12.0;
            ui.painter().circle_stroke(
                button_rect.center(),
                radius,
                egui::Stroke::new(2.0, self.theme.recording.gamma_multiply(0.6)),
            );
            ui.ctx().request_repaint();
        }
    }

    fn show_text_input(&mut self, ui: &mut egui::Ui) {
        let enabled = !self.state.is_busy() && !self.state.is_recording();

        // Reserve space for the send button
        let available_width = ui.available_width() - 56.0;

        let text_edit = egui::TextEdit::singleline(&mut self.state.input_text)
            .hint_text("Ask a question...")
            .desired_width(available_width)
            .font(egui::TextStyle::Body)
            .margin(egui::Margin::symmetric(12.0, 8.0))
            .id(egui::Id::new("message_input"));

        let response = ui.add_enabled(enabled, text_edit);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::TextEdit, enabled, "Message input")
        });

        if response.changed() {
            self.state.on_input_changed();
        }

        if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
            self.state.send_message();
            response.request_focus();
        }
    }

    fn show_send_button(&mut self, ui: &mut egui::Ui) {
        let can_send = !self.state.input_text.trim().is_empty()
            && !self.state.is_busy()
            && !self.state.is_recording();

        let fill = if can_send {
            self.theme.primary
        } else {
            self.theme.text_muted
        };

        let button = egui::Button::new(RichText::new("➤").size(18.0).color(egui::Color32::WHITE))
            .min_size(Vec2::splat(40.0))
            .rounding(self.theme.button_rounding)
            .fill(fill);

        let response = ui.add_enabled(can_send, button);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, can_send, "Send message")
        });

        if response.clicked() {
            self.state.send_message();
        }

        response.on_hover_text("Send message (Enter)");
    }
}
