//! Main application struct and eframe integration

use crate::ui::components::{InputBar, MessageList, PermissionPrompt, SettingsPanel, SuggestedQuestions};
use crate::ui::state::{AppState, View};
use crate::ui::theme::Theme;
use egui::{self, CentralPanel, RichText, SidePanel, TopBottomPanel};
use std::time::Duration;
use tracing::info;

pub struct RagChatApp {
    state: AppState,
    theme: Theme,
}

impl RagChatApp {
    pub fn new(cc: &eframe::CreationContext<'_>, state: AppState) -> Self {
        Self::with_context(&cc.egui_ctx, state)
    }

    pub fn with_context(ctx: &egui::Context, state: AppState) -> Self {
        let theme = Theme::for_mode(state.dark_mode);
        theme.apply(ctx);

        // The worker writes to the log from its own thread
        let repaint = ctx.clone();
        state.log.set_observer(move |_| repaint.request_repaint());

        Self { state, theme }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    /// Poll events and draw one frame
    pub fn ui(&mut self, ctx: &egui::Context) {
        self.state.poll_events();

        self.show_header(ctx);
        self.show_settings(ctx);
        self.show_input_area(ctx);
        self.show_content(ctx);
        PermissionPrompt::new(&mut self.state, &self.theme).show(ctx);
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(self.theme.bg_secondary).inner_margin(12.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if self.state.view == View::Chat
                        && ui.button("←").on_hover_text("Back to suggested questions").clicked()
                    {
                        self.state.show_suggestions();
                    }

                    ui.label(
                        RichText::new("RAG Chat")
                            .size(20.0)
                            .strong()
                            .color(self.theme.text_primary),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let theme_icon = if self.theme.dark { "☀" } else { "🌙" };
                        if ui.button(theme_icon).on_hover_text("Toggle theme").clicked() {
                            self.theme = self.theme.toggled();
                            self.state.set_dark_mode(self.theme.dark);
                            self.theme.apply(ui.ctx());
                        }

                        let can_delete = self.state.can_submit() && !self.state.log.is_empty();
                        let response = ui.add_enabled(can_delete, egui::Button::new("🗑"));
                        response.widget_info(|| {
                            egui::WidgetInfo::labeled(egui::WidgetType::Button, can_delete, "Delete chat")
                        });
                        if response.on_hover_text("Delete chat history").clicked() {
                            self.state.delete_chat();
                        }

                        if let Some(notice) = self.state.notice() {
                            ui.label(RichText::new(notice).size(12.0).color(self.theme.primary));
                        }
                    });
                });
            });
    }

    fn show_settings(&mut self, ctx: &egui::Context) {
        SidePanel::left("settings")
            .resizable(false)
            .default_width(200.0)
            .frame(egui::Frame::none().fill(self.theme.bg_secondary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                SettingsPanel::new(&mut self.state, &self.theme).show(ui);
            });
    }

    fn show_input_area(&mut self, ctx: &egui::Context) {
        TopBottomPanel::bottom("input_area")
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                if let Some(error) = self.state.status_snapshot().error {
                    self.show_error_banner(ui, &error);
                    ui.add_space(self.theme.spacing_sm);
                }
                InputBar::new(&mut self.state, &self.theme).show(ui);
            });
    }

    fn show_error_banner(&self, ui: &mut egui::Ui, error: &str) {
        egui::Frame::none()
            .fill(self.theme.error.gamma_multiply(0.15))
            .rounding(self.theme.button_rounding)
            .inner_margin(egui::Margin::symmetric(12.0, 6.0))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                let response = ui.label(RichText::new(error).color(self.theme.error));
                response.widget_info(|| {
                    egui::WidgetInfo::labeled(egui::WidgetType::Label, true, format!("Error: {}", error))
                });
            });
    }

    fn show_content(&mut self, ctx: &egui::Context) {
        CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| match self.state.view {
                View::Suggestions => SuggestedQuestions::new(&mut self.state, &self.theme).show(ui),
                View::Chat => MessageList::new(&self.state, &self.theme).show(ui),
            });
    }
}

impl eframe::App for RagChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui(ctx);

        // Keep polling worker events and the microphone while something is in flight
        if self.state.is_busy() || self.state.is_recording() || self.state.is_submitting() {
            ctx.request_repaint_after(Duration::from_millis(50));
        } else if self.state.notice().is_some() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.state.shutdown();
        info!("RAG chat shutting down");
    }
}
