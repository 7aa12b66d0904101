use chrono::{DateTime, Local};
use eframe::egui;
use std::path::PathBuf;

use crate::cli::Args;
use crate::config::AppConfig;
use crate::file_watcher::{self, FileWatcher};
use crate::pane::{LogPane, ResourceMetadata};
use crate::renderer::LevelLineRenderer;

pub struct LogPaneApp {
    ctx: egui::Context,
    config: AppConfig,
    file_watcher: FileWatcher,
    current_file: Option<PathBuf>,
    pane: LogPane<LevelLineRenderer>,
    metadata: ResourceMetadata,
    last_update: Option<DateTime<Local>>,
    message: Option<String>,
}

impl LogPaneApp {
    pub fn new(ctx: egui::Context, config: AppConfig, args: Args) -> Self {
        let metadata = args.metadata();
        let mut app = Self {
            pane: Self::new_pane(&ctx, &config, String::new(), metadata.clone()),
            ctx,
            config,
            file_watcher: FileWatcher::new(),
            current_file: None,
            metadata,
            last_update: None,
            message: None,
        };
        app.pane.set_expanded(args.expanded);

        if let Some(path) = args.file {
            app.open_file(path);
        }
        app
    }

    fn new_pane(
        ctx: &egui::Context,
        config: &AppConfig,
        log_text: String,
        metadata: ResourceMetadata,
    ) -> LogPane<LevelLineRenderer> {
        let renderer = LevelLineRenderer::new(config.color_palette.clone());
        LogPane::new(ctx.clone(), renderer, log_text, metadata)
    }

    /// Show a different file. The old pane is dropped, which unmounts it.
    fn open_file(&mut self, path: PathBuf) {
        let log_text = match file_watcher::read_log(&path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), "failed to open log: {}", e);
                self.message = Some(format!("Failed to open {}: {}", path.display(), e));
                return;
            }
        };

        let expanded = self.pane.is_expanded();
        self.pane = Self::new_pane(&self.ctx, &self.config, log_text, self.metadata.clone());
        self.pane.set_expanded(expanded);
        self.current_file = Some(path.clone());
        self.last_update = Some(Local::now());
        self.message = None;

        if self.config.tail_log {
            self.start_watching(path);
        } else {
            self.file_watcher.stop();
        }
    }

    fn reload(&mut self) {
        let Some(path) = self.current_file.clone() else {
            return;
        };
        match file_watcher::read_log(&path) {
            Ok(text) => {
                self.pane.set_log(text);
                self.last_update = Some(Local::now());
                self.message = None;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "failed to reload log: {}", e);
                self.message = Some(format!("Failed to reload: {}", e));
            }
        }
    }

    fn start_watching(&mut self, path: PathBuf) {
        if let Err(e) = self.file_watcher.watch_file(path) {
            tracing::warn!("failed to watch log file: {}", e);
            self.message = Some(format!("Tailing unavailable: {}", e));
        }
    }

    fn check_file_updates(&mut self) {
        if !self.config.tail_log || !self.file_watcher.is_watching() {
            return;
        }
        if self.file_watcher.check_for_changes() {
            self.reload();
        }
    }

    fn pick_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Log files", &["log", "txt"])
            .pick_file()
        {
            self.open_file(path);
        }
    }
}

impl eframe::App for LogPaneApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_file_updates();

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("📁 Open File...").clicked() {
                        self.pick_file();
                        ui.close_menu();
                    }
                    if ui.button("🔄 Reload").clicked() {
                        self.reload();
                        ui.close_menu();
                    }
                });

                ui.menu_button("View", |ui| {
                    let mut expanded = self.pane.is_expanded();
                    if ui.checkbox(&mut expanded, "Expanded").changed() {
                        self.pane.set_expanded(expanded);
                    }
                });
            });
        });

        if !self.pane.is_expanded() {
            egui::TopBottomPanel::top("controls").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("File:");
                    match &self.current_file {
                        Some(path) => ui.label(path.display().to_string()),
                        None => ui.label("No file loaded"),
                    };

                    ui.separator();

                    let mut tail_log = self.config.tail_log;
                    if ui.checkbox(&mut tail_log, "Tail Log").changed() {
                        self.config.tail_log = tail_log;
                        match self.current_file.clone().filter(|_| tail_log) {
                            Some(path) => self.start_watching(path),
                            None => self.file_watcher.stop(),
                        }
                    }

                    ui.separator();
                    ui.label(self.pane.mode().label());
                    ui.label(format!("Lines: {}", self.pane.content().line_count()));
                    if let Some(updated) = self.last_update {
                        ui.label(format!("Updated {}", updated.format("%H:%M:%S")));
                    }
                    if let Some(message) = &self.message {
                        ui.separator();
                        ui.colored_label(egui::Color32::LIGHT_RED, message.as_str());
                    }
                });
            });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.pane.show(ui);
        });

        // Keep polling the file watcher while tailing
        if self.file_watcher.is_watching() {
            ctx.request_repaint_after(std::time::Duration::from_millis(250));
        }
    }
}
