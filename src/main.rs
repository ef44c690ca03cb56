//! Main application for the YDL Studio GUI

// Startup checks and bundled resources
mod bootstrap;
// yt-dlp engine wrapper and the sequential batch orchestrator
mod downloader;
// Error type shared by the fallible modules
mod error;
// Data models for selections, job configs and progress events
mod model;
// UI-selection to engine-configuration translation
mod options;
// Progress parsing and worker-to-UI relaying
mod progress;

use std::{path::Path, sync::Arc};

use eframe::{App, Frame, egui};
use once_cell::sync::OnceCell;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};
use tokio::{
    runtime::Runtime,
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
};

use model::{UiEvent, UiSelection};
use options::PRESET_LABELS;

// Global Tokio runtime stored in a OnceCell for lazy init
static RUNTIME: OnceCell<Arc<Runtime>> = OnceCell::new();

/// Program entry point: initializes logging and the runtime, runs the
/// startup FFmpeg check, then launches the GUI
fn main() -> Result<(), eframe::Error> {
    env_logger::init();

    let rt = Arc::new(Runtime::new().expect("failed to start the tokio runtime"));
    RUNTIME.set(rt).expect("runtime initialized twice");

    // FFmpeg presence is checked before the window opens; a no-op outside Windows
    bootstrap::ensure_ffmpeg();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([800.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "YDL Studio (YDL 스튜디오)",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Box::new(YdlApp::default())
        }),
    )
}

/// Application state for the GUI
struct YdlApp {
    /// Multi-line URL input, one URL per line
    urls_input: String,
    /// Destination folder for downloads
    download_dir: String,
    /// Display label of the selected preset
    preset_label: String,
    /// Comma-separated subtitle language codes
    sub_langs: String,
    /// Embed the thumbnail into downloaded files
    embed_thumbnail: bool,
    /// Embed metadata into downloaded files
    embed_metadata: bool,
    /// Accept auto-generated subtitles when fetching subtitles
    auto_subs: bool,
    /// Progress bar value, percent in [0, 100]
    percent: f32,
    /// Append-only log panel contents
    log_lines: Vec<String>,
    /// Sender cloned into each batch worker
    events_tx: UnboundedSender<UiEvent>,
    /// UI-owned consumption point, drained once per frame
    events_rx: UnboundedReceiver<UiEvent>,
    /// Guide window contents while it is open
    guide: Option<String>,
}

/// Default initial state for YdlApp
impl Default for YdlApp {
    fn default() -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        Self {
            urls_input: String::new(),
            download_dir: std::env::current_dir()
                .map(|dir| dir.display().to_string())
                .unwrap_or_else(|_| ".".to_owned()),
            preset_label: PRESET_LABELS[0].to_owned(),
            sub_langs: String::new(),
            embed_thumbnail: false,
            embed_metadata: false,
            auto_subs: false,
            percent: 0.0,
            log_lines: Vec::new(),
            events_tx,
            events_rx,
            guide: None,
        }
    }
}

/// GUI update loop: called each frame to redraw and handle interactions
impl App for YdlApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        // Apply worker events in arrival order before drawing
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                UiEvent::Log(line) => self.log_lines.push(line),
                UiEvent::Progress(percent) => self.percent = percent,
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("YDL Studio");

            // URL input field
            ui.label("Video URLs, one per line (비디오 주소, 한 줄에 하나씩):");
            ui.add(
                egui::TextEdit::multiline(&mut self.urls_input)
                    .desired_rows(6)
                    .desired_width(f32::INFINITY),
            );

            // Folder selection
            ui.horizontal(|ui| {
                ui.label("Save to (저장 위치):");
                ui.text_edit_singleline(&mut self.download_dir);
                if ui.button("Browse… (찾기…)").clicked() {
                    if let Some(folder) =
                        FileDialog::new().set_directory(&self.download_dir).pick_folder()
                    {
                        self.download_dir = folder.display().to_string();
                    }
                }
            });

            // Preset dropdown
            ui.horizontal(|ui| {
                ui.label("Preset (프리셋):");
                egui::ComboBox::from_label("")
                    .selected_text(&self.preset_label)
                    .show_ui(ui, |ui| {
                        for label in PRESET_LABELS {
                            ui.selectable_value(&mut self.preset_label, label.to_owned(), label);
                        }
                    });
            });

            // Subtitle languages
            ui.horizontal(|ui| {
                ui.label("Sub languages, comma separated (자막 언어, 쉼표로 구분):");
                ui.text_edit_singleline(&mut self.sub_langs);
            });

            // Optional flags
            ui.horizontal(|ui| {
                ui.checkbox(&mut self.embed_thumbnail, "Embed thumbnail (썸네일 삽입)");
                ui.checkbox(&mut self.embed_metadata, "Embed metadata (메타데이터 삽입)");
                ui.checkbox(&mut self.auto_subs, "Auto subtitles (자동 자막)");
            });

            // Control buttons
            ui.horizontal(|ui| {
                if ui.button("Start (시작)").clicked() {
                    self.start_downloads();
                }
                if ui.button("How to Use (사용법)").clicked() {
                    self.open_guide();
                }
            });

            ui.add(egui::ProgressBar::new(self.percent / 100.0).show_percentage());

            // Log output
            ui.label("Log (로그):");
            egui::ScrollArea::vertical()
                .stick_to_bottom(true)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for line in &self.log_lines {
                        ui.label(line);
                    }
                });
        });

        self.show_guide_window(ctx);

        // Request periodic repaint so channel drains stay prompt mid-batch
        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}

impl YdlApp {
    /// Validates inputs, then spawns one blocking batch worker on the
    /// shared runtime. The worker gets an immutable snapshot of the
    /// selections, so edits made mid-run cannot affect it.
    fn start_downloads(&mut self) {
        let urls = collect_urls(&self.urls_input);
        if urls.is_empty() {
            error_dialog("Please enter at least one video URL. (비디오 URL을 하나 이상 입력하세요.)");
            return;
        }
        if !Path::new(&self.download_dir).is_dir() {
            error_dialog("Please select a valid download directory. (유효한 다운로드 폴더를 선택하세요.)");
            return;
        }

        self.percent = 0.0;
        self.log_lines.push("Starting downloads… (다운로드 시작…)".to_owned());

        let selection = self.selection_snapshot();
        let events = self.events_tx.clone();
        if let Some(runtime) = RUNTIME.get() {
            runtime.spawn_blocking(move || downloader::run_default_batch(&selection, &urls, &events));
        }
    }

    /// Captures the live widget state for the worker
    fn selection_snapshot(&self) -> UiSelection {
        UiSelection {
            download_dir: self.download_dir.clone(),
            preset_label: self.preset_label.clone(),
            sub_langs: self.sub_langs.clone(),
            embed_thumbnail: self.embed_thumbnail,
            embed_metadata: self.embed_metadata,
            auto_subs: self.auto_subs,
        }
    }

    fn open_guide(&mut self) {
        match bootstrap::guide_text() {
            Ok(text) => self.guide = Some(text),
            Err(error) => error_dialog(&format!("{error} (사용법 파일을 찾을 수 없습니다.)")),
        }
    }

    /// Read-only guide window, closable via its title bar
    fn show_guide_window(&mut self, ctx: &egui::Context) {
        let Some(text) = self.guide.clone() else {
            return;
        };
        let mut open = true;
        egui::Window::new("How to Use (사용법)")
            .open(&mut open)
            .default_size([600.0, 400.0])
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.label(text);
                });
            });
        if !open {
            self.guide = None;
        }
    }
}

/// Splits the URL box into trimmed, non-blank lines in input order
fn collect_urls(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

fn error_dialog(message: &str) {
    MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title("Error (오류)")
        .set_description(message)
        .set_buttons(MessageButtons::Ok)
        .show();
}
