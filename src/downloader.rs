//! The yt-dlp engine wrapper and the sequential batch orchestrator.
//!
//! Everything here runs on the batch worker, never on the UI thread. The
//! worker deliberately blocks on each engine call; UI updates travel back
//! through the [`UiEvent`] channel only.

use std::{
    env,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread,
};

use log::{debug, info, warn};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    error::Error,
    model::{JobConfig, PostProcessStep, ProgressEvent, UiEvent, UiSelection},
    options::build_config,
    progress::{PROGRESS_TEMPLATE, parse_progress_line, relay_event},
};

/// The "submit one job, receive progress callbacks" seam to the external
/// download engine. The production implementation spawns yt-dlp; tests
/// substitute a mock.
pub trait DownloadEngine {
    /// Runs one download to completion, invoking `on_event` zero or more
    /// times along the way. Blocks the calling thread.
    fn download(
        &self,
        config: &JobConfig,
        url: &str,
        on_event: &mut dyn FnMut(ProgressEvent),
    ) -> Result<(), Error>;
}

/// Engine backed by the yt-dlp executable
pub struct YtDlp {
    binary: PathBuf,
}

impl YtDlp {
    pub const BINARY: &'static str = if cfg!(windows) { "yt-dlp.exe" } else { "yt-dlp" };

    /// Looks for yt-dlp next to the application first, then on PATH
    pub fn locate() -> Result<YtDlp, Error> {
        if let Some(dir) = env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
            let local = dir.join(Self::BINARY);
            if local.is_file() {
                return Ok(YtDlp { binary: local });
            }
        }
        which::which(Self::BINARY)
            .map(|binary| YtDlp { binary })
            .map_err(|_| Error::EngineMissing)
    }
}

/// Translates a [`JobConfig`] into the yt-dlp argument vector, in a fixed
/// order so invocations stay reproducible
fn build_args(config: &JobConfig, url: &str) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(format) = &config.format {
        args.push("-f".to_owned());
        args.push(format.clone());
    }
    if config.skip_download {
        args.push("--skip-download".to_owned());
    }
    if config.write_subtitles {
        args.push("--write-subs".to_owned());
        if !config.subtitle_langs.is_empty() {
            args.push("--sub-langs".to_owned());
            args.push(config.subtitle_langs.join(","));
        }
        if config.write_auto_subs {
            args.push("--write-auto-subs".to_owned());
        }
    }
    for step in &config.postprocessors {
        match step {
            PostProcessStep::ExtractAudioMp3 { bitrate_kbps } => {
                args.push("-x".to_owned());
                args.push("--audio-format".to_owned());
                args.push("mp3".to_owned());
                args.push("--audio-quality".to_owned());
                args.push(format!("{bitrate_kbps}K"));
            }
            PostProcessStep::EmbedThumbnail => args.push("--embed-thumbnail".to_owned()),
            PostProcessStep::EmbedMetadata => args.push("--embed-metadata".to_owned()),
        }
    }
    args.push("--progress-template".to_owned());
    args.push(PROGRESS_TEMPLATE.to_owned());
    args.push("--newline".to_owned());
    args.push("-o".to_owned());
    args.push(config.output_template.clone());
    args.push(url.to_owned());
    args
}

impl DownloadEngine for YtDlp {
    fn download(
        &self,
        config: &JobConfig,
        url: &str,
        on_event: &mut dyn FnMut(ProgressEvent),
    ) -> Result<(), Error> {
        let args = build_args(config, url);
        debug!("spawning {} {:?}", self.binary.display(), args);

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // stderr is drained on a helper thread so a chatty engine cannot
        // fill that pipe while we block on stdout
        let stderr = child.stderr.take();
        let stderr_drain = thread::spawn(move || {
            let mut lines = Vec::new();
            if let Some(stderr) = stderr {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    lines.push(line);
                }
            }
            lines
        });

        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines().map_while(Result::ok) {
                if let Some(event) = parse_progress_line(&line) {
                    on_event(event);
                }
            }
        }

        let status = child.wait()?;
        let stderr_lines = stderr_drain.join().unwrap_or_default();
        for line in stderr_lines.iter().filter(|line| line.starts_with("ERROR:")) {
            debug!("engine error line: {line}");
            on_event(ProgressEvent::Error { filename: None });
        }

        if status.success() {
            Ok(())
        } else {
            let detail = stderr_lines
                .iter()
                .rev()
                .find(|line| line.starts_with("ERROR:"))
                .cloned()
                .unwrap_or_else(|| format!("exit status {status}"));
            Err(Error::EngineFailed(detail))
        }
    }
}

/// Runs one batch strictly sequentially, one URL at a time in input order.
///
/// A failing item is logged and the loop moves on; nothing aborts the
/// batch. Afterwards the progress bar is reset and a single completion
/// notice is logged (no aggregate success/failure counts).
pub fn run_batch<E: DownloadEngine>(
    engine: &E,
    selection: &UiSelection,
    urls: &[String],
    events: &UnboundedSender<UiEvent>,
) {
    for url in urls {
        let config = build_config(selection);
        log_line(events, format!("Starting download: {url} (다운로드 시작)"));
        let result = engine.download(&config, url, &mut |event| relay_event(event, events));
        match result {
            Ok(()) => log_line(events, format!("Completed download: {url} (다운로드 완료)")),
            Err(error) => {
                log_line(events, format!("Failed to download {url}: {error} (다운로드 실패)"));
            }
        }
    }
    let _ = events.send(UiEvent::Progress(0.0));
    log_line(events, "All tasks completed. (모든 작업이 완료되었습니다.)".to_owned());
}

/// Worker entry point spawned by the Start button: locates yt-dlp and runs
/// the batch, or reports once that the engine is unavailable
pub fn run_default_batch(selection: &UiSelection, urls: &[String], events: &UnboundedSender<UiEvent>) {
    match YtDlp::locate() {
        Ok(engine) => run_batch(&engine, selection, urls, events),
        Err(_) => {
            warn!("yt-dlp executable not found, skipping batch");
            log_line(
                events,
                "Error: yt-dlp was not found next to the application or on PATH. \
                 (yt-dlp을 찾을 수 없습니다.)"
                    .to_owned(),
            );
        }
    }
}

fn log_line(events: &UnboundedSender<UiEvent>, line: String) {
    info!("{line}");
    let _ = events.send(UiEvent::Log(line));
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use tokio::sync::mpsc::unbounded_channel;

    use super::*;
    use crate::options::PRESET_LABELS;

    fn selection(preset_label: &str) -> UiSelection {
        UiSelection {
            download_dir: "/tmp/out".to_owned(),
            preset_label: preset_label.to_owned(),
            sub_langs: String::new(),
            embed_thumbnail: false,
            embed_metadata: false,
            auto_subs: false,
        }
    }

    /// Engine double that records call order and fails on one chosen index
    struct MockEngine {
        calls: Mutex<Vec<String>>,
        fail_on: Option<usize>,
    }

    impl MockEngine {
        fn new(fail_on: Option<usize>) -> Self {
            MockEngine {
                calls: Mutex::new(Vec::new()),
                fail_on,
            }
        }
    }

    impl DownloadEngine for MockEngine {
        fn download(
            &self,
            _config: &JobConfig,
            url: &str,
            on_event: &mut dyn FnMut(ProgressEvent),
        ) -> Result<(), Error> {
            let call_index = {
                let mut calls = self.calls.lock().expect("mock lock poisoned");
                calls.push(url.to_owned());
                calls.len()
            };
            on_event(ProgressEvent::Downloading {
                downloaded_bytes: 50,
                total_bytes: Some(100),
                speed: None,
                eta: None,
            });
            if self.fail_on == Some(call_index) {
                return Err(Error::EngineFailed("ERROR: no formats".to_owned()));
            }
            on_event(ProgressEvent::Finished);
            Ok(())
        }
    }

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<UiEvent>) -> (Vec<String>, Vec<f32>) {
        let mut logs = Vec::new();
        let mut percents = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                UiEvent::Log(line) => logs.push(line),
                UiEvent::Progress(percent) => percents.push(percent),
            }
        }
        (logs, percents)
    }

    #[test]
    fn failing_item_does_not_abort_the_batch() {
        let engine = MockEngine::new(Some(2));
        let urls = vec!["https://a".to_owned(), "https://b".to_owned(), "https://c".to_owned()];
        let (tx, mut rx) = unbounded_channel();

        run_batch(&engine, &selection(PRESET_LABELS[0]), &urls, &tx);

        assert_eq!(*engine.calls.lock().expect("mock lock poisoned"), urls);

        let (logs, percents) = drain(&mut rx);
        let failures: Vec<&String> = logs.iter().filter(|l| l.contains("Failed to download")).collect();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("https://b"), "failure line was: {}", failures[0]);
        assert!(
            logs.last().expect("expected log lines").contains("All tasks completed."),
            "last line was: {:?}",
            logs.last()
        );
        // the batch ends with the bar reset to zero
        assert_eq!(percents.last(), Some(&0.0));
    }

    #[test]
    fn all_successful_batch_logs_per_item_completions() {
        let engine = MockEngine::new(None);
        let urls = vec!["https://a".to_owned(), "https://b".to_owned()];
        let (tx, mut rx) = unbounded_channel();

        run_batch(&engine, &selection(PRESET_LABELS[0]), &urls, &tx);

        let (logs, _) = drain(&mut rx);
        assert_eq!(logs.iter().filter(|l| l.contains("Completed download")).count(), 2);
        assert_eq!(logs.iter().filter(|l| l.contains("Failed to download")).count(), 0);
    }

    #[test]
    fn assembles_audio_only_arguments_in_order() {
        let sel = UiSelection {
            embed_thumbnail: true,
            ..selection("Audio Only (MP3) (오디오만)")
        };
        let config = build_config(&sel);

        assert_eq!(
            build_args(&config, "someURL"),
            vec![
                "-f".to_owned(),
                "bestaudio".to_owned(),
                "-x".to_owned(),
                "--audio-format".to_owned(),
                "mp3".to_owned(),
                "--audio-quality".to_owned(),
                "192K".to_owned(),
                "--embed-thumbnail".to_owned(),
                "--progress-template".to_owned(),
                PROGRESS_TEMPLATE.to_owned(),
                "--newline".to_owned(),
                "-o".to_owned(),
                config.output_template.clone(),
                "someURL".to_owned(),
            ]
        );
    }

    #[test]
    fn assembles_subtitle_arguments() {
        let sel = UiSelection {
            sub_langs: "en, ko".to_owned(),
            auto_subs: true,
            ..selection("Subtitles Only (자막만)")
        };
        let config = build_config(&sel);
        let args = build_args(&config, "someURL");

        assert!(args.contains(&"--skip-download".to_owned()));
        assert!(args.contains(&"--write-subs".to_owned()));
        assert!(args.contains(&"--write-auto-subs".to_owned()));
        let langs_at = args.iter().position(|a| a == "--sub-langs").expect("expected --sub-langs");
        assert_eq!(args[langs_at + 1], "en,ko");
        // no media download, so no format selection either
        assert!(!args.contains(&"-f".to_owned()));
    }
}
