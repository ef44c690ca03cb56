//! Parses engine progress-template lines and relays them to the UI thread
//! as log lines plus a clamped percentage. The sender side runs on the
//! worker; the receiver is drained once per frame by the UI.

use tokio::sync::mpsc::UnboundedSender;

use crate::model::{ProgressEvent, UiEvent};

/// Marker the engine is told to prepend to every progress report
pub const PROGRESS_PREFIX: &str = "[ydl-progress]";

/// Template handed to yt-dlp; fields come back whitespace-separated with
/// `NA` for anything the extractor does not know
pub const PROGRESS_TEMPLATE: &str = "[ydl-progress] %(progress.status)s \
%(progress.downloaded_bytes)s %(progress.total_bytes)s \
%(progress.total_bytes_estimate)s %(progress.speed)s %(progress.eta)s";

pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let rest = line.trim().strip_prefix(PROGRESS_PREFIX)?;
    let mut fields = rest.split_whitespace();
    match fields.next()? {
        "downloading" => {
            let downloaded = parse_field(fields.next()?).unwrap_or(0.0);
            let total = parse_field(fields.next()?);
            let estimate = parse_field(fields.next()?);
            let speed = parse_field(fields.next()?);
            let eta = parse_field(fields.next()?);
            Some(ProgressEvent::Downloading {
                downloaded_bytes: downloaded as u64,
                // prefer the exact total, fall back to the estimate
                total_bytes: total.or(estimate).map(|v| v as u64),
                speed,
                eta: eta.map(|v| v as u64),
            })
        }
        "finished" => Some(ProgressEvent::Finished),
        "error" => Some(ProgressEvent::Error { filename: None }),
        _ => None,
    }
}

fn parse_field(token: &str) -> Option<f64> {
    token.parse::<f64>().ok()
}

/// Clamps whatever the engine reported into the displayable range
pub fn clamp_percent(percent: f32) -> f32 {
    percent.clamp(0.0, 100.0)
}

fn percent_of(downloaded: u64, total: Option<u64>) -> f32 {
    match total {
        Some(total) if total > 0 => (downloaded as f64 / total as f64 * 100.0) as f32,
        _ => 0.0,
    }
}

/// Turns one engine event into UI messages. Never touches widget state;
/// everything goes through the channel.
pub fn relay_event(event: ProgressEvent, events: &UnboundedSender<UiEvent>) {
    log::trace!("engine event: {event:?}");
    match event {
        ProgressEvent::Downloading {
            downloaded_bytes,
            total_bytes,
            speed,
            eta,
        } => {
            let percent = percent_of(downloaded_bytes, total_bytes);
            let mut line = format!("Downloading: {percent:.1}%");
            if let Some(speed) = speed {
                line.push_str(&format!(" {:.2} MB/s", speed / 1024.0 / 1024.0));
            }
            if let Some(eta) = eta {
                line.push_str(&format!(" ETA {eta}s"));
            }
            line.push_str(" (다운로드 중)");
            send(events, UiEvent::Log(line));
            send(events, UiEvent::Progress(clamp_percent(percent)));
        }
        ProgressEvent::Finished => {
            send(
                events,
                UiEvent::Log("Download finished, post-processing… (다운로드 완료, 후처리 중…)".to_owned()),
            );
            send(events, UiEvent::Progress(100.0));
        }
        ProgressEvent::Error { filename } => {
            let name = filename.unwrap_or_else(|| "unknown".to_owned());
            send(events, UiEvent::Log(format!("Error: {name} failed to download. (다운로드 실패)")));
        }
    }
}

fn send(events: &UnboundedSender<UiEvent>, event: UiEvent) {
    // the UI dropping its receiver just means nobody is watching anymore
    let _ = events.send(event);
}
