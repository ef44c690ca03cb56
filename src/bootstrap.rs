//! Startup environment checks: resolving the bundled user guide and, on
//! Windows, making sure the FFmpeg binaries yt-dlp relies on for merging
//! and transcoding sit next to the application.

use std::{
    env,
    fs::File,
    io::{self, Cursor},
    path::{Path, PathBuf},
};

use log::{info, warn};
use rfd::{MessageButtons, MessageDialog, MessageLevel};
use rust_embed::RustEmbed;
use zip::ZipArchive;

use crate::error::Error;

/// Assets compiled into the binary
#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

const GUIDE_FILE: &str = "user_guide.txt";

/// FFmpeg essentials build served by gyan.dev; only the two executables in
/// `REQUIRED_TOOLS` are taken out of it
const FFMPEG_ARCHIVE_URL: &str =
    "https://www.gyan.dev/ffmpeg/builds/ffmpeg-release-essentials.zip";
const REQUIRED_TOOLS: [&str; 2] = ["ffmpeg.exe", "ffprobe.exe"];

/// Directory holding the running executable
fn app_dir() -> Result<PathBuf, Error> {
    let exe = env::current_exe()?;
    Ok(exe.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(".")))
}

/// Returns the user guide, preferring the embedded copy over a
/// `user_guide.txt` placed next to the executable
pub fn guide_text() -> Result<String, Error> {
    if let Some(embedded) = Asset::get(GUIDE_FILE) {
        return Ok(String::from_utf8_lossy(&embedded.data).into_owned());
    }
    let fallback = app_dir()?.join(GUIDE_FILE);
    std::fs::read_to_string(&fallback)
        .map_err(|_| Error::GuideMissing(fallback.display().to_string()))
}

/// Windows-only FFmpeg presence check. Missing binaries are fetched after
/// a consent prompt; declining or failing only degrades merging and audio
/// extraction, it never blocks startup.
pub fn ensure_ffmpeg() {
    if !cfg!(target_os = "windows") {
        // other platforms rely on a system-managed FFmpeg
        return;
    }
    let dir = match app_dir() {
        Ok(dir) => dir,
        Err(error) => {
            warn!("cannot resolve the application directory: {error}");
            return;
        }
    };
    if REQUIRED_TOOLS.iter().all(|tool| dir.join(tool).is_file()) {
        return;
    }

    let consent = MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title("FFmpeg missing (FFmpeg 누락)")
        .set_description(
            "FFmpeg is required for merging high quality streams and extracting audio. \
             Download ffmpeg.exe and ffprobe.exe now? \
             (고화질 병합과 오디오 추출을 위해 FFmpeg가 필요합니다. 지금 다운로드할까요?)",
        )
        .set_buttons(MessageButtons::YesNo)
        .show();
    if !consent {
        warn!("FFmpeg is missing; merging and audio extraction will fail");
        return;
    }

    match fetch_ffmpeg(&dir) {
        Ok(()) => {
            info!("FFmpeg extracted into {}", dir.display());
            MessageDialog::new()
                .set_level(MessageLevel::Info)
                .set_title("FFmpeg downloaded (FFmpeg 다운로드 완료)")
                .set_description(
                    "FFmpeg downloaded successfully. Please restart the application. \
                     (FFmpeg가 다운로드되었습니다. 프로그램을 다시 시작하세요.)",
                )
                .set_buttons(MessageButtons::Ok)
                .show();
        }
        Err(error) => {
            warn!("FFmpeg download failed: {error}");
            MessageDialog::new()
                .set_level(MessageLevel::Error)
                .set_title("FFmpeg download failed (FFmpeg 다운로드 실패)")
                .set_description(&format!(
                    "An error occurred while downloading FFmpeg: {error} \
                     (FFmpeg 다운로드 중 오류가 발생했습니다.)"
                ))
                .set_buttons(MessageButtons::Ok)
                .show();
        }
    }
}

/// Fetches the archive synchronously and writes the two required
/// executables into `dir`, ignoring every other entry
fn fetch_ffmpeg(dir: &Path) -> Result<(), Error> {
    info!("fetching {FFMPEG_ARCHIVE_URL}");
    let archive = reqwest::blocking::get(FFMPEG_ARCHIVE_URL)?
        .error_for_status()?
        .bytes()?;
    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        let Some(target) = required_tool_name(entry.name()) else {
            continue;
        };
        let mut file = File::create(dir.join(target))?;
        io::copy(&mut entry, &mut file)?;
    }
    Ok(())
}

/// Matches an archive entry against the required executables by
/// case-insensitive filename suffix
fn required_tool_name(entry_name: &str) -> Option<&'static str> {
    let lower = entry_name.to_ascii_lowercase();
    REQUIRED_TOOLS.iter().copied().find(|tool| lower.ends_with(tool))
}
