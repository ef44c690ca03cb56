/// The four download presets offered by the preset dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Best available video+audio, whatever the container
    BestVideo,
    /// Best video capped at 1080p in an MP4 container
    Mp4At1080p,
    /// Best audio stream only, transcoded to MP3
    AudioOnly,
    /// Fetch subtitles without downloading any media
    SubtitlesOnly,
}

/// A single post-processing step, applied by the engine in list order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcessStep {
    /// Transcode the downloaded stream to MP3 at the given kbps target
    ExtractAudioMp3 { bitrate_kbps: u32 },
    /// Embed the media thumbnail into the output container
    EmbedThumbnail,
    /// Embed title/uploader/date metadata into the output container
    EmbedMetadata,
}

/// Snapshot of the input widgets, captured at the moment a batch starts.
///
/// The worker only ever sees this copy, so editing fields mid-run cannot
/// affect downloads already queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiSelection {
    /// Destination folder for downloads
    pub download_dir: String,
    /// Raw display label of the selected preset
    pub preset_label: String,
    /// Comma-separated subtitle language codes, as typed
    pub sub_langs: String,
    /// Whether to embed the thumbnail into the output file
    pub embed_thumbnail: bool,
    /// Whether to embed metadata into the output file
    pub embed_metadata: bool,
    /// Whether auto-generated subtitles count when fetching subtitles
    pub auto_subs: bool,
}

/// One download request handed to the engine, built fresh per URL.
///
/// Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    /// Output path template (directory joined with `%(title)s.%(ext)s`)
    pub output_template: String,
    /// Format specifier string; `None` leaves the engine default
    pub format: Option<String>,
    /// Subtitle language codes, already split and trimmed
    pub subtitle_langs: Vec<String>,
    /// Fetch human-authored subtitles
    pub write_subtitles: bool,
    /// Also accept auto-generated subtitles
    pub write_auto_subs: bool,
    /// Skip the media download entirely (subtitles-only runs)
    pub skip_download: bool,
    /// Post-processing steps in application order
    pub postprocessors: Vec<PostProcessStep>,
}

/// Status notification emitted by the engine during one download
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Downloading {
        downloaded_bytes: u64,
        /// Exact total when known, otherwise the engine's estimate
        total_bytes: Option<u64>,
        /// Bytes per second
        speed: Option<f64>,
        /// Seconds remaining
        eta: Option<u64>,
    },
    /// Download done, engine is post-processing
    Finished,
    Error {
        filename: Option<String>,
    },
}

/// Message from the worker to the UI thread.
///
/// The UI drains these once per frame; widget state is never touched from
/// the worker directly.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Append one line to the log panel
    Log(String),
    /// Set the progress bar, percent in [0, 100]
    Progress(f32),
}
