//! Error type shared by the downloader and bootstrap modules.

/// Errors that can surface from engine invocations or the FFmpeg bootstrap.
///
/// Everything here is caught at a boundary (the per-URL download loop or the
/// startup check) and turned into a log line or dialog; nothing propagates
/// out of the worker.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Wrapper for [`std::io::Error`]
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper for [`reqwest::Error`] (bootstrap archive fetch)
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Wrapper for [`zip::result::ZipError`] (bootstrap archive extraction)
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The yt-dlp executable could not be found next to the application or on PATH
    #[error("yt-dlp executable not found")]
    EngineMissing,

    /// yt-dlp ran but exited with a failure status
    #[error("yt-dlp failed: {0}")]
    EngineFailed(String),

    /// The bundled user guide could not be resolved
    #[error("user guide not found at {0}")]
    GuideMissing(String),
}
