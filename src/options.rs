//! Translates a [`UiSelection`] snapshot into the [`JobConfig`] handed to
//! the download engine. Pure functions, no side effects, no failures:
//! anything unrecognized degrades to the engine defaults.

use std::path::Path;

use crate::model::{JobConfig, PostProcessStep, Preset, UiSelection};

/// Display labels for the preset dropdown, English first with the Korean
/// translation in parentheses
pub const PRESET_LABELS: [&str; 4] = [
    "Best Video (최고 화질)",
    "1080p MP4 (1080p MP4)",
    "Audio Only (MP3) (오디오만)",
    "Subtitles Only (자막만)",
];

/// Fixed target bitrate for the Audio Only preset
pub const MP3_BITRATE_KBPS: u32 = 192;

/// Filename pattern appended to the chosen directory; expanded by the
/// engine, not locally
const OUTPUT_FILE_TEMPLATE: &str = "%(title)s.%(ext)s";

const FORMAT_BEST: &str = "bv*+ba/best";
const FORMAT_1080P_MP4: &str =
    "bestvideo[height<=1080][ext=mp4]+bestaudio[ext=m4a]/best[height<=1080][ext=mp4]";
const FORMAT_AUDIO: &str = "bestaudio";

impl Preset {
    /// Matches a display label against the known presets.
    ///
    /// Only the substring before the first parenthesis counts, so localized
    /// secondary labels (and duplicated ones like `"1080p MP4 (1080p MP4)"`)
    /// resolve the same as the bare name. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Preset> {
        let key = label.split('(').next().unwrap_or(label).trim();
        match key {
            "Best Video" => Some(Preset::BestVideo),
            "1080p MP4" => Some(Preset::Mp4At1080p),
            "Audio Only" => Some(Preset::AudioOnly),
            "Subtitles Only" => Some(Preset::SubtitlesOnly),
            _ => None,
        }
    }
}

/// Splits the free-text subtitle language field into trimmed, non-empty codes
pub fn split_sub_langs(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Builds the download configuration for one URL from the current snapshot.
///
/// The URL itself is passed to the engine alongside the config and does not
/// influence any option.
pub fn build_config(selection: &UiSelection) -> JobConfig {
    let mut format = None;
    let mut skip_download = false;
    let mut write_subtitles = false;
    let mut write_auto_subs = false;
    let mut postprocessors = Vec::new();

    match Preset::from_label(&selection.preset_label) {
        Some(Preset::BestVideo) => format = Some(FORMAT_BEST.to_owned()),
        Some(Preset::Mp4At1080p) => format = Some(FORMAT_1080P_MP4.to_owned()),
        Some(Preset::AudioOnly) => {
            format = Some(FORMAT_AUDIO.to_owned());
            postprocessors.push(PostProcessStep::ExtractAudioMp3 {
                bitrate_kbps: MP3_BITRATE_KBPS,
            });
        }
        Some(Preset::SubtitlesOnly) => {
            skip_download = true;
            write_subtitles = true;
            write_auto_subs = selection.auto_subs;
        }
        // leave the format unset and let the engine pick
        None => {}
    }

    // A non-empty language list enables subtitle fetching for every preset
    let subtitle_langs = split_sub_langs(&selection.sub_langs);
    if !subtitle_langs.is_empty() {
        write_subtitles = true;
        write_auto_subs = selection.auto_subs;
    }

    if selection.embed_thumbnail {
        postprocessors.push(PostProcessStep::EmbedThumbnail);
    }
    if selection.embed_metadata {
        postprocessors.push(PostProcessStep::EmbedMetadata);
    }

    let output_template = Path::new(&selection.download_dir)
        .join(OUTPUT_FILE_TEMPLATE)
        .to_string_lossy()
        .into_owned();

    JobConfig {
        output_template,
        format,
        subtitle_langs,
        write_subtitles,
        write_auto_subs,
        skip_download,
        postprocessors,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn selection() -> UiSelection {
        UiSelection {
            download_dir: "/tmp/downloads".to_owned(),
            preset_label: PRESET_LABELS[0].to_owned(),
            sub_langs: String::new(),
            embed_thumbnail: false,
            embed_metadata: false,
            auto_subs: false,
        }
    }

    #[test]
    fn label_matching_ignores_parenthesized_suffix() {
        assert_eq!(Preset::from_label("Best Video (최고 화질)"), Some(Preset::BestVideo));
        assert_eq!(Preset::from_label("Audio Only (MP3) (오디오만)"), Some(Preset::AudioOnly));
        assert_eq!(Preset::from_label("Subtitles Only"), Some(Preset::SubtitlesOnly));
        assert_eq!(Preset::from_label("  1080p MP4  "), Some(Preset::Mp4At1080p));
        assert_eq!(Preset::from_label("4K HDR"), None);
    }

    #[test]
    fn duplicated_localized_label_selects_same_format() {
        let mut plain = selection();
        plain.preset_label = "1080p MP4".to_owned();
        let mut adorned = selection();
        adorned.preset_label = "1080p MP4 (1080p MP4)".to_owned();

        assert_eq!(build_config(&plain), build_config(&adorned));
        assert_eq!(build_config(&plain).format.as_deref(), Some(FORMAT_1080P_MP4));
    }

    #[test]
    fn sub_langs_are_trimmed_and_empties_dropped() {
        assert_eq!(split_sub_langs("en, ko ,  fr"), vec!["en", "ko", "fr"]);
        assert_eq!(split_sub_langs(""), Vec::<String>::new());
        assert_eq!(split_sub_langs(" , ,"), Vec::<String>::new());
    }

    #[test]
    fn building_twice_yields_equal_configs() {
        let mut sel = selection();
        sel.preset_label = PRESET_LABELS[2].to_owned();
        sel.sub_langs = "en,ko".to_owned();
        sel.embed_thumbnail = true;
        sel.embed_metadata = true;
        sel.auto_subs = true;

        assert_eq!(build_config(&sel), build_config(&sel));
    }

    #[test]
    fn unknown_preset_leaves_engine_defaults() {
        let mut sel = selection();
        sel.preset_label = "Something Else".to_owned();

        let config = build_config(&sel);
        assert_eq!(config.format, None);
        assert!(!config.skip_download);
        assert!(config.postprocessors.is_empty());
    }

    #[test]
    fn audio_only_appends_exactly_one_extraction_step_first() {
        let mut sel = selection();
        sel.preset_label = "Audio Only (MP3) (오디오만)".to_owned();
        sel.embed_thumbnail = true;
        sel.embed_metadata = true;

        let config = build_config(&sel);
        assert_eq!(config.format.as_deref(), Some(FORMAT_AUDIO));
        assert_eq!(
            config.postprocessors,
            vec![
                PostProcessStep::ExtractAudioMp3 { bitrate_kbps: 192 },
                PostProcessStep::EmbedThumbnail,
                PostProcessStep::EmbedMetadata,
            ]
        );
    }

    #[test]
    fn subtitles_only_skips_media_and_follows_auto_flag() {
        let mut sel = selection();
        sel.preset_label = PRESET_LABELS[3].to_owned();
        sel.auto_subs = true;

        let config = build_config(&sel);
        assert_eq!(config.format, None);
        assert!(config.skip_download);
        assert!(config.write_subtitles);
        assert!(config.write_auto_subs);
    }

    #[test]
    fn languages_enable_subtitles_independent_of_preset() {
        let mut sel = selection();
        sel.sub_langs = "en, ko ,  fr".to_owned();

        let config = build_config(&sel);
        assert_eq!(config.subtitle_langs, vec!["en", "ko", "fr"]);
        assert!(config.write_subtitles);
        assert!(!config.write_auto_subs);
        assert!(!config.skip_download);
    }

    #[test]
    fn output_template_joins_directory_and_pattern() {
        let config = build_config(&selection());
        assert!(config.output_template.starts_with("/tmp/downloads"));
        assert!(config.output_template.ends_with("%(title)s.%(ext)s"));
    }
}
