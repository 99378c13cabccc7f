//! Stage names of the reference karaoke pipeline, in execution order.
//!
//! The client never validates reported stages against this list; it is
//! only used to label them for display.

/// Fetch the source video.
pub const STAGE_DOWNLOAD: &str = "download";

/// Extract the audio track from the video.
pub const STAGE_EXTRACT: &str = "extract";

/// Split vocals from the instrumental.
pub const STAGE_SEPARATE_VOCALS: &str = "separate_vocals";

/// Transcribe and time-align lyrics.
pub const STAGE_TRANSCRIBE: &str = "transcribe";

/// Mux the instrumental back onto the video.
pub const STAGE_MERGE: &str = "merge";

/// Burn the lyric subtitles into the video.
pub const STAGE_OVERLAY: &str = "overlay";

/// Human-readable label for a stage name.
///
/// Known stages get a fixed label; anything else is shown with
/// underscores replaced by spaces and the first letter capitalized.
pub fn stage_label(name: &str) -> String {
    match name {
        STAGE_DOWNLOAD => "Download video".to_string(),
        STAGE_EXTRACT => "Extract audio".to_string(),
        STAGE_SEPARATE_VOCALS => "Separate vocals".to_string(),
        STAGE_TRANSCRIBE => "Transcribe lyrics".to_string(),
        STAGE_MERGE => "Merge instrumental".to_string(),
        STAGE_OVERLAY => "Overlay lyrics".to_string(),
        other => {
            let spaced = other.replace('_', " ");
            let mut chars = spaced.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}
