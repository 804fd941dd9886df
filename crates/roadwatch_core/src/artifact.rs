//! Links to the processed video.
//!
//! The backend re-encodes into an AVI container regardless of the name it
//! reports, so every link rewrites a trailing `.mp4` to `.avi`.

/// Root under which the backend serves finished artifacts.
pub const OUTPUT_ROOT: &str = "/outputs";

const REPORTED_EXTENSION: &str = ".mp4";
const SERVED_EXTENSION: &str = ".avi";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLinks {
    /// Path to open the video in a viewer (new tab, external player).
    pub viewer_url: String,
    /// Path that forces a download.
    pub download_url: String,
    pub download_filename: String,
}

impl ArtifactLinks {
    pub fn for_output(output_file: &str) -> Self {
        let served = served_filename(output_file);
        let url = format!("{OUTPUT_ROOT}/{served}");
        Self {
            viewer_url: url.clone(),
            download_url: url,
            download_filename: served,
        }
    }
}

pub fn served_filename(output_file: &str) -> String {
    match output_file.strip_suffix(REPORTED_EXTENSION) {
        Some(stem) => format!("{stem}{SERVED_EXTENSION}"),
        None => output_file.to_string(),
    }
}
