use std::path::PathBuf;

use thiserror::Error;

/// Largest accepted upload, 500 MiB.
pub const MAX_FILE_BYTES: u64 = 500 * 1024 * 1024;

const ACCEPTED_MEDIA_TYPES: &[&str] = &["video/mp4", "video/avi", "video/quicktime"];
const ACCEPTED_EXTENSIONS: &[&str] = &["mp4", "avi", "mov"];

/// A file the user picked, before it is allowed into a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub name: String,
    /// Declared media type, if the picker supplied one.
    pub media_type: Option<String>,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Invalid file type. Please upload MP4, AVI, or MOV file.")]
    InvalidType,
    #[error("File size too large. Maximum size is 500MB.")]
    TooLarge,
}

/// Either the declared media type or the filename extension is enough to pass
/// the type check. Type is checked before size.
pub fn validate(file: &CandidateFile) -> Result<(), Rejection> {
    if !has_accepted_media_type(file) && !has_accepted_extension(&file.name) {
        return Err(Rejection::InvalidType);
    }
    if file.size_bytes > MAX_FILE_BYTES {
        return Err(Rejection::TooLarge);
    }
    Ok(())
}

fn has_accepted_media_type(file: &CandidateFile) -> bool {
    file.media_type.as_deref().is_some_and(|declared| {
        let essence = declared.split(';').next().unwrap_or(declared).trim();
        ACCEPTED_MEDIA_TYPES
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(essence))
    })
}

fn has_accepted_extension(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((_, ext)) => ACCEPTED_EXTENSIONS
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// Media type for a known container extension, used when the caller has no
/// declared type of its own.
pub fn media_type_for_name(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "mp4" => Some("video/mp4"),
        "avi" => Some("video/avi"),
        "mov" => Some("video/quicktime"),
        _ => None,
    }
}

/// Human readable size, e.g. `12.5 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
