/// Circumference of the progress ring (2 * PI * 85).
pub const RING_CIRCUMFERENCE: f64 = 534.07;

/// One decoded push-channel (or status poll) message. Any subset of fields may
/// be present.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressUpdate {
    pub progress: Option<u8>,
    pub processed_frames: Option<u64>,
    pub total_frames: Option<u64>,
    pub output_file: Option<String>,
    pub error: Option<String>,
}

impl ProgressUpdate {
    pub fn percent(progress: u8) -> Self {
        Self {
            progress: Some(progress),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.progress.is_none()
            && self.processed_frames.is_none()
            && self.total_frames.is_none()
            && self.output_file.is_none()
            && self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Detecting,
    Rendering,
    Finalizing,
}

impl Phase {
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            0..=29 => Phase::Initializing,
            30..=69 => Phase::Detecting,
            70..=94 => Phase::Rendering,
            _ => Phase::Finalizing,
        }
    }
}

/// Display label for the current percent. Frame counts are shown only once the
/// total is known.
pub fn phase_label(percent: u8, processed_frames: u64, total_frames: u64) -> String {
    let phase = Phase::from_percent(percent);
    if total_frames > 0 {
        let prefix = match phase {
            Phase::Initializing => "Initializing...",
            Phase::Detecting => "Detecting vehicles...",
            Phase::Rendering => "Rendering video...",
            Phase::Finalizing => "Finalizing...",
        };
        format!("{prefix} ({processed_frames}/{total_frames} frames)")
    } else {
        match phase {
            Phase::Initializing => "Initializing video processing...",
            Phase::Detecting => "Analyzing frames and detecting vehicles...",
            Phase::Rendering => "Rendering output video...",
            Phase::Finalizing => "Finalizing...",
        }
        .to_string()
    }
}

/// Stroke offset of the progress ring: full circumference at 0%, zero at 100%.
pub fn ring_offset(percent: u8) -> f64 {
    let percent = f64::from(percent.min(100));
    RING_CIRCUMFERENCE - (percent / 100.0) * RING_CIRCUMFERENCE
}
