use indicatif::{ProgressBar, ProgressStyle};
use roadwatch_core::{AppViewModel, JobState};
use roadwatch_engine::{Notification, NotificationDisplay, NotificationSeverity};
use roadwatch_logging::rw_debug;

const BAR_TEMPLATE: &str = "  {spinner} [{bar:40.cyan/blue}] {pos:>3}% {msg}";

pub struct Renderer {
    bar: ProgressBar,
}

impl Renderer {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        Self { bar }
    }

    /// Notifications print above the bar so they do not tear it.
    pub fn display(&self) -> TerminalDisplay {
        TerminalDisplay {
            bar: self.bar.clone(),
        }
    }

    pub fn render(&self, view: &AppViewModel) {
        self.bar.set_position(u64::from(view.progress_percent));
        self.bar.set_message(status_line(view));
        self.bar.tick();
    }

    pub fn println(&self, line: impl AsRef<str>) {
        self.bar.println(line);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

fn status_line(view: &AppViewModel) -> String {
    let mut line = match (&view.phase_label, &view.file_name) {
        (Some(phase), _) => phase.clone(),
        (None, Some(name)) => format!(
            "{} {} ({})",
            view.job_state.label(),
            name,
            view.file_size.as_deref().unwrap_or("?")
        ),
        (None, None) => view.job_state.label().to_string(),
    };
    if view.job_state == JobState::Processing && !view.channel_open {
        line.push_str(" [reconnecting]");
    }
    line
}

pub struct TerminalDisplay {
    bar: ProgressBar,
}

impl NotificationDisplay for TerminalDisplay {
    fn show(&self, notification: &Notification) {
        let tag = match notification.severity {
            NotificationSeverity::Success => "ok",
            NotificationSeverity::Error => "error",
            NotificationSeverity::Warning => "warning",
        };
        self.bar.println(format!("  [{tag}] {}", notification.message));
    }

    fn hide(&self, notification: &Notification) {
        rw_debug!("Notification {} expired", notification.id);
    }
}
