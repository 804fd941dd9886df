use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use roadwatch_core::{
    media_type_for_name, update, AppState, BackendStatus, CandidateFile, Effect, JobState, Msg,
    Severity,
};
use roadwatch_engine::inspect_file;
use roadwatch_logging::{rw_info, rw_warn};

use super::config::ClientConfig;
use super::effects::{EffectRunner, Inbound};
use super::render::Renderer;
use crate::Cli;

/// Render tick, as in the event loop of a windowed front end.
const TICK: Duration = Duration::from_millis(75);
/// How long to wait for the push channel before submitting anyway.
const CHANNEL_GRACE: Duration = Duration::from_secs(10);

pub fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let mut config = ClientConfig::load(cli.config.as_deref())?;
    config.apply_overrides(cli);
    let settings = config.client_settings()?;
    rw_info!("Using backend {}", settings.base_url);

    let file = candidate_for(&cli.video)?;
    let renderer = Renderer::new();
    let runner = EffectRunner::new(settings, Arc::new(renderer.display()))
        .context("failed to start engine")?;
    let mut session = Session {
        state: AppState::with_options(config.controller_options()),
        runner,
        renderer,
        last_error: None,
    };

    let outcome = session.drive(file, cli);
    session.renderer.finish();
    match outcome {
        Outcome::Completed => Ok(ExitCode::SUCCESS),
        Outcome::Failed(reason) => {
            eprintln!("roadwatch: {reason}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn candidate_for(path: &Path) -> anyhow::Result<CandidateFile> {
    let local = inspect_file(path).with_context(|| format!("cannot read {}", path.display()))?;
    let media_type = media_type_for_name(&local.name).map(ToOwned::to_owned);
    Ok(CandidateFile {
        path: local.path,
        name: local.name,
        media_type,
        size_bytes: local.size_bytes,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Completed,
    Failed(String),
}

struct Session {
    state: AppState,
    runner: EffectRunner,
    renderer: Renderer,
    /// Most recent error notification, used as the failure reason.
    last_error: Option<String>,
}

impl Session {
    fn drive(&mut self, file: CandidateFile, cli: &Cli) -> Outcome {
        self.dispatch(Msg::AppStarted);
        if let Err(reason) = self.await_backend() {
            return Outcome::Failed(reason);
        }

        self.dispatch(Msg::FileChosen(file));
        if self.state.job().state() != JobState::FileSelected {
            return self.failure("file was not accepted");
        }
        self.dispatch(Msg::SubmitClicked);

        loop {
            match self.state.job().state() {
                JobState::Uploading | JobState::Processing => {}
                JobState::Completed => return self.finish(cli),
                JobState::Failed => return self.failure("processing failed"),
                JobState::FileSelected => return self.failure("submission was refused"),
                JobState::Idle => return self.failure("processing failed"),
            }
            self.pump();
        }
    }

    /// Waits for the health check, then gives the push channel a moment to
    /// connect so early progress is not missed.
    fn await_backend(&mut self) -> Result<(), String> {
        while self.state.backend() == BackendStatus::Unknown {
            self.pump();
        }
        if self.state.backend() == BackendStatus::Unreachable {
            return Err(self
                .last_error
                .clone()
                .unwrap_or_else(|| "backend unreachable".to_string()));
        }

        let deadline = Instant::now() + CHANNEL_GRACE;
        while !self.state.is_channel_open() && Instant::now() < deadline {
            self.pump();
        }
        if !self.state.is_channel_open() {
            rw_warn!("Push channel not connected yet; submitting anyway");
        }
        Ok(())
    }

    fn finish(&mut self, cli: &Cli) -> Outcome {
        let Some(links) = self.state.artifact_links() else {
            return self.failure("completed without an artifact");
        };
        self.renderer.println(format!("  Result: {}", links.viewer_url));

        if cli.open {
            self.dispatch(Msg::OpenResultClicked);
        }
        if cli.download_dir.is_some() {
            self.dispatch(Msg::DownloadClicked);
            loop {
                match self.runner.next(TICK) {
                    Some(Inbound::Downloaded { filename, result }) => match result {
                        Ok(path) => {
                            self.renderer
                                .println(format!("  Saved {} to {}", filename, path.display()));
                            break;
                        }
                        Err(err) => {
                            return Outcome::Failed(format!("download of {filename} failed: {err}"))
                        }
                    },
                    Some(Inbound::Msg(msg)) => self.dispatch(msg),
                    None => self.dispatch(Msg::Tick),
                }
            }
        }
        Outcome::Completed
    }

    fn failure(&self, fallback: &str) -> Outcome {
        let reason = self
            .state
            .last_failure()
            .map(ToOwned::to_owned)
            .or_else(|| self.state.job().last_error().map(ToOwned::to_owned))
            .or_else(|| self.last_error.clone())
            .unwrap_or_else(|| fallback.to_string());
        Outcome::Failed(reason)
    }

    fn pump(&mut self) {
        match self.runner.next(TICK) {
            Some(Inbound::Msg(msg)) => self.dispatch(msg),
            Some(Inbound::Downloaded { filename, .. }) => {
                rw_warn!("Unexpected download result for {}", filename);
            }
            None => self.dispatch(Msg::Tick),
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        for effect in &effects {
            if let Effect::Notify {
                message,
                severity: Severity::Error,
            } = effect
            {
                self.last_error = Some(message.clone());
            }
        }
        self.runner.enqueue(effects);
        if state.consume_dirty() {
            self.renderer.render(&state.view());
        }
        self.state = state;
    }
}
