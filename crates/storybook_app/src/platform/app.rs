use std::io::{self, Write};
use std::sync::mpsc;

use anyhow::Context;
use clap::Parser;
use storybook_core::{update, AppState, AppViewModel, DownloadStatus, Msg, Url, ViewState};
use storybook_logging::story_info;

use super::config::{self, Cli};
use super::effects::EffectRunner;
use super::{logging, ui};

pub fn run_app() -> anyhow::Result<()> {
    let settings = config::resolve(Cli::parse())?;
    logging::initialize(settings.log, &settings.log_file);
    story_info!(
        "Starting storybook: action={} download={}",
        settings.submission.action,
        settings.download
    );

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let runner = EffectRunner::new(settings.engine.clone(), msg_tx)
        .context("failed to start submission engine")?;
    let mut session = Session::new(runner, settings.submission.action.clone());

    session.dispatch(Msg::FormSubmitted(settings.submission))?;
    session.wait_until(&msg_rx, |view| view.view_state == ViewState::Shown)?;

    if settings.download {
        if session.dispatch(Msg::DownloadClicked)? {
            session.wait_until(&msg_rx, |view| {
                !matches!(view.download, None | Some(DownloadStatus::Pending))
            })?;
        } else {
            eprintln!("Nothing to download: the result is not an HTML story.");
        }
    }

    let final_state = session.state.view_state();
    session.dispatch(Msg::TornDown)?;
    story_info!("Done ({})", ui::render::status_label(final_state));
    Ok(())
}

/// Owns the state and funnels every message through `update`.
struct Session {
    state: AppState,
    runner: EffectRunner,
    base: Url,
    out: io::Stdout,
}

impl Session {
    fn new(runner: EffectRunner, base: Url) -> Self {
        Self {
            state: AppState::new(),
            runner,
            base,
            out: io::stdout(),
        }
    }

    /// Applies `msg`, runs its effects and re-renders if anything changed.
    /// Returns whether any effect was produced.
    fn dispatch(&mut self, msg: Msg) -> io::Result<bool> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let produced = !effects.is_empty();
        self.runner.enqueue(effects);

        let view = state.view();
        let was_dirty = state.consume_dirty();
        self.state = state;
        if was_dirty {
            self.render(&view)?;
        }
        Ok(produced)
    }

    fn wait_until(
        &mut self,
        inbox: &mpsc::Receiver<Msg>,
        done: impl Fn(&AppViewModel) -> bool,
    ) -> anyhow::Result<()> {
        while !done(&self.state.view()) {
            let msg = inbox
                .recv()
                .context("engine stopped before the story was ready")?;
            self.dispatch(msg)?;
        }
        Ok(())
    }

    fn render(&mut self, view: &AppViewModel) -> io::Result<()> {
        let mut out = self.out.lock();
        for line in ui::render::render(view, &self.base) {
            writeln!(out, "{line}")?;
        }
        out.flush()
    }
}
