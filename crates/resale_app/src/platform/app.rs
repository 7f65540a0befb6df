use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use engine_logging::engine_info;
use log::LevelFilter;
use resale_core::{
    update, AppState, GuidedPhase, ImageFile, ImageId, Msg, RunMode, SearchMode,
};

use super::config::load_config;
use super::effects::EffectRunner;
use super::ui::render;
use crate::Cli;

const POLL_INTERVAL: Duration = Duration::from_millis(75);

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliMode {
    Active,
    Sold,
    Both,
}

impl From<CliMode> for RunMode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Active => RunMode::Active,
            CliMode::Sold => RunMode::Sold,
            CliMode::Both => RunMode::Both,
        }
    }
}

pub fn run_app(cli: Cli) -> anyhow::Result<()> {
    let (config, found) = load_config(&cli.config)?;
    let level = if config.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    engine_logging::initialize(config.log_destination, level, &config.log_file);
    if found {
        engine_info!("Loaded config from {:?}", cli.config);
    } else {
        engine_info!("No config at {:?}; using defaults", cli.config);
    }

    let runner = EffectRunner::new(config.stream_settings()).context("Failed to start engine")?;
    let mut session = Session::new(AppState::with_plan(config.step_plan()), runner);

    let mut image_ids: ImageId = 0;
    let mut next_image = |path: PathBuf| {
        image_ids += 1;
        ImageFile::new(image_ids, path)
    };
    session.dispatch(Msg::MainImageChanged(Some(next_image(cli.main_image.clone()))));
    if !cli.extra_images.is_empty() {
        let extras = cli.extra_images.iter().cloned().map(&mut next_image).collect();
        session.dispatch(Msg::ExtraImagesChanged(extras));
    }
    if let Some(text) = cli.text.clone() {
        session.dispatch(Msg::TextChanged(text));
    }
    if let Some(name) = cli.item_name.clone() {
        session.dispatch(Msg::ItemNameChanged(name));
    }

    let result = if cli.guided {
        run_guided(&mut session, &cli)
    } else {
        session.dispatch(Msg::RunRequested(cli.mode.into()));
        Ok(())
    };

    if result.is_ok() {
        session.pump_until(|state| !is_running(state));
        session.print(render::render_results(&session.state.view()));
    }
    session.dispatch(Msg::Teardown);
    result
}

fn run_guided(session: &mut Session, cli: &Cli) -> anyhow::Result<()> {
    session.dispatch(Msg::IdentifyRequested);
    session.pump_until(|state| state.guided().phase() != GuidedPhase::Identifying);
    session.print(render::render_guided(&session.state.view()));

    if session.state.guided().phase() != GuidedPhase::PickMatch {
        let reason = session
            .state
            .guided()
            .error()
            .unwrap_or("lookup did not return matches")
            .to_string();
        bail!("Guided identification failed: {reason}");
    }
    let Some(candidate) = session.state.guided().candidates().get(cli.pick).cloned() else {
        bail!(
            "Candidate {} does not exist; {} were offered",
            cli.pick,
            session.state.guided().candidates().len()
        );
    };

    session.dispatch(Msg::CandidateSelected(candidate.id));
    if let Some(title) = cli.title.clone() {
        session.dispatch(Msg::TitleEdited(title));
    }
    session.dispatch(Msg::GuidedRunConfirmed);
    if session.state.guided().phase() != GuidedPhase::Analyzing {
        bail!("Guided run could not start: the title is empty");
    }
    session.print(render::render_guided(&session.state.view()));
    Ok(())
}

fn is_running(state: &AppState) -> bool {
    [SearchMode::Active, SearchMode::Sold]
        .iter()
        .any(|mode| state.slot(*mode).run().awaiting_finish())
}

struct Session {
    state: AppState,
    runner: EffectRunner,
    last_progress: Vec<String>,
}

impl Session {
    fn new(state: AppState, runner: EffectRunner) -> Self {
        Self {
            state,
            runner,
            last_progress: Vec::new(),
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        self.state = state;
        self.runner.enqueue(effects);

        if was_dirty && self.state.requested().is_some() {
            let lines = render::render_progress(&self.state.view());
            if lines != self.last_progress {
                self.print(lines.clone());
                self.last_progress = lines;
            }
        }
    }

    fn pump_until(&mut self, done: impl Fn(&AppState) -> bool) {
        while !done(&self.state) {
            if let Some(msg) = self.runner.next_msg(POLL_INTERVAL) {
                self.dispatch(msg);
            }
        }
    }

    fn print(&self, lines: Vec<String>) {
        for line in lines {
            println!("{line}");
        }
    }
}
