mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::{Path, PathBuf},
    time::Duration,
};
use swatch::{
    app_dirs::AppDirs,
    config::{Config, ConfigError, ConfigStore, FileConfigStore},
    runtime::{Intent, Move, Runner, TerminalInput, WallClock},
    scheduler::TimerQueue,
    score::{BestScoreStore, GameRecord, MemoryStore},
    stats::ScoreDb,
    GameSession, Phase, SessionView,
};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Redraw cadence; the session's own timer runs on the configured tick interval
const FRAME_RATE_MS: u64 = 16;
const HISTORY_LEN: usize = 5;

type Session = GameSession<Box<dyn BestScoreStore>, StdRng, TimerQueue>;

/// timed color matching game: pick the swatch before the clock runs out
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A timed color matching game. Each round shows a color; pick the matching swatch from the options before the countdown hits zero. Your best score is kept between games."
)]
pub struct Cli {
    /// number of rounds per game
    #[clap(short = 'r', long)]
    rounds: Option<u32>,

    /// number of candidate colors per round (1-9)
    #[clap(short = 'o', long)]
    options: Option<usize>,

    /// countdown per round, in time units (one unit is 0.1s of wall time)
    #[clap(short = 't', long)]
    time: Option<u32>,

    /// path to the score database
    #[clap(long)]
    db: Option<PathBuf>,

    /// keep scores in memory only
    #[clap(long)]
    no_persist: bool,

    /// write the effective settings to the config file
    #[clap(long)]
    save_config: bool,

    /// where to write the log (filter with RUST_LOG)
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// seed the color generator for a reproducible game
    #[clap(long)]
    seed: Option<u64>,
}

impl Cli {
    /// Overlay command line settings on the persisted config
    fn apply(&self, mut config: Config) -> Config {
        if let Some(rounds) = self.rounds {
            config.max_rounds = rounds;
        }
        if let Some(options) = self.options {
            config.option_count = options;
        }
        if let Some(time) = self.time {
            config.initial_timer = time;
        }
        config
    }

    fn open_store(&self) -> Box<dyn BestScoreStore> {
        if self.no_persist {
            return Box::new(MemoryStore::new());
        }
        let db = match &self.db {
            Some(path) => ScoreDb::with_path(path),
            None => ScoreDb::new(),
        };
        match db {
            Ok(db) => Box::new(db),
            Err(e) => {
                warn!(error = %e, "score database unavailable, scores will not persist");
                Box::new(MemoryStore::new())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub session: Session,
    /// What was last drawn; guesses are made against this
    pub view: SessionView,
    pub cursor: usize,
    pub history: Vec<GameRecord>,
    history_stale: bool,
}

impl App {
    pub fn new(
        config: Config,
        store: Box<dyn BestScoreStore>,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        let session = GameSession::new(config, store, rng, TimerQueue::new())?;
        let view = session.view();
        Ok(Self {
            session,
            view,
            cursor: 0,
            history: Vec::new(),
            history_stale: true,
        })
    }

    pub fn advance(&mut self, elapsed: Duration) {
        self.session.advance(elapsed);
    }

    /// Take a fresh snapshot for the next frame
    pub fn refresh(&mut self) {
        self.view = self.session.view();
        match self.view.phase {
            Phase::Finished if self.history_stale => {
                self.history = self
                    .session
                    .store()
                    .recent_games(HISTORY_LEN)
                    .unwrap_or_else(|e| {
                        warn!(error = %e, "could not load game history");
                        Vec::new()
                    });
                self.history_stale = false;
            }
            Phase::Playing => self.history_stale = true,
            Phase::Finished => {}
        }
        self.cursor = self.cursor.min(self.view.options.len().saturating_sub(1));
    }

    pub fn on_intent(&mut self, intent: Intent) -> Flow {
        match (intent, self.view.phase) {
            (Intent::Quit, _) => return Flow::Quit,
            (Intent::Restart, _) | (Intent::Confirm, Phase::Finished) => self.restart(),
            (Intent::Guess(idx), Phase::Playing) => {
                if idx < self.view.options.len() {
                    self.cursor = idx;
                    self.pick(idx);
                }
            }
            (Intent::Confirm, Phase::Playing) => self.pick(self.cursor),
            (Intent::Move(dir), Phase::Playing) => self.move_cursor(dir),
            (Intent::Guess(_) | Intent::Move(_), Phase::Finished) => {}
        }
        Flow::Continue
    }

    fn move_cursor(&mut self, dir: Move) {
        let columns = ui::OPTION_COLUMNS;
        let last = self.view.options.len().saturating_sub(1);
        self.cursor = match dir {
            Move::Left => self.cursor.saturating_sub(1),
            Move::Right => (self.cursor + 1).min(last),
            Move::Up => self.cursor.saturating_sub(columns),
            Move::Down if self.cursor + columns <= last => self.cursor + columns,
            Move::Down => self.cursor,
        };
    }

    fn pick(&mut self, idx: usize) {
        if let Some(&color) = self.view.options.get(idx) {
            self.session.guess_in_round(self.view.round_index, color);
        }
    }

    fn restart(&mut self) {
        self.session.restart();
        self.cursor = 0;
    }
}

/// Log to a file; the terminal belongs to the game
fn init_logging(path: Option<PathBuf>) -> Option<WorkerGuard> {
    let path = path.or_else(AppDirs::log_path)?;
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = path.file_name()?.to_owned();
    std::fs::create_dir_all(&dir).ok()?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;
    Some(guard)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.log_file.clone());

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = FileConfigStore::new();
    let config = cli.apply(config_store.load());
    let store = cli.open_store();
    let rng = cli
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let mut app = match App::new(config.clone(), store, rng) {
        Ok(app) => app,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::ValueValidation, e).exit();
        }
    };
    if cli.save_config {
        config_store.save(&config)?;
        info!(path = %config_store.path().display(), "saved config");
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(
        TerminalInput::new(),
        WallClock::new(Duration::from_millis(FRAME_RATE_MS)),
    );

    loop {
        app.refresh();
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let step = runner.step();
        app.advance(step.elapsed);
        if let Some(intent) = step.intent {
            if app.on_intent(intent) == Flow::Quit {
                break;
            }
        }
    }

    Ok(())
}
