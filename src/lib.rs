// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod color;
pub mod config;
pub mod distractor;
pub mod game;
pub mod runtime;
pub mod scheduler;
pub mod score;
pub mod stats;
pub mod timer;

pub use color::Color;
pub use config::Config;
pub use game::{Feedback, GameSession, Phase, SessionView};

/// Countdown per round, in time units
pub const INITIAL_TIMER: u32 = 40;
pub const MAX_ROUNDS: u32 = 5;
pub const OPTION_COUNT: usize = 6;
/// Wall time between timer ticks
pub const TICK_INTERVAL_MS: u64 = 10;
/// Each tick takes 0.1 time units off the countdown
pub const TICK_DELTA_TENTHS: u32 = 1;
/// How long round feedback stays up before moving on / clearing
pub const FEEDBACK_DELAY_MS: u64 = 1000;
