use crate::color::Color;
use crate::config::{Config, ConfigError};
use crate::distractor::DistractorSet;
use crate::scheduler::{Fired, ScheduledEvent, Scheduler, TimerToken};
use crate::score::{BestScoreStore, GameRecord, ScoreTracker};
use crate::timer::RoundTimer;
use crate::TICK_DELTA_TENTHS;
use chrono::Local;
use rand::Rng;
use tracing::{debug, info, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Playing,
    Finished,
}

/// Message shown after a round resolves
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Feedback {
    Correct,
    Wrong,
    Timeout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundStatus {
    /// Accepting a guess, timer running
    Open,
    /// Guessed or timed out; waiting for the next round
    Resolving,
}

#[derive(Clone, Debug)]
pub struct RoundState {
    index: u32,
    target: Color,
    options: DistractorSet,
    timer: RoundTimer,
    status: RoundStatus,
}

impl RoundState {
    /// 1-based
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn target(&self) -> Color {
        self.target
    }

    pub fn options(&self) -> &DistractorSet {
        &self.options
    }

    pub fn timer(&self) -> &RoundTimer {
        &self.timer
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoundTally {
    pub correct: u32,
    pub wrong: u32,
    pub timeouts: u32,
}

impl RoundTally {
    pub fn rounds_played(&self) -> u32 {
        self.correct + self.wrong + self.timeouts
    }
}

/// Everything a renderer needs for one frame
#[derive(Clone, Debug, PartialEq)]
pub struct SessionView {
    pub feedback: Option<Feedback>,
    pub time_remaining: f64,
    pub time_ratio: f64,
    pub round_index: u32,
    pub max_rounds: u32,
    pub score: u32,
    pub best_score: u32,
    pub target: Option<Color>,
    pub options: Vec<Color>,
    pub phase: Phase,
    pub tally: RoundTally,
}

/// The round lifecycle state machine.
///
/// All timing goes through the injected scheduler: one repeating tick while a
/// round is open, a one-shot to resolve the round after guess feedback, and a
/// one-shot to clear feedback once the next round is up. Each kind has at
/// most one live token, and fired events carrying any other token are dropped.
#[derive(Debug)]
pub struct GameSession<S: BestScoreStore, R: Rng, Q: Scheduler> {
    config: Config,
    scores: ScoreTracker<S>,
    rng: R,
    scheduler: Q,
    phase: Phase,
    round: Option<RoundState>,
    feedback: Option<Feedback>,
    tally: RoundTally,
    tick_token: Option<TimerToken>,
    resolve_token: Option<TimerToken>,
    clear_token: Option<TimerToken>,
}

impl<S: BestScoreStore, R: Rng, Q: Scheduler> GameSession<S, R, Q> {
    /// Start a session on round one.
    ///
    /// The config is checked first: a zero-length timer would start every
    /// round already expired, with no tick ever reporting the timeout.
    pub fn new(config: Config, store: S, rng: R, scheduler: Q) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut session = Self {
            config,
            scores: ScoreTracker::new(store),
            rng,
            scheduler,
            phase: Phase::Playing,
            round: None,
            feedback: None,
            tally: RoundTally::default(),
            tick_token: None,
            resolve_token: None,
            clear_token: None,
        };
        session.start_round(1);
        Ok(session)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.feedback
    }

    pub fn score(&self) -> u32 {
        self.scores.score()
    }

    pub fn best_score(&self) -> u32 {
        self.scores.best()
    }

    pub fn tally(&self) -> RoundTally {
        self.tally
    }

    pub fn store(&self) -> &S {
        self.scores.store()
    }

    pub fn scheduler(&self) -> &Q {
        &self.scheduler
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Whether a guess would be accepted right now
    pub fn accepts_guess(&self) -> bool {
        self.phase == Phase::Playing
            && self
                .round
                .as_ref()
                .is_some_and(|r| r.status == RoundStatus::Open && !r.timer.is_expired())
    }

    pub fn view(&self) -> SessionView {
        let round = self.round.as_ref();
        SessionView {
            feedback: self.feedback,
            time_remaining: round.map_or(0.0, |r| r.timer.remaining()),
            time_ratio: round.map_or(0.0, |r| r.timer.ratio()),
            round_index: round.map_or(self.tally.rounds_played(), |r| r.index),
            max_rounds: self.config.max_rounds,
            score: self.scores.score(),
            best_score: self.scores.best(),
            target: round.map(|r| r.target),
            options: round.map_or_else(Vec::new, |r| r.options.as_slice().to_vec()),
            phase: self.phase,
            tally: self.tally,
        }
    }

    /// Move the scheduler forward and handle every event that came due
    pub fn advance(&mut self, elapsed: std::time::Duration) {
        self.scheduler.advance(elapsed);
        while let Some(fired) = self.scheduler.next_due() {
            self.handle(fired);
        }
    }

    /// Route a fired event, dropping any whose token is no longer current
    pub fn handle(&mut self, fired: Fired) {
        match fired.event {
            ScheduledEvent::Tick if self.tick_token == Some(fired.token) => self.tick(),
            ScheduledEvent::ResolveRound if self.resolve_token == Some(fired.token) => {
                self.resolve_token = None;
                self.resolve_round();
            }
            ScheduledEvent::ClearFeedback if self.clear_token == Some(fired.token) => {
                self.clear_token = None;
                self.feedback = None;
            }
            event => trace!(%event, token = ?fired.token, "dropping stale event"),
        }
    }

    /// One timer interval. Expiry shows Timeout and resolves the round at once.
    pub fn tick(&mut self) {
        if self.phase != Phase::Playing {
            return;
        }
        let expired = match self.round.as_mut() {
            Some(round) if round.status == RoundStatus::Open => {
                if round.timer.tick(TICK_DELTA_TENTHS) {
                    round.status = RoundStatus::Resolving;
                    true
                } else {
                    false
                }
            }
            _ => return,
        };

        if expired {
            debug!(round = self.round_index(), "round timed out");
            self.cancel_tick();
            self.show_feedback(Feedback::Timeout);
            self.tally.timeouts += 1;
            self.scores.record_wrong_or_timeout();
            self.resolve_round();
        }
    }

    /// Judge a guess for the open round.
    ///
    /// Returns `None` when the guess is ignored: the session is finished, the
    /// round is already resolving, or its timer has run out.
    pub fn guess(&mut self, selected: Color) -> Option<Feedback> {
        if !self.accepts_guess() {
            trace!(%selected, "ignoring guess");
            return None;
        }
        let round = self.round.as_mut()?;
        round.status = RoundStatus::Resolving;

        let feedback = if selected == round.target {
            Feedback::Correct
        } else {
            Feedback::Wrong
        };
        debug!(round = round.index, %selected, target = %round.target, %feedback, "guess");

        match feedback {
            Feedback::Correct => {
                self.tally.correct += 1;
                self.scores.record_correct_guess();
            }
            _ => {
                self.tally.wrong += 1;
                self.scores.record_wrong_or_timeout();
            }
        }

        self.cancel_tick();
        self.show_feedback(feedback);
        self.cancel(self.resolve_token);
        self.resolve_token = Some(
            self.scheduler
                .schedule_once(self.config.feedback_delay(), ScheduledEvent::ResolveRound),
        );
        Some(feedback)
    }

    /// Guess made against a specific round, as the player saw it.
    ///
    /// If that round already resolved (its timer ran out between the frame
    /// being drawn and the key press) the guess is ignored rather than being
    /// applied to the round that replaced it.
    pub fn guess_in_round(&mut self, round_index: u32, selected: Color) -> Option<Feedback> {
        if self.round_index() != round_index {
            trace!(round_index, current = self.round_index(), "guess for a past round");
            return None;
        }
        self.guess(selected)
    }

    /// Guess by position in the option list
    pub fn guess_index(&mut self, idx: usize) -> Option<Feedback> {
        let color = self.round.as_ref()?.options.get(idx)?;
        self.guess(color)
    }

    /// Back to round one with a zero score; the best score is kept
    pub fn restart(&mut self) {
        self.cancel_all();
        self.scores.reset();
        self.feedback = None;
        self.tally = RoundTally::default();
        self.phase = Phase::Playing;
        self.start_round(1);
        info!(best = self.scores.best(), "session restarted");
    }

    fn round_index(&self) -> u32 {
        self.round.as_ref().map_or(0, |r| r.index)
    }

    fn start_round(&mut self, index: u32) {
        let target = Color::generate(&mut self.rng);
        let options = DistractorSet::build(target, self.config.option_count, &mut self.rng);
        self.round = Some(RoundState {
            index,
            target,
            options,
            timer: RoundTimer::new(self.config.initial_timer),
            status: RoundStatus::Open,
        });

        self.cancel_tick();
        self.tick_token = Some(
            self.scheduler
                .schedule_repeating(self.config.tick_interval(), ScheduledEvent::Tick),
        );
        debug!(round = index, %target, "round started");
    }

    fn resolve_round(&mut self) {
        self.cancel_tick();
        let index = self.round_index();
        if index < self.config.max_rounds {
            self.start_round(index + 1);
            self.cancel(self.clear_token);
            self.clear_token = Some(
                self.scheduler
                    .schedule_once(self.config.feedback_delay(), ScheduledEvent::ClearFeedback),
            );
        } else {
            self.finish();
        }
    }

    fn finish(&mut self) {
        self.cancel_all();
        self.phase = Phase::Finished;
        self.round = None;

        let record = GameRecord {
            score: self.scores.score(),
            rounds: self.tally.rounds_played(),
            correct: self.tally.correct,
            wrong: self.tally.wrong,
            timeouts: self.tally.timeouts,
            finished_at: Local::now(),
        };
        self.scores.record_game(&record);
        info!(
            score = record.score,
            best = self.scores.best(),
            correct = record.correct,
            wrong = record.wrong,
            timeouts = record.timeouts,
            "game finished"
        );
    }

    /// New feedback replaces whatever a pending clear was going to remove
    fn show_feedback(&mut self, feedback: Feedback) {
        self.cancel(self.clear_token);
        self.clear_token = None;
        self.feedback = Some(feedback);
    }

    fn cancel(&mut self, token: Option<TimerToken>) {
        if let Some(token) = token {
            self.scheduler.cancel(token);
        }
    }

    fn cancel_tick(&mut self) {
        let token = self.tick_token.take();
        self.cancel(token);
    }

    fn cancel_all(&mut self) {
        self.cancel_tick();
        let resolve = self.resolve_token.take();
        self.cancel(resolve);
        let clear = self.clear_token.take();
        self.cancel(clear);
    }
}
