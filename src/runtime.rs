use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Cursor movement over the option grid
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Move {
    Left,
    Right,
    Up,
    Down,
}

/// What the player asked for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Pick the option at this 0-based position
    Guess(usize),
    /// Pick the highlighted option, or play again once the game is over
    Confirm,
    Move(Move),
    Restart,
    Quit,
}

impl Intent {
    /// Decode a key press; keys with no meaning in the game give `None`
    pub fn from_key(key: KeyEvent) -> Option<Self> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return (key.code == KeyCode::Char('c')).then_some(Intent::Quit);
        }
        let intent = match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Intent::Quit,
            KeyCode::Char('r') => Intent::Restart,
            KeyCode::Char(c @ '1'..='9') => Intent::Guess(c as usize - '1' as usize),
            KeyCode::Enter | KeyCode::Char(' ') => Intent::Confirm,
            KeyCode::Left => Intent::Move(Move::Left),
            KeyCode::Right => Intent::Move(Move::Right),
            KeyCode::Up => Intent::Move(Move::Up),
            KeyCode::Down => Intent::Move(Move::Down),
            _ => return None,
        };
        Some(intent)
    }
}

/// Where player intents come from
pub trait IntentSource: Send + 'static {
    /// Block for up to `timeout` waiting for the next intent
    fn recv_timeout(&self, timeout: Duration) -> Result<Intent, RecvTimeoutError>;
}

/// Reads the terminal on a background thread and decodes key presses.
///
/// Resizes are not forwarded: the next draw picks up the new size.
pub struct TerminalInput {
    rx: Receiver<Intent>,
}

impl TerminalInput {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                // key releases would double every guess on terminals that report them
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    if let Some(intent) = Intent::from_key(key) {
                        if tx.send(intent).is_err() {
                            break;
                        }
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for TerminalInput {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentSource for TerminalInput {
    fn recv_timeout(&self, timeout: Duration) -> Result<Intent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Intents fed over a channel, for driving a game without a terminal
pub struct ChannelInput {
    rx: Receiver<Intent>,
}

impl ChannelInput {
    pub fn new(rx: Receiver<Intent>) -> Self {
        Self { rx }
    }
}

impl IntentSource for ChannelInput {
    fn recv_timeout(&self, timeout: Duration) -> Result<Intent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Paces the loop and reports how much game time each step covers
pub trait Clock {
    /// Longest a step waits for input before the frame is redrawn
    fn frame(&self) -> Duration;
    /// Time since the previous lap
    fn lap(&mut self) -> Duration;
}

/// Real time
#[derive(Debug)]
pub struct WallClock {
    frame: Duration,
    last: Instant,
}

impl WallClock {
    pub fn new(frame: Duration) -> Self {
        Self {
            frame,
            last: Instant::now(),
        }
    }
}

impl Clock for WallClock {
    fn frame(&self) -> Duration {
        self.frame
    }

    fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last);
        self.last = now;
        elapsed
    }
}

/// Every lap covers the same span, however long the step really took
#[derive(Clone, Copy, Debug)]
pub struct SteppedClock {
    frame: Duration,
    step: Duration,
}

impl SteppedClock {
    pub fn new(frame: Duration, step: Duration) -> Self {
        Self { frame, step }
    }
}

impl Clock for SteppedClock {
    fn frame(&self) -> Duration {
        self.frame
    }

    fn lap(&mut self) -> Duration {
        self.step
    }
}

/// One pass of the game loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    /// Game time to apply before the intent is handled
    pub elapsed: Duration,
    pub intent: Option<Intent>,
}

pub struct Runner<I: IntentSource, C: Clock> {
    input: I,
    clock: C,
}

impl<I: IntentSource, C: Clock> Runner<I, C> {
    pub fn new(input: I, clock: C) -> Self {
        Self { input, clock }
    }

    /// Wait up to one frame for input, then measure the time that went by.
    ///
    /// The lap is taken after the wait so a key pressed as a round runs out
    /// is judged against the state that time produced.
    pub fn step(&mut self) -> Step {
        let intent = match self.input.recv_timeout(self.clock.frame()) {
            Ok(intent) => Some(intent),
            Err(RecvTimeoutError::Timeout) => None,
            // the input thread is gone, nothing can steer the game any more
            Err(RecvTimeoutError::Disconnected) => Some(Intent::Quit),
        };
        Step {
            elapsed: self.clock.lap(),
            intent,
        }
    }
}
