use std::time::Duration;

/// Smallest repeat interval accepted, so a repeating entry can never stall `next_due`
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Handle for a scheduled event, used to cancel it or to recognise it when it fires
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub(crate) u64);

/// What the session asked to be woken up for
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum ScheduledEvent {
    Tick,
    ResolveRound,
    ClearFeedback,
}

/// An event whose due time has been reached
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fired {
    pub token: TimerToken,
    pub event: ScheduledEvent,
    pub at: Duration,
}

/// Scheduling capability handed to the game session.
///
/// Time only moves through `advance`; due events are then drained one at a
/// time with `next_due`, so a cancellation made while handling one event
/// applies to the events queued behind it.
pub trait Scheduler {
    fn schedule_repeating(&mut self, interval: Duration, event: ScheduledEvent) -> TimerToken;
    fn schedule_once(&mut self, delay: Duration, event: ScheduledEvent) -> TimerToken;
    /// Returns false if the token was unknown or already spent
    fn cancel(&mut self, token: TimerToken) -> bool;
    fn advance(&mut self, elapsed: Duration);
    fn next_due(&mut self) -> Option<Fired>;
}

#[derive(Debug, Clone)]
struct Entry {
    token: TimerToken,
    due: Duration,
    interval: Option<Duration>,
    event: ScheduledEvent,
}

/// Virtual-clock scheduler. The live event loop feeds it wall time, tests feed
/// it whatever they like.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    horizon: Duration,
    next_id: u64,
    entries: Vec<Entry>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time of the most recently fired event, or of the horizon once drained
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn active_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of pending entries for a given event kind
    pub fn count_of(&self, event: ScheduledEvent) -> usize {
        self.entries.iter().filter(|e| e.event == event).count()
    }

    fn push(
        &mut self,
        delay: Duration,
        interval: Option<Duration>,
        event: ScheduledEvent,
    ) -> TimerToken {
        self.next_id += 1;
        let token = TimerToken(self.next_id);
        self.entries.push(Entry {
            token,
            due: self.now + delay,
            interval,
            event,
        });
        token
    }
}

impl Scheduler for TimerQueue {
    fn schedule_repeating(&mut self, interval: Duration, event: ScheduledEvent) -> TimerToken {
        let interval = interval.max(MIN_INTERVAL);
        self.push(interval, Some(interval), event)
    }

    fn schedule_once(&mut self, delay: Duration, event: ScheduledEvent) -> TimerToken {
        self.push(delay, None, event)
    }

    fn cancel(&mut self, token: TimerToken) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.token != token);
        before != self.entries.len()
    }

    fn advance(&mut self, elapsed: Duration) {
        self.horizon = self.horizon.max(self.now) + elapsed;
    }

    fn next_due(&mut self) -> Option<Fired> {
        // earliest due first, ties broken by scheduling order
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= self.horizon)
            .min_by_key(|(_, e)| (e.due, e.token))
            .map(|(idx, _)| idx);

        let Some(idx) = idx else {
            self.now = self.horizon;
            return None;
        };

        let entry = &self.entries[idx];
        let fired = Fired {
            token: entry.token,
            event: entry.event,
            at: entry.due,
        };
        let interval = entry.interval;
        self.now = fired.at;

        match interval {
            Some(interval) => self.entries[idx].due += interval,
            None => {
                self.entries.remove(idx);
            }
        }

        Some(fired)
    }
}
