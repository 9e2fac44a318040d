use chrono::{DateTime, Local};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{info, warn};

/// Key under which the best score is persisted
pub const BEST_SCORE_KEY: &str = "bestScore";
pub const SCORE_INCREMENT: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("score database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("could not prepare score storage: {0}")]
    Io(#[from] std::io::Error),
}

/// A finished game, as kept in the history
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub score: u32,
    pub rounds: u32,
    pub correct: u32,
    pub wrong: u32,
    pub timeouts: u32,
    pub finished_at: DateTime<Local>,
}

/// Persistence collaborator for the best score.
///
/// Durability is the implementor's concern. `get_best` returns `None` for a
/// missing or unreadable value; callers treat that as zero.
pub trait BestScoreStore {
    fn get_best(&self) -> Option<u32>;
    fn set_best(&self, best: u32) -> Result<(), StoreError>;

    fn record_game(&self, _record: &GameRecord) -> Result<(), StoreError> {
        Ok(())
    }

    /// Most recent games first
    fn recent_games(&self, _limit: usize) -> Result<Vec<GameRecord>, StoreError> {
        Ok(Vec::new())
    }
}

impl<S: BestScoreStore + ?Sized> BestScoreStore for Box<S> {
    fn get_best(&self) -> Option<u32> {
        (**self).get_best()
    }

    fn set_best(&self, best: u32) -> Result<(), StoreError> {
        (**self).set_best(best)
    }

    fn record_game(&self, record: &GameRecord) -> Result<(), StoreError> {
        (**self).record_game(record)
    }

    fn recent_games(&self, limit: usize) -> Result<Vec<GameRecord>, StoreError> {
        (**self).recent_games(limit)
    }
}

impl<S: BestScoreStore + ?Sized> BestScoreStore for Rc<S> {
    fn get_best(&self) -> Option<u32> {
        (**self).get_best()
    }

    fn set_best(&self, best: u32) -> Result<(), StoreError> {
        (**self).set_best(best)
    }

    fn record_game(&self, record: &GameRecord) -> Result<(), StoreError> {
        (**self).record_game(record)
    }

    fn recent_games(&self, limit: usize) -> Result<Vec<GameRecord>, StoreError> {
        (**self).recent_games(limit)
    }
}

/// In-process store. Keeps the raw stored text so unreadable values behave
/// the same way they do on disk, and remembers every write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    raw_best: RefCell<Option<String>>,
    writes: RefCell<Vec<u32>>,
    games: RefCell<Vec<GameRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_best(best: u32) -> Self {
        Self::with_raw(best.to_string())
    }

    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw_best: RefCell::new(Some(raw.into())),
            ..Self::default()
        }
    }

    /// Every value passed to `set_best`, in order
    pub fn writes(&self) -> Vec<u32> {
        self.writes.borrow().clone()
    }

    pub fn games(&self) -> Vec<GameRecord> {
        self.games.borrow().clone()
    }
}

impl BestScoreStore for MemoryStore {
    fn get_best(&self) -> Option<u32> {
        self.raw_best.borrow().as_deref()?.trim().parse().ok()
    }

    fn set_best(&self, best: u32) -> Result<(), StoreError> {
        *self.raw_best.borrow_mut() = Some(best.to_string());
        self.writes.borrow_mut().push(best);
        Ok(())
    }

    fn record_game(&self, record: &GameRecord) -> Result<(), StoreError> {
        self.games.borrow_mut().push(record.clone());
        Ok(())
    }

    fn recent_games(&self, limit: usize) -> Result<Vec<GameRecord>, StoreError> {
        Ok(self.games.borrow().iter().rev().take(limit).cloned().collect())
    }
}

/// Session score plus the best score ever reached
#[derive(Debug)]
pub struct ScoreTracker<S: BestScoreStore> {
    score: u32,
    best: u32,
    store: S,
}

impl<S: BestScoreStore> ScoreTracker<S> {
    pub fn new(store: S) -> Self {
        let best = store.get_best().unwrap_or(0);
        Self {
            score: 0,
            best,
            store,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best(&self) -> u32 {
        self.best
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Add the increment and persist a new best if it was beaten
    pub fn record_correct_guess(&mut self) -> u32 {
        self.score += SCORE_INCREMENT;
        if self.score > self.best {
            self.best = self.score;
            match self.store.set_best(self.best) {
                Ok(()) => info!(best = self.best, "new best score"),
                // the in-memory best still advances; only durability is lost
                Err(e) => warn!(best = self.best, error = %e, "failed to persist best score"),
            }
        }
        self.score
    }

    pub fn record_wrong_or_timeout(&mut self) -> u32 {
        self.score
    }

    /// Start a new session; the best score is kept
    pub fn reset(&mut self) {
        self.score = 0;
    }

    pub fn record_game(&self, record: &GameRecord) {
        if let Err(e) = self.store.record_game(record) {
            warn!(error = %e, "failed to record finished game");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStore;

    impl BestScoreStore for FailingStore {
        fn get_best(&self) -> Option<u32> {
            Some(3)
        }

        fn set_best(&self, _best: u32) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("read-only")))
        }
    }

    #[test]
    fn test_loads_best_from_store() {
        let tracker = ScoreTracker::new(MemoryStore::with_best(7));
        assert_eq!(tracker.best(), 7);
        assert_eq!(tracker.score(), 0);
    }

    #[test]
    fn test_missing_or_corrupt_best_is_zero() {
        assert_eq!(ScoreTracker::new(MemoryStore::new()).best(), 0);
        assert_eq!(ScoreTracker::new(MemoryStore::with_raw("NaN")).best(), 0);
        assert_eq!(ScoreTracker::new(MemoryStore::with_raw("-4")).best(), 0);
        assert_eq!(ScoreTracker::new(MemoryStore::with_raw(" 12 ")).best(), 12);
    }

    #[test]
    fn test_correct_guess_persists_new_best() {
        let mut tracker = ScoreTracker::new(MemoryStore::new());
        assert_eq!(tracker.record_correct_guess(), 1);
        assert_eq!(tracker.best(), 1);
        assert_eq!(tracker.store().writes(), vec![1]);
    }

    #[test]
    fn test_no_write_until_best_is_beaten() {
        let mut tracker = ScoreTracker::new(MemoryStore::with_best(2));
        tracker.record_correct_guess();
        tracker.record_correct_guess();
        assert!(tracker.store().writes().is_empty());
        tracker.record_correct_guess();
        assert_eq!(tracker.store().writes(), vec![3]);
    }

    #[test]
    fn test_wrong_or_timeout_leaves_score() {
        let mut tracker = ScoreTracker::new(MemoryStore::new());
        tracker.record_correct_guess();
        assert_eq!(tracker.record_wrong_or_timeout(), 1);
        assert_eq!(tracker.score(), 1);
    }

    #[test]
    fn test_reset_keeps_best() {
        let mut tracker = ScoreTracker::new(MemoryStore::new());
        tracker.record_correct_guess();
        tracker.record_correct_guess();
        tracker.reset();
        assert_eq!(tracker.score(), 0);
        assert_eq!(tracker.best(), 2);
    }

    #[test]
    fn test_failed_persist_still_advances_best() {
        let mut tracker = ScoreTracker::new(FailingStore);
        for _ in 0..4 {
            tracker.record_correct_guess();
        }
        assert_eq!(tracker.best(), 4);
    }

    #[test]
    fn test_memory_store_recent_games_newest_first() {
        let store = MemoryStore::new();
        for score in 0..3 {
            store
                .record_game(&GameRecord {
                    score,
                    rounds: 5,
                    correct: score,
                    wrong: 0,
                    timeouts: 5 - score,
                    finished_at: Local::now(),
                })
                .unwrap();
        }
        let recent: Vec<u32> = store.recent_games(2).unwrap().iter().map(|g| g.score).collect();
        assert_eq!(recent, vec![2, 1]);
    }
}
