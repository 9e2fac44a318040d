use std::rc::Rc;
use std::time::Duration;

use assert_matches::assert_matches;
use rand::rngs::StdRng;
use rand::SeedableRng;
use swatch::game::RoundStatus;
use swatch::scheduler::{ScheduledEvent, TimerQueue};
use swatch::score::MemoryStore;
use swatch::{Color, Config, Feedback, GameSession, Phase};

/// End-to-end round lifecycle scenarios, driven on a virtual clock.

type Session = GameSession<Rc<MemoryStore>, StdRng, TimerQueue>;

fn new_session(store: &Rc<MemoryStore>, seed: u64) -> Session {
    GameSession::new(
        Config::default(),
        Rc::clone(store),
        StdRng::seed_from_u64(seed),
        TimerQueue::new(),
    )
    .expect("default config is valid")
}

fn target(s: &Session) -> Color {
    s.round().expect("round in progress").target()
}

fn guess_right_and_wait(s: &mut Session) {
    let t = target(s);
    assert_matches!(s.guess(t), Some(Feedback::Correct));
    s.advance(Duration::from_millis(1000));
}

#[test]
fn first_correct_guess_sets_and_persists_best() {
    let store = Rc::new(MemoryStore::new());
    let mut s = new_session(&store, 1);

    assert_eq!(s.round().unwrap().timer().remaining(), 40.0);
    let t = target(&s);
    s.guess(t);

    assert_eq!(s.score(), 1);
    assert_eq!(s.best_score(), 1);
    assert_eq!(store.writes(), vec![1]);
}

#[test]
fn five_correct_guesses_finish_the_game() {
    let store = Rc::new(MemoryStore::new());
    let mut s = new_session(&store, 2);

    for _ in 0..5 {
        guess_right_and_wait(&mut s);
    }

    assert_eq!(s.score(), 5);
    assert_eq!(s.phase(), Phase::Finished);
    assert!(s.round().is_none());
    assert_eq!(s.tally().rounds_played(), 5);

    // no sixth round appears however long we wait
    s.advance(Duration::from_secs(60));
    assert_eq!(s.phase(), Phase::Finished);
    assert!(s.round().is_none());
    assert_eq!(s.scheduler().active_count(), 0);
    assert_eq!(store.writes(), vec![1, 2, 3, 4, 5]);
    assert_eq!(store.games().len(), 1);
}

#[test]
fn countdown_to_zero_times_out_once() {
    let store = Rc::new(MemoryStore::new());
    let mut s = new_session(&store, 3);

    // 400 ticks of 10ms take 40 units to zero
    for _ in 0..399 {
        s.advance(Duration::from_millis(10));
        assert_eq!(s.round().unwrap().index(), 1);
    }
    s.advance(Duration::from_millis(10));

    assert_eq!(s.feedback(), Some(Feedback::Timeout));
    assert_eq!(s.tally().timeouts, 1);
    assert_eq!(s.round().unwrap().index(), 2);
    assert_eq!(s.score(), 0);
    assert!(store.writes().is_empty());

    // feedback clears after the display delay, with the new round running
    s.advance(Duration::from_millis(1000));
    assert_eq!(s.feedback(), None);
    assert_eq!(s.round().unwrap().index(), 2);
    assert_eq!(s.tally().timeouts, 1);
}

#[test]
fn restart_mid_round_three_keeps_best() {
    let store = Rc::new(MemoryStore::new());
    let mut s = new_session(&store, 4);

    guess_right_and_wait(&mut s);
    guess_right_and_wait(&mut s);
    assert_eq!(s.round().unwrap().index(), 3);
    assert_eq!(s.score(), 2);

    s.restart();

    assert_eq!(s.round().unwrap().index(), 1);
    assert_eq!(s.score(), 0);
    assert_eq!(s.phase(), Phase::Playing);
    assert_eq!(s.best_score(), 2);
    assert_eq!(s.feedback(), None);
}

#[test]
fn restart_twice_equals_restart_once() {
    let store = Rc::new(MemoryStore::new());
    let mut s = new_session(&store, 5);
    let t = target(&s);
    s.guess(t);

    s.restart();
    let once = (s.round().unwrap().index(), s.score(), s.phase(), s.feedback());
    s.restart();
    let twice = (s.round().unwrap().index(), s.score(), s.phase(), s.feedback());

    assert_eq!(once, twice);
    assert_eq!(s.scheduler().active_count(), 1);
    assert_eq!(s.scheduler().count_of(ScheduledEvent::Tick), 1);

    // the resolution scheduled before the restarts never fires
    s.advance(Duration::from_millis(1500));
    assert_eq!(s.round().unwrap().index(), 1);
}

#[test]
fn restart_while_resolving_drops_pending_advance() {
    let store = Rc::new(MemoryStore::new());
    let mut s = new_session(&store, 6);
    let t = target(&s);
    s.guess(t);
    s.advance(Duration::from_millis(500));
    s.restart();
    s.advance(Duration::from_millis(600));

    assert_eq!(s.round().unwrap().index(), 1);
    assert_eq!(s.round().unwrap().status(), RoundStatus::Open);
}

#[test]
fn restart_after_finish_plays_again() {
    let store = Rc::new(MemoryStore::new());
    let mut s = new_session(&store, 7);
    for _ in 0..5 {
        guess_right_and_wait(&mut s);
    }
    s.restart();
    assert_eq!(s.phase(), Phase::Playing);
    assert_eq!(s.best_score(), 5);

    for _ in 0..5 {
        guess_right_and_wait(&mut s);
    }
    // equalling the best does not rewrite it
    assert_eq!(store.writes(), vec![1, 2, 3, 4, 5]);
    assert_eq!(store.games().len(), 2);
}

#[test]
fn only_one_tick_per_round_ever() {
    let store = Rc::new(MemoryStore::new());
    let mut s = new_session(&store, 8);
    let mut step = 0u32;
    while !s.is_finished() {
        assert!(s.scheduler().count_of(ScheduledEvent::Tick) <= 1);
        if step % 3 == 0 && s.accepts_guess() {
            let t = target(&s);
            s.guess(t);
        }
        s.advance(Duration::from_millis(7));
        step += 1;
    }
    assert_eq!(s.tally().rounds_played(), 5);
}

#[test]
fn best_score_carries_across_sessions() {
    let store = Rc::new(MemoryStore::new());
    {
        let mut s = new_session(&store, 9);
        guess_right_and_wait(&mut s);
        guess_right_and_wait(&mut s);
    }
    let s = new_session(&store, 10);
    assert_eq!(s.best_score(), 2);
    assert_eq!(s.score(), 0);
}

#[test]
fn wrong_guesses_and_timeouts_mix() {
    let store = Rc::new(MemoryStore::new());
    let mut s = new_session(&store, 11);

    let t = target(&s);
    let wrong = *s
        .round()
        .unwrap()
        .options()
        .iter()
        .find(|c| **c != t)
        .unwrap();
    assert_matches!(s.guess(wrong), Some(Feedback::Wrong));
    s.advance(Duration::from_millis(1000));

    s.advance(Duration::from_millis(4000));
    assert_eq!(s.feedback(), Some(Feedback::Timeout));

    guess_right_and_wait(&mut s);
    let tally = s.tally();
    assert_eq!((tally.wrong, tally.timeouts, tally.correct), (1, 1, 1));
    assert_eq!(s.score(), 1);
    assert_eq!(s.round().unwrap().index(), 4);
}

#[test]
fn shortest_timer_still_times_out_and_moves_on() {
    let store = Rc::new(MemoryStore::new());
    let config = Config {
        initial_timer: 1,
        ..Config::default()
    };
    let mut s = GameSession::new(
        config,
        Rc::clone(&store),
        StdRng::seed_from_u64(12),
        TimerQueue::new(),
    )
    .expect("one unit is a valid timer");

    // one unit is ten ticks
    s.advance(Duration::from_millis(100));
    assert_eq!(s.feedback(), Some(Feedback::Timeout));
    assert_eq!(s.round().unwrap().index(), 2);

    s.advance(Duration::from_secs(600));
    assert_eq!(s.phase(), Phase::Finished);
    assert_eq!(s.tally().timeouts, 5);
    assert_eq!(s.scheduler().active_count(), 0);
}
