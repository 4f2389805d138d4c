//! Tests for utility functions

use std::time::Duration;

use stress_scheduler::util::{Clock, RandomSource, SimulatedClock, StdRandom, SystemClock};

#[test]
fn test_simulated_clock_shared_between_clones() {
    let clock = SimulatedClock::new();
    let other = clock.clone();
    clock.advance(Duration::from_secs(3));
    assert_eq!(other.now(), Duration::from_secs(3));
    other.sleep_until(Duration::from_secs(10));
    assert_eq!(clock.now(), Duration::from_secs(10));
}

#[test]
fn test_system_clock_starts_near_zero() {
    let clock = SystemClock::new();
    assert!(clock.now() < Duration::from_secs(1));
}

#[test]
fn test_random_draws_cover_range() {
    let mut rng = StdRandom::seeded(99);
    let mut seen = [false; 5];
    for _ in 0..500 {
        let v = rng.int_in(1, 5);
        seen[usize::try_from(v - 1).unwrap()] = true;
    }
    assert!(seen.iter().all(|s| *s));
}

#[test]
fn test_chance_tracks_probability() {
    let mut rng = StdRandom::seeded(5);
    let hits = (0..10_000).filter(|_| rng.chance(0.1)).count();
    assert!((700..1300).contains(&hits), "hits = {hits}");
}

#[test]
fn test_init_tracing_is_idempotent() {
    stress_scheduler::util::init_tracing(0);
    stress_scheduler::util::init_tracing(2);
}
