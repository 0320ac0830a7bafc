//! Per-question countdown.
//!
//! `Countdown` is the synchronous clock: one decrement per tick, fires its
//! time-up signal exactly once at zero, never goes negative.
//! `spawn_question_timer` drives it from a detached tokio task and delivers
//! the expiry into the game state as a regular action.

use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Countdown {
    initial: u32,
    remaining: u32,
    running: bool,
    fired: bool,
}

impl Countdown {
    pub fn new(initial_seconds: u32) -> Self {
        Self {
            initial: initial_seconds,
            remaining: initial_seconds,
            running: false,
            fired: false,
        }
    }

    /// Begin (or resume) decrementing
    pub fn start(&mut self) {
        if !self.fired {
            self.running = true;
        }
    }

    /// Pause without resetting the remaining time
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Restore the configured initial duration and arm the expiry again
    pub fn reset(&mut self) {
        self.remaining = self.initial;
        self.fired = false;
    }

    /// Advance the clock by one second.
    /// Returns true exactly once, on the tick that reaches zero; the countdown
    /// stops itself at that point.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        if self.remaining > 0 {
            self.remaining -= 1;
        }
        if self.remaining == 0 && !self.fired {
            self.fired = true;
            self.running = false;
            return true;
        }
        false
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// Spawn a background task that ticks the current question's countdown once
/// per second and applies the time-up action when it expires.
///
/// `generation` identifies the question this task belongs to; if the game has
/// moved on (answered, advanced, restarted, quit) the task exits without
/// touching anything.
pub fn spawn_question_timer(state: Arc<AppState>, generation: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        // The first interval tick completes immediately; skip it so the first
        // decrement lands a full second after the question is shown.
        interval.tick().await;

        loop {
            interval.tick().await;

            let mut game = state.game.write().await;
            let Some(ref mut g) = *game else {
                break;
            };
            if g.timer_generation != generation || !g.is_awaiting_answer() {
                break;
            }

            if g.countdown.tick() {
                match g.time_up() {
                    Ok(()) => tracing::info!(game_id = %g.id, "Question timer expired"),
                    Err(e) => tracing::warn!("Timer expiry not applied: {}", e),
                }
                break;
            }
        }
    });
}
