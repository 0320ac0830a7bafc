//! Shared application state.
//!
//! `AppState` wraps the synchronous game machine behind one `RwLock` and owns
//! the I/O around it: fetching question batches, persisting scores, spawning
//! the per-question timer task. Every mutation goes through the same lock, so
//! timer expiry, user actions and fetch completion keep single-writer
//! semantics.

use crate::game::{GameError, GameState, LifelineOutcome};
use crate::leaderboard::{LeaderboardError, LeaderboardStore, ScoreEntry};
use crate::llm::{QuestionError, QuestionRequest, QuestionSource};
use crate::protocol::GameSnapshot;
use crate::timer::spawn_question_timer;
use crate::types::{GameConfig, GameMode, Lifeline};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Errors surfaced by state-level operations
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Questions(#[from] QuestionError),

    #[error(transparent)]
    Leaderboard(#[from] LeaderboardError),
}

/// Shared application state
pub struct AppState {
    pub game: RwLock<Option<GameState>>,
    pub source: Option<QuestionSource>,
    pub store: LeaderboardStore,
    pub config: GameConfig,
    /// Monotonic counter handing out timer generations across games
    timer_epoch: AtomicU64,
    /// Default timeout/max-tokens for question fetches
    pub fetch_timeout: std::time::Duration,
    pub fetch_max_tokens: u32,
}

impl AppState {
    pub fn new(store: LeaderboardStore, config: GameConfig) -> Self {
        Self {
            game: RwLock::new(None),
            source: None,
            store,
            config,
            timer_epoch: AtomicU64::new(0),
            fetch_timeout: std::time::Duration::from_secs(60),
            fetch_max_tokens: 2048,
        }
    }

    pub fn with_source(mut self, source: QuestionSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_fetch_limits(mut self, timeout: std::time::Duration, max_tokens: u32) -> Self {
        self.fetch_timeout = timeout;
        self.fetch_max_tokens = max_tokens;
        self
    }

    fn next_timer_generation(&self) -> u64 {
        self.timer_epoch.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Start a new run: any previous game is discarded, a fresh batch is
    /// fetched, and on success the first question goes live with its timer.
    /// On fetch failure the game is left in `ErrorLoadingQuestions` so the
    /// player can retry.
    pub async fn start_game(
        self: &Arc<Self>,
        mode: GameMode,
        category: String,
    ) -> Result<GameSnapshot, StateError> {
        let loading = GameState::loading(mode, category.clone(), self.config.clone());
        let game_id = loading.id.clone();
        *self.game.write().await = Some(loading);

        let source = match &self.source {
            Some(source) => source,
            None => {
                let mut game = self.game.write().await;
                if let Some(ref mut g) = *game {
                    g.fail_loading();
                }
                tracing::error!("start_game: no question source configured");
                return Err(QuestionError::Config(
                    "no question source configured".to_string(),
                )
                .into());
            }
        };

        let request = QuestionRequest {
            mode,
            category,
            count: self.config.question_count,
            timeout: self.fetch_timeout,
            max_tokens: Some(self.fetch_max_tokens),
        };

        // No lock held across the fetch; the player may quit or restart
        // meanwhile, in which case the batch is dropped.
        let fetched = source.generate(&request).await;

        let mut game = self.game.write().await;
        let Some(ref mut g) = *game else {
            tracing::debug!(game_id = %game_id, "Game discarded during question fetch");
            return Err(GameError::NoGame.into());
        };
        if g.id != game_id {
            tracing::debug!(game_id = %game_id, "Game replaced during question fetch");
            return Err(GameError::NoGame.into());
        }

        match fetched {
            Ok(batch) => {
                g.begin(batch)?;
                g.timer_generation = self.next_timer_generation();
                let generation = g.timer_generation;
                let snapshot = GameSnapshot::from_state(g);
                drop(game);

                spawn_question_timer(self.clone(), generation);
                Ok(snapshot)
            }
            Err(e) => {
                g.fail_loading();
                tracing::error!(game_id = %game_id, "Question fetch failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Lock in an answer for the current question
    pub async fn select_answer(&self, answer: &str) -> Result<GameSnapshot, StateError> {
        let mut game = self.game.write().await;
        let g = game.as_mut().ok_or(GameError::NoGame)?;

        let correct = g.select_answer(answer)?;
        tracing::info!(game_id = %g.id, index = g.current_index, correct, "Answer selected");
        Ok(GameSnapshot::from_state(g))
    }

    /// Move past a revealed answer; restarts the timer when another question
    /// follows.
    pub async fn advance(self: &Arc<Self>) -> Result<GameSnapshot, StateError> {
        let mut game = self.game.write().await;
        let g = game.as_mut().ok_or(GameError::NoGame)?;

        let status = g.advance()?;
        tracing::info!(game_id = %g.id, ?status, index = g.current_index, "Advanced");

        let timer = if g.is_awaiting_answer() {
            g.timer_generation = self.next_timer_generation();
            Some(g.timer_generation)
        } else {
            None
        };
        let snapshot = GameSnapshot::from_state(g);
        drop(game);

        if let Some(generation) = timer {
            spawn_question_timer(self.clone(), generation);
        }
        Ok(snapshot)
    }

    /// Invoke a lifeline on the current question
    pub async fn use_lifeline(
        &self,
        lifeline: Lifeline,
    ) -> Result<(LifelineOutcome, GameSnapshot), StateError> {
        let mut game = self.game.write().await;
        let g = game.as_mut().ok_or(GameError::NoGame)?;

        let mut rng = rand::rng();
        let outcome = g.use_lifeline(lifeline, &mut rng)?;
        tracing::info!(game_id = %g.id, ?lifeline, "Lifeline used");
        Ok((outcome, GameSnapshot::from_state(g)))
    }

    /// Persist the finished run's score under the given name. A write failure
    /// surfaces to the caller; the finished game itself is untouched.
    pub async fn save_score(&self, name: &str) -> Result<ScoreEntry, StateError> {
        let (score, time_taken_ms) = {
            let game = self.game.read().await;
            let g = game.as_ref().ok_or(GameError::NoGame)?;
            g.final_result()?
        };

        let entry = self.store.append(name, score, time_taken_ms).await?;
        Ok(entry)
    }

    /// Current run view, if any
    pub async fn snapshot(&self) -> Option<GameSnapshot> {
        let game = self.game.read().await;
        game.as_ref().map(GameSnapshot::from_state)
    }

    /// Discard the current run (player quit); in-flight work is dropped
    pub async fn quit_game(&self) -> bool {
        let discarded = self.game.write().await.take();
        if let Some(g) = &discarded {
            tracing::info!(game_id = %g.id, "Game quit");
        }
        discarded.is_some()
    }

    /// Top-10 leaderboard
    pub async fn leaderboard(&self) -> Result<Vec<ScoreEntry>, StateError> {
        Ok(self.store.top(10).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GameStatus;

    fn state() -> (tempfile::TempDir, Arc<AppState>) {
        let dir = tempfile::tempdir().unwrap();
        let store = LeaderboardStore::new(dir.path().join("scores.jsonl"));
        let state = Arc::new(AppState::new(store, GameConfig::default()));
        (dir, state)
    }

    #[tokio::test]
    async fn test_start_without_source_enters_error_state() {
        let (_dir, state) = state();

        let result = state
            .start_game(GameMode::Ladder, "history".to_string())
            .await;
        assert!(matches!(
            result,
            Err(StateError::Questions(QuestionError::Config(_)))
        ));

        let snapshot = state.snapshot().await.unwrap();
        assert_eq!(snapshot.status, GameStatus::ErrorLoadingQuestions);
    }

    #[tokio::test]
    async fn test_actions_without_game_fail() {
        let (_dir, state) = state();

        assert!(matches!(
            state.select_answer("x").await,
            Err(StateError::Game(GameError::NoGame))
        ));
        assert!(matches!(
            state.advance().await,
            Err(StateError::Game(GameError::NoGame))
        ));
        assert!(matches!(
            state.save_score("Alice").await,
            Err(StateError::Game(GameError::NoGame))
        ));
        assert!(state.snapshot().await.is_none());
        assert!(!state.quit_game().await);
    }

    #[tokio::test]
    async fn test_timer_generations_are_unique() {
        let (_dir, state) = state();
        let first = state.next_timer_generation();
        let second = state.next_timer_generation();
        assert!(second > first);
    }
}
