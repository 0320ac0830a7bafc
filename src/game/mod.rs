//! The quiz state machine.
//!
//! `GameState` owns one run: question progression, scoring, lifeline usage
//! and answer reveal. It is synchronous and does no I/O; every UI or network
//! event (answer click, timer expiry, fetched batch) arrives as a method
//! call, so the surrounding service can keep single-writer semantics with one
//! lock and test the machine in isolation.

mod lifelines;

use crate::timer::Countdown;
use crate::types::*;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

/// Result type for game actions
pub type GameResult<T> = Result<T, GameError>;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("no game in progress")]
    NoGame,

    #[error("action '{action}' is not valid while the game is {status:?}")]
    InvalidStatus {
        action: &'static str,
        status: GameStatus,
    },

    #[error("'{0}' is not one of the displayed answers")]
    UnknownAnswer(String),

    #[error("the {0:?} lifeline has already been used this run")]
    LifelineUsed(Lifeline),

    #[error("the question batch is empty")]
    EmptyBatch,

    #[error("score can only be saved once the game has finished")]
    NotFinished,
}

/// Outcome of invoking a lifeline, one variant per kind
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifelineOutcome {
    FiftyFifty { remaining: Vec<AnswerOption> },
    PhoneAFriend { suggestion: String },
    AudiencePoll { results: Vec<PollResult> },
}

/// State of a single run, from question fetch to a terminal screen
#[derive(Debug, Clone)]
pub struct GameState {
    pub id: GameId,
    pub mode: GameMode,
    pub category: String,
    pub status: GameStatus,
    pub config: GameConfig,
    questions: Vec<Question>,
    pub current_index: usize,
    pub score: u32,
    pub selected_answer: Option<AnswerOption>,
    pub answer_revealed: bool,
    pub lifelines: LifelineUsage,
    pub audience_poll: Option<Vec<PollResult>>,
    pub displayed_answers: Vec<AnswerOption>,
    pub countdown: Countdown,
    /// Identity of the countdown task driving the current question; bumped by
    /// the service layer whenever a new question starts so stale timers are
    /// discarded.
    pub timer_generation: u64,
    started_at: DateTime<Utc>,
    time_taken_ms: Option<u64>,
}

impl GameState {
    /// A run that is waiting for its question batch
    pub fn loading(mode: GameMode, category: String, config: GameConfig) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            mode,
            category,
            status: GameStatus::LoadingQuestions,
            countdown: Countdown::new(config.timer_seconds),
            config,
            questions: Vec::new(),
            current_index: 0,
            score: 0,
            selected_answer: None,
            answer_revealed: false,
            lifelines: LifelineUsage::default(),
            audience_poll: None,
            displayed_answers: Vec::new(),
            timer_generation: 0,
            started_at: Utc::now(),
            time_taken_ms: None,
        }
    }

    /// Enter `Playing` with a freshly fetched batch
    pub fn begin(&mut self, questions: Vec<Question>) -> GameResult<()> {
        self.require_status(GameStatus::LoadingQuestions, "begin")?;
        if questions.is_empty() {
            self.status = GameStatus::ErrorLoadingQuestions;
            return Err(GameError::EmptyBatch);
        }

        self.displayed_answers = questions[0].answers.clone();
        self.questions = questions;
        self.current_index = 0;
        self.score = 0;
        self.status = GameStatus::Playing;
        self.started_at = Utc::now();
        self.countdown.reset();
        self.countdown.start();
        Ok(())
    }

    /// Record a question-source failure; the player may retry with a new game
    pub fn fail_loading(&mut self) {
        if self.status == GameStatus::LoadingQuestions {
            self.status = GameStatus::ErrorLoadingQuestions;
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Whether a question is on screen and still open (timer should run)
    pub fn is_awaiting_answer(&self) -> bool {
        self.status == GameStatus::Playing && !self.answer_revealed
    }

    /// Milliseconds from first question to the terminal state; None until finished
    pub fn time_taken_ms(&self) -> Option<u64> {
        self.time_taken_ms
    }

    /// Lock in the player's choice, reveal correctness, credit the tier prize.
    /// Returns whether the selection was correct.
    pub fn select_answer(&mut self, answer_text: &str) -> GameResult<bool> {
        self.require_status(GameStatus::Playing, "select_answer")?;

        let answer = self
            .displayed_answers
            .iter()
            .find(|a| a.text == answer_text)
            .cloned()
            .ok_or_else(|| GameError::UnknownAnswer(answer_text.to_string()))?;

        let correct = answer.is_correct;
        if correct {
            self.score += prize_for_tier(self.current_index);
        }
        self.selected_answer = Some(answer);
        self.answer_revealed = true;
        self.status = GameStatus::Answered;
        self.countdown.stop();
        Ok(correct)
    }

    /// Timer expiry: equivalent to selecting no answer, no credit
    pub fn time_up(&mut self) -> GameResult<()> {
        self.require_status(GameStatus::Playing, "time_up")?;

        self.selected_answer = None;
        self.answer_revealed = true;
        self.status = GameStatus::Answered;
        self.countdown.stop();
        Ok(())
    }

    /// Move on from a revealed answer: next question, or a terminal state.
    /// Returns the resulting status.
    pub fn advance(&mut self) -> GameResult<GameStatus> {
        self.require_status(GameStatus::Answered, "advance")?;

        let answered_correctly = self
            .selected_answer
            .as_ref()
            .map(|a| a.is_correct)
            .unwrap_or(false);

        if !answered_correctly && self.mode.eliminates_on_miss() {
            self.finish(GameStatus::GameOver);
        } else if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            self.selected_answer = None;
            self.answer_revealed = false;
            self.audience_poll = None;
            self.displayed_answers = self.questions[self.current_index].answers.clone();
            self.status = GameStatus::Playing;
            self.countdown.reset();
            self.countdown.start();
        } else {
            self.finish(GameStatus::GameWon);
        }
        Ok(self.status)
    }

    /// Invoke a lifeline. Each kind is usable once per run, only while a
    /// question is open.
    pub fn use_lifeline<R: Rng>(
        &mut self,
        lifeline: Lifeline,
        rng: &mut R,
    ) -> GameResult<LifelineOutcome> {
        self.require_status(GameStatus::Playing, "use_lifeline")?;
        if self.lifelines.is_used(lifeline) {
            return Err(GameError::LifelineUsed(lifeline));
        }

        let question = self
            .current_question()
            .cloned()
            .ok_or(GameError::NoGame)?;

        let outcome = match lifeline {
            Lifeline::FiftyFifty => {
                let remaining = lifelines::fifty_fifty(&self.displayed_answers, rng);
                self.displayed_answers = remaining.clone();
                LifelineOutcome::FiftyFifty { remaining }
            }
            Lifeline::PhoneAFriend => LifelineOutcome::PhoneAFriend {
                suggestion: lifelines::phone_a_friend(&question, &self.displayed_answers, rng),
            },
            Lifeline::AudiencePoll => {
                let results = lifelines::audience_poll(&self.displayed_answers, rng);
                self.audience_poll = Some(results.clone());
                LifelineOutcome::AudiencePoll { results }
            }
        };

        self.lifelines.mark_used(lifeline);
        Ok(outcome)
    }

    /// Final score and elapsed time, available only once terminal
    pub fn final_result(&self) -> GameResult<(u32, u64)> {
        if !self.status.is_terminal() {
            return Err(GameError::NotFinished);
        }
        Ok((self.score, self.time_taken_ms.unwrap_or(0)))
    }

    fn finish(&mut self, status: GameStatus) {
        self.status = status;
        self.countdown.stop();
        let elapsed = Utc::now().signed_duration_since(self.started_at);
        self.time_taken_ms = Some(elapsed.num_milliseconds().max(0) as u64);
    }

    fn require_status(&self, expected: GameStatus, action: &'static str) -> GameResult<()> {
        if self.status != expected {
            return Err(GameError::InvalidStatus {
                action,
                status: self.status,
            });
        }
        Ok(())
    }
}
