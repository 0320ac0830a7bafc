use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type GameId = String;
pub type QuestionId = String;

/// Prize values per question tier, strictly increasing.
/// A correct answer on question `i` adds `PRIZE_LADDER[i]` to the score.
pub const PRIZE_LADDER: &[u32] = &[
    100, 200, 300, 500, 1_000, 2_000, 4_000, 8_000, 16_000, 32_000, 64_000, 125_000, 250_000,
    500_000, 1_000_000,
];

/// Prize for a question position; positions past the ladder pay the top tier.
pub fn prize_for_tier(index: usize) -> u32 {
    PRIZE_LADDER[index.min(PRIZE_LADDER.len() - 1)]
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    Idle,
    LoadingQuestions,
    Playing,
    Answered,
    ErrorLoadingQuestions,
    GameOver,
    GameWon,
}

impl GameStatus {
    /// Terminal states freeze score and elapsed time; no gameplay mutation after.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameStatus::GameOver | GameStatus::GameWon)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Millionaire-style run up the prize ladder; a wrong or absent answer ends the game.
    Ladder,
    /// Play through the whole batch; wrong answers just score nothing.
    Casual,
}

impl GameMode {
    pub fn eliminates_on_miss(&self) -> bool {
        matches!(self, GameMode::Ladder)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Difficulty ramp across a batch: first third easy, middle medium, rest hard.
    pub fn for_tier(index: usize, total: usize) -> Self {
        let total = total.max(1);
        if index * 3 < total {
            Difficulty::Easy
        } else if index * 3 < total * 2 {
            Difficulty::Medium
        } else {
            Difficulty::Hard
        }
    }
}

/// A single answer option of a question
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerOption {
    pub text: String,
    pub is_correct: bool,
}

/// A generated trivia question with exactly four options, one of them correct
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub answers: Vec<AnswerOption>,
    pub difficulty: Difficulty,
    pub category: String,
}

impl Question {
    pub fn correct_answer(&self) -> Option<&AnswerOption> {
        self.answers.iter().find(|a| a.is_correct)
    }
}

/// The closed set of one-time aids a player may invoke during a question
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Lifeline {
    FiftyFifty,
    PhoneAFriend,
    AudiencePoll,
}

/// Per-run lifeline bookkeeping; each flag flips to true at most once
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LifelineUsage {
    pub fifty_fifty: bool,
    pub phone_a_friend: bool,
    pub audience_poll: bool,
}

impl LifelineUsage {
    pub fn is_used(&self, lifeline: Lifeline) -> bool {
        match lifeline {
            Lifeline::FiftyFifty => self.fifty_fifty,
            Lifeline::PhoneAFriend => self.phone_a_friend,
            Lifeline::AudiencePoll => self.audience_poll,
        }
    }

    pub fn mark_used(&mut self, lifeline: Lifeline) {
        match lifeline {
            Lifeline::FiftyFifty => self.fifty_fifty = true,
            Lifeline::PhoneAFriend => self.phone_a_friend = true,
            Lifeline::AudiencePoll => self.audience_poll = true,
        }
    }
}

/// One bucket of a simulated audience poll
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollResult {
    pub text: String,
    pub percentage: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Countdown duration per question, in seconds
    pub timer_seconds: u32,
    /// Number of questions requested per game
    pub question_count: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            timer_seconds: 30,
            question_count: 10,
        }
    }
}

impl GameConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timer_seconds: std::env::var("QUESTION_TIMER_SECONDS")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.timer_seconds),
            question_count: std::env::var("QUESTIONS_PER_GAME")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(defaults.question_count),
        }
    }
}
