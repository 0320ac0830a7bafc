//! Request/response types for the HTTP API.
//!
//! `GameSnapshot` is the client-facing view of a run. Answer correctness is
//! withheld until the current question is revealed so the browser never holds
//! the solution while the player can still act on it.

use crate::game::GameState;
use crate::leaderboard::ScoreEntry;
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct StartGameRequest {
    pub mode: GameMode,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectAnswerRequest {
    /// Text of one of the currently displayed answers
    pub answer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LifelineRequest {
    pub lifeline: Lifeline,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveScoreRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerView {
    pub text: String,
    /// Present only once the answer has been revealed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: QuestionId,
    pub text: String,
    pub difficulty: Difficulty,
    pub category: String,
    /// 1-based position within the batch
    pub number: usize,
    pub total: usize,
}

/// Full view of the current run for rendering
#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
    pub game_id: GameId,
    pub status: GameStatus,
    pub mode: GameMode,
    pub score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    pub displayed_answers: Vec<AnswerView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_answer: Option<String>,
    pub answer_revealed: bool,
    pub lifelines_used: LifelineUsage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience_poll: Option<Vec<PollResult>>,
    pub time_remaining: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_taken_ms: Option<u64>,
}

impl GameSnapshot {
    pub fn from_state(game: &GameState) -> Self {
        let reveal = game.answer_revealed;
        Self {
            game_id: game.id.clone(),
            status: game.status,
            mode: game.mode,
            score: game.score,
            question: game.current_question().map(|q| QuestionView {
                id: q.id.clone(),
                text: q.text.clone(),
                difficulty: q.difficulty,
                category: q.category.clone(),
                number: game.current_index + 1,
                total: game.total_questions(),
            }),
            displayed_answers: game
                .displayed_answers
                .iter()
                .map(|a| AnswerView {
                    text: a.text.clone(),
                    is_correct: reveal.then_some(a.is_correct),
                })
                .collect(),
            selected_answer: game.selected_answer.as_ref().map(|a| a.text.clone()),
            answer_revealed: reveal,
            lifelines_used: game.lifelines,
            audience_poll: game.audience_poll.clone(),
            time_remaining: game.countdown.remaining(),
            time_taken_ms: game.time_taken_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntryView {
    pub id: String,
    pub name: String,
    pub score: u32,
    /// Formatted MM:SS, "N/A" when unavailable
    pub time_taken: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_millis: Option<i64>,
}

impl From<ScoreEntry> for LeaderboardEntryView {
    fn from(entry: ScoreEntry) -> Self {
        let time_taken =
            crate::leaderboard::format_time_taken(entry.time_taken_ms.map(|ms| ms as i64));
        Self {
            id: entry.id,
            name: entry.name,
            score: entry.score,
            time_taken,
            date: entry.date,
            timestamp_millis: entry.timestamp_millis,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntryView>,
}
