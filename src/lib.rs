// Public API for integration tests and potential library usage

pub mod api;
pub mod game;
pub mod leaderboard;
pub mod llm;
pub mod protocol;
pub mod state;
pub mod timer;
pub mod types;
