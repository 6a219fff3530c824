//! Domain models used by the backend: problems, per-level progress counters,
//! answer records, and the static level catalog entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where did we get the problem from?
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProblemSource {
    LocalBank, // from user-provided TOML bank
    Generated, // generated via OpenAI and cached in memory
    Seed,      // built-in seeds (last resort)
}

/// A multiple-choice problem kept in the in-memory store.
/// `answer` is an index into `options`; it never leaves the server
/// (see `protocol::problem_to_out`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,
    pub level: u32,
    pub source: ProblemSource,
    pub question: String,
    pub options: Vec<String>,
    pub answer: usize,
    pub explanation: String,
    pub created_at: DateTime<Utc>,
}

/// Per-user, per-level counters. At most one record per (user, level);
/// counters only ever grow. Accuracy is derived, never stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserProgress {
    pub user_id: String,
    pub level: u32,
    pub completed_problems: u32,
    pub correct_answers: u32,
    pub updated_at: DateTime<Utc>,
}

impl UserProgress {
    /// Percentage of answered problems that were correct; 0 when nothing
    /// has been answered yet.
    pub fn accuracy(&self) -> f64 {
        if self.completed_problems == 0 {
            0.0
        } else {
            f64::from(self.correct_answers) / f64::from(self.completed_problems) * 100.0
        }
    }
}

/// One graded submission, kept for the history page.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserAnswer {
    pub id: String,
    pub user_id: String,
    pub problem_id: String,
    pub level: u32,
    pub question: String,
    pub selected_option: usize,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}

/// One entry of the static level catalog (see `levels::level_catalog`).
/// `required_to_unlock` is the number of correct answers needed at the
/// *previous* level before this one opens; level 1 carries 0 and is
/// always open.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LevelInfo {
    pub level: u32,
    pub title: String,
    pub description: String,
    pub required_to_unlock: u32,
}
