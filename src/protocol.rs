//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Problem, ProblemSource, UserAnswer};

/// DTO for problem delivery. Deliberately omits the answer index and the
/// stored explanation: grading happens server-side.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemOut {
    pub id: String,
    pub level: u32,
    pub source: ProblemSource,
    pub question: String,
    pub options: Vec<String>,
}

/// Convert full `Problem` (internal) to the public DTO.
pub fn problem_to_out(p: &Problem) -> ProblemOut {
    ProblemOut {
        id: p.id.clone(),
        level: p.level,
        source: p.source.clone(),
        question: p.question.clone(),
        options: p.options.clone(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelsQuery {
    pub user_id: Option<String>,
}

/// One catalog entry plus the caller's unlock/progress view of it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelOut {
    pub level: u32,
    pub title: String,
    pub description: String,
    pub required_to_unlock: u32,
    pub unlocked: bool,
    pub progress_percent: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelsOut {
    pub levels: Vec<LevelOut>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemQuery {
    pub level: u32,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerIn {
    pub user_id: String,
    pub problem_id: String,
    pub selected_option: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOut {
    pub correct: bool,
    pub correct_option: usize,
    pub explanation: String,
    pub level: u32,
    pub completed_problems: u32,
    pub correct_answers: u32,
    pub accuracy: f64,
    pub overall_progress: u8,
    /// Set when this submission just opened the next level.
    pub unlocked_level: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressQuery {
    pub user_id: String,
}

/// Per-level counters with the derived accuracy, for the dashboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRowOut {
    pub level: u32,
    pub completed_problems: u32,
    pub correct_answers: u32,
    pub accuracy: f64,
    pub progress_percent: u8,
    pub unlocked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressOut {
    pub overall_progress: u8,
    pub levels: Vec<ProgressRowOut>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub user_id: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryOut {
    pub id: String,
    pub problem_id: String,
    pub level: u32,
    pub question: String,
    pub selected_option: usize,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}

pub fn answer_to_history_out(a: &UserAnswer) -> HistoryEntryOut {
    HistoryEntryOut {
        id: a.id.clone(),
        problem_id: a.problem_id.clone(),
        level: a.level,
        question: a.question.clone(),
        selected_option: a.selected_option,
        is_correct: a.is_correct,
        answered_at: a.answered_at,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryOut {
    pub entries: Vec<HistoryEntryOut>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOut {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
