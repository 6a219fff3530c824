//! In-memory persistence: problems, per-(user, level) progress counters, and
//! answer history.
//!
//! This stands in for the hosted database of a production deployment. The
//! progress lifecycle lives here: a counter row is created the first time a
//! user answers at a level and only ever increments afterwards, so
//! `correct_answers <= completed_problems` holds by construction. Accuracy is
//! derived on read, never stored.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::{Problem, UserAnswer, UserProgress};

#[derive(Clone, Default)]
pub struct Store {
    problems_by_id: Arc<RwLock<HashMap<String, Problem>>>,
    problems_by_level: Arc<RwLock<HashMap<u32, Vec<String>>>>,
    // Keyed by (user, level); at most one row per pair.
    progress: Arc<RwLock<HashMap<(String, u32), UserProgress>>>,
    // Per-user answers in submission order.
    answers: Arc<RwLock<HashMap<String, Vec<UserAnswer>>>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a problem into both indices.
    #[instrument(level = "debug", skip(self, p), fields(id = %p.id, level = p.level))]
    pub async fn insert_problem(&self, p: Problem) {
        let mut by_id = self.problems_by_id.write().await;
        let mut by_level = self.problems_by_level.write().await;
        by_level.entry(p.level).or_default().push(p.id.clone());
        by_id.insert(p.id.clone(), p);
    }

    /// Read-only access to a problem by id.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_problem(&self, id: &str) -> Option<Problem> {
        self.problems_by_id.read().await.get(id).cloned()
    }

    /// Ids of all stored problems for a level, insertion order.
    pub async fn problem_ids_for_level(&self, level: u32) -> Vec<String> {
        self.problems_by_level
            .read()
            .await
            .get(&level)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn problem_count(&self) -> usize {
        self.problems_by_id.read().await.len()
    }

    /// Grade a submission against the stored answer index, append it to the
    /// user's history, and bump the per-level counters. Returns the answer
    /// record and the updated progress row.
    #[instrument(level = "debug", skip(self, problem), fields(%user_id, problem_id = %problem.id, selected_option))]
    pub async fn record_answer(
        &self,
        user_id: &str,
        problem: &Problem,
        selected_option: usize,
    ) -> (UserAnswer, UserProgress) {
        let now = Utc::now();
        let is_correct = selected_option == problem.answer;

        let answer = UserAnswer {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            problem_id: problem.id.clone(),
            level: problem.level,
            question: problem.question.clone(),
            selected_option,
            is_correct,
            answered_at: now,
        };
        self.answers
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .push(answer.clone());

        let mut progress = self.progress.write().await;
        let row = progress
            .entry((user_id.to_string(), problem.level))
            .or_insert_with(|| UserProgress {
                user_id: user_id.to_string(),
                level: problem.level,
                completed_problems: 0,
                correct_answers: 0,
                updated_at: now,
            });
        row.completed_problems += 1;
        if is_correct {
            row.correct_answers += 1;
        }
        row.updated_at = now;

        debug!(
            target: "quiz",
            %user_id,
            level = problem.level,
            completed = row.completed_problems,
            correct = row.correct_answers,
            "Progress updated"
        );
        (answer, row.clone())
    }

    /// Point-in-time snapshot of a user's progress rows, ordered by level.
    #[instrument(level = "debug", skip(self), fields(%user_id))]
    pub async fn progress_snapshot(&self, user_id: &str) -> Vec<UserProgress> {
        let progress = self.progress.read().await;
        let mut rows: Vec<UserProgress> = progress
            .iter()
            .filter(|((uid, _), _)| uid == user_id)
            .map(|(_, row)| row.clone())
            .collect();
        rows.sort_by_key(|r| r.level);
        rows
    }

    /// Most recent answers first, capped at `limit`.
    #[instrument(level = "debug", skip(self), fields(%user_id, limit))]
    pub async fn answer_history(&self, user_id: &str, limit: usize) -> Vec<UserAnswer> {
        let answers = self.answers.read().await;
        let mut out: Vec<UserAnswer> = answers.get(user_id).cloned().unwrap_or_default();
        out.reverse();
        out.truncate(limit);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeds::seed_problems;

    async fn store_with_seeds() -> Store {
        let store = Store::new();
        for p in seed_problems() {
            store.insert_problem(p).await;
        }
        store
    }

    #[tokio::test]
    async fn first_answer_creates_the_progress_row() {
        let store = store_with_seeds().await;
        let problem = store.get_problem("seed-1-1").await.expect("seed problem");

        let (answer, row) = store.record_answer("u1", &problem, problem.answer).await;
        assert!(answer.is_correct);
        assert_eq!(row.level, 1);
        assert_eq!(row.completed_problems, 1);
        assert_eq!(row.correct_answers, 1);
    }

    #[tokio::test]
    async fn counters_only_grow_and_accuracy_is_derived() {
        let store = store_with_seeds().await;
        let problem = store.get_problem("seed-1-1").await.expect("seed problem");
        let wrong = (problem.answer + 1) % problem.options.len();

        store.record_answer("u1", &problem, problem.answer).await;
        let (_, row) = store.record_answer("u1", &problem, wrong).await;

        assert_eq!(row.completed_problems, 2);
        assert_eq!(row.correct_answers, 1);
        assert!(row.correct_answers <= row.completed_problems);
        assert!((row.accuracy() - 50.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn snapshot_holds_one_row_per_level_ordered() {
        let store = store_with_seeds().await;
        let p2 = store.get_problem("seed-2-1").await.unwrap();
        let p1 = store.get_problem("seed-1-1").await.unwrap();

        store.record_answer("u1", &p2, p2.answer).await;
        store.record_answer("u1", &p1, p1.answer).await;
        store.record_answer("u1", &p1, p1.answer).await;

        let snapshot = store.progress_snapshot("u1").await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].level, 1);
        assert_eq!(snapshot[0].completed_problems, 2);
        assert_eq!(snapshot[1].level, 2);

        // Other users see nothing.
        assert!(store.progress_snapshot("u2").await.is_empty());
    }

    #[tokio::test]
    async fn history_is_newest_first_and_capped() {
        let store = store_with_seeds().await;
        let p1 = store.get_problem("seed-1-1").await.unwrap();
        let p2 = store.get_problem("seed-1-2").await.unwrap();

        store.record_answer("u1", &p1, 0).await;
        store.record_answer("u1", &p2, 0).await;

        let history = store.answer_history("u1", 10).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].problem_id, "seed-1-2");

        let capped = store.answer_history("u1", 1).await;
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].problem_id, "seed-1-2");
    }
}
