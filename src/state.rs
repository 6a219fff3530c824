//! Application state: the in-memory store, prompts, and the optional OpenAI
//! client, plus the problem selection policy.
//!
//! The selection policy prefers a freshly generated problem when OpenAI is
//! available. Without it, we serve from the existing pool (TOML bank and
//! built-in seeds), avoiding an immediate repeat per level, and fall back to
//! a hard-coded problem as the absolute last resort.

use std::{collections::HashMap, sync::Arc};

use rand::seq::SliceRandom;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::{load_quiz_config_from_env, Prompts};
use crate::domain::{Problem, ProblemSource};
use crate::openai::OpenAI;
use crate::progress::get_level_info;
use crate::seeds::{hard_fallback_problem, seed_problems};
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub openai: Option<OpenAI>,
    pub prompts: Prompts,
    last_by_level: Arc<RwLock<HashMap<u32, String>>>,
}

impl AppState {
    /// Build state from env: load config, validate and seed the problem pool,
    /// init OpenAI.
    #[instrument(level = "info", skip_all)]
    pub async fn new() -> Self {
        // Load TOML config if provided (prompts + optional problem bank).
        let cfg_opt = load_quiz_config_from_env();
        let prompts = cfg_opt
            .as_ref()
            .map(|c| c.prompts.clone())
            .unwrap_or_default();

        let store = Store::new();

        // Insert config-bank problems (if any), rejecting malformed rows at
        // the boundary so nothing downstream has to re-check them.
        if let Some(cfg) = &cfg_opt {
            for pc in &cfg.problems {
                let id = pc.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
                if pc.options.len() < 2 {
                    error!(target: "quiz", %id, level = pc.level, "Skipping bank item: fewer than two options.");
                    continue;
                }
                if pc.answer >= pc.options.len() {
                    error!(target: "quiz", %id, level = pc.level, answer = pc.answer, "Skipping bank item: answer index out of range.");
                    continue;
                }
                if get_level_info(pc.level).is_none() {
                    error!(target: "quiz", %id, level = pc.level, "Skipping bank item: unknown level.");
                    continue;
                }
                store
                    .insert_problem(Problem {
                        id,
                        level: pc.level,
                        source: ProblemSource::LocalBank,
                        question: pc.question.clone(),
                        options: pc.options.clone(),
                        answer: pc.answer,
                        explanation: pc.explanation.clone(),
                        created_at: chrono::Utc::now(),
                    })
                    .await;
            }
        }

        // Always insert built-in seeds.
        let mut count_by_level: HashMap<u32, usize> = HashMap::new();
        for p in seed_problems() {
            *count_by_level.entry(p.level).or_default() += 1;
            store.insert_problem(p).await;
        }
        for (level, seeded) in count_by_level {
            info!(target: "quiz", level, seeded, "Startup problem inventory");
        }

        // Build optional OpenAI client (if API key present).
        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "codequiz_backend", base_url = %oa.base_url, fast_model = %oa.fast_model, strong_model = %oa.strong_model, "OpenAI enabled.");
        } else {
            info!(target: "codequiz_backend", "OpenAI disabled (no OPENAI_API_KEY). Using bank/seed problems.");
        }

        Self {
            store,
            openai,
            prompts,
            last_by_level: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Selection policy:
    /// Generate a fresh problem via OpenAI when available. Otherwise serve
    /// from the existing pool for the level, then hard fallback.
    #[instrument(level = "info", skip(self), fields(level))]
    pub async fn choose_problem(&self, level: u32) -> (Problem, &'static str) {
        if let (Some(oa), Some(info_entry)) = (&self.openai, get_level_info(level)) {
            match oa.generate_problem(&self.prompts, info_entry).await {
                Ok(p) => {
                    let id = p.id.clone();
                    self.store.insert_problem(p.clone()).await;
                    self.last_by_level.write().await.insert(level, id.clone());
                    info!(target: "quiz", level, chosen = %id, source = "openai_generated_new", "Generated fresh problem");
                    return (p, "openai_generated_new");
                }
                Err(e) => {
                    error!(target: "quiz", level, error = %e, "OpenAI generation failed; trying existing pool");
                }
            }
        }

        // Serve one of the stored problems for this level (bank or seeds),
        // skipping the one served last time when there is a choice.
        let ids = self.store.problem_ids_for_level(level).await;
        if !ids.is_empty() {
            let last = { self.last_by_level.read().await.get(&level).cloned() };
            let candidates: Vec<&String> = match &last {
                Some(last_id) if ids.len() > 1 => ids.iter().filter(|id| *id != last_id).collect(),
                _ => ids.iter().collect(),
            };
            let chosen_id = candidates
                .choose(&mut rand::thread_rng())
                .map(|id| (*id).clone())
                .unwrap_or_else(|| ids[0].clone());

            if let Some(p) = self.store.get_problem(&chosen_id).await {
                self.last_by_level.write().await.insert(level, chosen_id.clone());
                info!(target: "quiz", level, chosen = %chosen_id, source = "existing_pool", "Serving existing problem");
                return (p, "existing_pool");
            }
        }

        // Absolute last resort.
        let p = hard_fallback_problem(level);
        let id = p.id.clone();
        self.store.insert_problem(p.clone()).await;
        self.last_by_level.write().await.insert(level, id.clone());
        warn!(target: "quiz", level, chosen = %id, source = "hard_fallback", "Inserted hard fallback problem");
        (p, "hard_fallback")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeds_are_served_without_openai() {
        let state = AppState::new().await;
        let (p, origin) = state.choose_problem(1).await;
        assert_eq!(p.level, 1);
        assert_eq!(origin, "existing_pool");
        assert_eq!(p.source, ProblemSource::Seed);
    }

    #[tokio::test]
    async fn consecutive_picks_avoid_an_immediate_repeat() {
        let state = AppState::new().await;
        // Level 1 has two seeds; the second pick must differ from the first.
        let (first, _) = state.choose_problem(1).await;
        let (second, _) = state.choose_problem(1).await;
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn empty_levels_get_the_hard_fallback() {
        let state = AppState::new().await;
        let before = state.store.problem_count().await;
        let (p, origin) = state.choose_problem(9).await;
        assert_eq!(origin, "hard_fallback");
        assert_eq!(p.level, 9);
        assert_eq!(state.store.problem_count().await, before + 1);

        // The fallback joins the pool and is served on the next request.
        let (again, origin2) = state.choose_problem(9).await;
        assert_eq!(origin2, "existing_pool");
        assert_eq!(again.id, p.id);
    }
}
