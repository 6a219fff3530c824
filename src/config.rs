//! Loading quiz configuration (prompts + optional problem bank) from TOML.
//!
//! See `QuizConfig` and `Prompts` for expected schema.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct QuizConfig {
    #[serde(default)]
    pub prompts: Prompts,
    #[serde(default)]
    pub problems: Vec<ProblemCfg>,
}

/// Problem entry accepted in TOML configuration.
/// `answer` is a zero-based index into `options`; rows with an out-of-range
/// index or too few options are rejected at startup (see `AppState::new`).
#[derive(Clone, Debug, Deserialize)]
pub struct ProblemCfg {
    #[serde(default)]
    pub id: Option<String>,
    pub level: u32,
    pub question: String,
    pub options: Vec<String>,
    pub answer: usize,
    #[serde(default)]
    pub explanation: String,
}

/// Prompts used by the OpenAI client. Defaults are sensible for generating
/// beginner programming quiz questions. Override them in TOML to tune
/// tone/structure.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
    // Problem generation (strict JSON)
    pub problem_system: String,
    pub problem_user_template: String,
    // Personalized explanation of a graded answer (plain text)
    pub explanation_system: String,
    pub explanation_user_template: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            problem_system: "You are a programming education content generator. Respond ONLY with strict JSON.".into(),
            problem_user_template: "Generate one multiple-choice question for level {level} ('{title}': {description}). Return JSON with fields: question (string, may contain a fenced code block), options (array of exactly 4 strings), answer (0-based index of the correct option), explanation (string, 1-3 sentences). Keep the question short and unambiguous.".into(),
            explanation_system: "You are a patient programming tutor. Explain in 2-3 sentences why the correct option is correct; if the learner chose a wrong option, also say why that choice is tempting but wrong. Output plain text only.".into(),
            explanation_user_template: "Question: {question}\nOptions: {options}\nCorrect option: {correct}\nLearner chose: {selected}\nReference explanation: {explanation}".into(),
        }
    }
}

/// Attempt to load `QuizConfig` from QUIZ_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_quiz_config_from_env() -> Option<QuizConfig> {
    let path = std::env::var("QUIZ_CONFIG_PATH").ok()?;
    match std::fs::read_to_string(&path) {
        Ok(s) => match toml::from_str::<QuizConfig>(&s) {
            Ok(cfg) => {
                info!(target: "codequiz_backend", %path, "Loaded quiz config (TOML)");
                Some(cfg)
            }
            Err(e) => {
                error!(target: "codequiz_backend", %path, error = %e, "Failed to parse TOML config");
                None
            }
        },
        Err(e) => {
            error!(target: "codequiz_backend", %path, error = %e, "Failed to read TOML config file");
            None
        }
    }
}
