//! Seed data: built-in problems that keep the app useful even without an
//! external config bank or OpenAI.

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{Problem, ProblemSource};

fn seed(id: &str, level: u32, question: &str, options: [&str; 4], answer: usize, explanation: &str) -> Problem {
    Problem {
        id: id.into(),
        level,
        source: ProblemSource::Seed,
        question: question.into(),
        options: options.iter().map(|s| s.to_string()).collect(),
        answer,
        explanation: explanation.into(),
        created_at: Utc::now(),
    }
}

/// Minimal set of built-in problems covering the early levels.
pub fn seed_problems() -> Vec<Problem> {
    vec![
        seed(
            "seed-1-1",
            1,
            "What does the following code output?\n\n```javascript\nlet x = 5;\nlet y = \"10\";\nconsole.log(x + y);\n```",
            ["15", "\"510\"", "Error", "5 + \"10\""],
            1,
            "In JavaScript, when you add a number and a string, the number is converted to a string and concatenation occurs. So 5 + \"10\" results in the string \"510\".",
        ),
        seed(
            "seed-1-2",
            1,
            "Which of the following is NOT a valid variable name in JavaScript?",
            ["myVariable", "_value", "123variable", "$price"],
            2,
            "Variable names in JavaScript cannot start with a number. They must begin with a letter, underscore (_), or dollar sign ($).",
        ),
        seed(
            "seed-2-1",
            2,
            "What is the value of x after this code executes?\n\n```javascript\nlet x = 10;\nx += 5;\nx *= 2;\n```",
            ["15", "20", "30", "40"],
            2,
            "First, x += 5 adds 5 to x, making it 15. Then, x *= 2 multiplies x by 2, resulting in 30.",
        ),
        seed(
            "seed-2-2",
            2,
            "What is the result of this expression?\n\n```javascript\n3 > 2 > 1\n```",
            ["true", "false", "Error", "undefined"],
            1,
            "This is evaluated left to right. First, 3 > 2 is true. Then, true > 1 is evaluated. When comparing, true is converted to 1, so it becomes 1 > 1, which is false.",
        ),
        seed(
            "seed-3-1",
            3,
            "What does this code print?\n\n```javascript\nlet n = 0;\nif (n) {\n  console.log(\"yes\");\n} else {\n  console.log(\"no\");\n}\n```",
            ["yes", "no", "Error", "undefined"],
            1,
            "0 is a falsy value in JavaScript, so the else branch runs and \"no\" is printed.",
        ),
    ]
}

/// Absolute last-resort fallback: if no problem exists for a level, we inject this.
pub fn hard_fallback_problem(level: u32) -> Problem {
    Problem {
        id: Uuid::new_v4().to_string(),
        level,
        source: ProblemSource::Seed,
        question: "Which keyword declares a block-scoped variable in JavaScript?".into(),
        options: ["var", "let", "function", "static"].iter().map(|s| s.to_string()).collect(),
        answer: 1,
        explanation: "let (and const) declare block-scoped bindings; var is function-scoped.".into(),
        created_at: Utc::now(),
    }
}
