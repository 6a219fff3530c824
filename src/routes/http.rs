//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs include parameters and basic result info.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, instrument};

use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;

/// Map a refusal to its status code and JSON error body.
fn denied(d: Denied) -> Response {
    let status = match &d {
        Denied::LockedLevel(_) => StatusCode::FORBIDDEN,
        Denied::UnknownLevel(_) | Denied::UnknownProblem(_) => StatusCode::NOT_FOUND,
    };
    (status, Json(ErrorOut { message: d.message() })).into_response()
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
    Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state), fields(user_id = q.user_id.as_deref().unwrap_or("")))]
pub async fn http_get_levels(
    State(state): State<Arc<AppState>>,
    Query(q): Query<LevelsQuery>,
) -> impl IntoResponse {
    let out = levels_view(&state, q.user_id.as_deref()).await;
    Json(out)
}

#[instrument(level = "info", skip(state), fields(level = q.level, user_id = q.user_id.as_deref().unwrap_or("")))]
pub async fn http_get_problem(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ProblemQuery>,
) -> Response {
    let user_id = q.user_id.unwrap_or_default();
    match serve_problem(&state, &user_id, q.level).await {
        Ok((problem, origin)) => {
            info!(target: "quiz", level = q.level, id = %problem.id, %origin, "HTTP problem served");
            Json(problem_to_out(&problem)).into_response()
        }
        Err(d) => denied(d),
    }
}

#[instrument(level = "info", skip(state, body), fields(%body.user_id, %body.problem_id, selected = body.selected_option))]
pub async fn http_post_answer(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnswerIn>,
) -> Response {
    match grade_submission(&state, &body.user_id, &body.problem_id, body.selected_option).await {
        Ok(out) => {
            info!(
                target: "quiz",
                id = %body.problem_id,
                correct = out.correct,
                unlocked = ?out.unlocked_level,
                "HTTP submit_answer graded"
            );
            Json(out).into_response()
        }
        Err(d) => denied(d),
    }
}

#[instrument(level = "info", skip(state), fields(%q.user_id))]
pub async fn http_get_progress(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ProgressQuery>,
) -> impl IntoResponse {
    let out = progress_view(&state, &q.user_id).await;
    info!(target: "quiz", user_id = %q.user_id, overall = out.overall_progress, "HTTP progress served");
    Json(out)
}

#[instrument(level = "info", skip(state), fields(%q.user_id, limit = q.limit.unwrap_or(50)))]
pub async fn http_get_history(
    State(state): State<Arc<AppState>>,
    Query(q): Query<HistoryQuery>,
) -> impl IntoResponse {
    let limit = q.limit.unwrap_or(50);
    let entries = state
        .store
        .answer_history(&q.user_id, limit)
        .await
        .iter()
        .map(answer_to_history_out)
        .collect();
    Json(HistoryOut { entries })
}
