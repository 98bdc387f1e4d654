// Copyright (C) 2025 Questline Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! API routes and request handlers.
//!
//! Member identity is read from gateway-supplied headers: `x-member-id`,
//! `x-member-name`, and `x-member-caps` (comma-separated capabilities; the
//! `manage-roles` capability gates the moderator endpoints). Rejections from
//! the engine map to HTTP statuses with a `{code, message}` body; store
//! failures surface as 503.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use questline_core::catalog::Task;
use questline_core::error::EngineError;
use questline_core::notify::Notifier;
use questline_core::progression::{Award, Outcome, ProgressionEngine, Rejection};
use questline_core::reaction::ReactionEvent;

/// Longest accepted completion comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 500;

/// Capability required for moderator endpoints and reaction awards.
pub const MANAGE_ROLES_CAP: &str = "manage-roles";

/// Shared state for all request handlers.
pub struct AppState {
    /// The progression engine.
    pub engine: ProgressionEngine,
    /// Post-commit notifier, invoked fire-and-forget.
    pub notifier: Arc<dyn Notifier>,
}

type AppStateArc = Arc<AppState>;

/// Build the API router.
pub fn router(state: AppStateArc) -> Router {
    Router::new()
        .route("/api/tasks", get(list_tasks))
        .route("/api/me", get(me))
        .route("/api/complete-task", post(complete_task))
        .route("/api/award", post(award_special))
        .route("/api/events/reaction", post(reaction_event))
        .route("/api/leaderboard", get(leaderboard))
        .route("/api/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Identity
// ============================================================================

/// Authenticated member identity forwarded by the gateway.
struct Identity {
    member_id: String,
    member_name: String,
    can_manage_roles: bool,
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn identity(headers: &HeaderMap) -> Result<Identity, ApiError> {
    let member_id = header_value(headers, "x-member-id").ok_or(ApiError {
        status: StatusCode::UNAUTHORIZED,
        code: "UNAUTHENTICATED",
        message: "member identity is required".to_string(),
    })?;
    let member_name = header_value(headers, "x-member-name").unwrap_or_else(|| member_id.clone());
    let can_manage_roles = header_value(headers, "x-member-caps")
        .map(|caps| caps.split(',').any(|cap| cap.trim() == MANAGE_ROLES_CAP))
        .unwrap_or(false);

    Ok(Identity {
        member_id,
        member_name,
        can_manage_roles,
    })
}

// ============================================================================
// Error mapping
// ============================================================================

/// An API failure rendered as `{code, message}` with an HTTP status.
struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "code": self.code, "message": self.message })),
        )
            .into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        error!(error = %err, "store operation failed");
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            code: "STORE_UNAVAILABLE",
            message: "the progression store is unavailable, try again later".to_string(),
        }
    }
}

impl From<Rejection> for ApiError {
    fn from(rejection: Rejection) -> Self {
        let status = match &rejection {
            Rejection::TaskNotFound { .. } | Rejection::InvalidSpecialTask { .. } => {
                StatusCode::NOT_FOUND
            }
            Rejection::SpecialForbidden { .. } => StatusCode::FORBIDDEN,
            Rejection::AlreadyCompleted { .. } => StatusCode::CONFLICT,
            Rejection::OnboardingIncomplete { .. } | Rejection::LevelPrerequisiteUnmet { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        };
        Self {
            status,
            code: rejection.code(),
            message: rejection.to_string(),
        }
    }
}

// ============================================================================
// Request/response bodies
// ============================================================================

#[derive(Deserialize)]
struct CompleteTaskRequest {
    task_id: String,
    comment: Option<String>,
}

#[derive(Deserialize)]
struct AwardRequest {
    member_id: String,
    member_name: String,
    task_id: String,
    comment: Option<String>,
}

#[derive(Serialize)]
struct AwardResponse {
    success: bool,
    xp_earned: i64,
    total_xp: i64,
    tier: u8,
    tier_name: &'static str,
    task: Task,
}

impl From<&Award> for AwardResponse {
    fn from(award: &Award) -> Self {
        Self {
            success: true,
            xp_earned: award.xp_earned,
            total_xp: award.total_xp,
            tier: award.tier.rank(),
            tier_name: award.tier.name(),
            task: award.task.clone(),
        }
    }
}

#[derive(Serialize)]
struct ProfileResponse {
    member_id: String,
    display_name: String,
    total_xp: i64,
    tier: u8,
    tier_name: &'static str,
    completed_task_ids: Vec<String>,
}

#[derive(Serialize)]
struct LeaderboardRow {
    member_id: String,
    display_name: String,
    total_xp: i64,
    tier: u8,
    tier_name: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_tasks(State(state): State<AppStateArc>) -> Json<Vec<Task>> {
    Json(state.engine.catalog().tasks().to_vec())
}

async fn me(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
) -> Result<Json<ProfileResponse>, ApiError> {
    let identity = identity(&headers)?;
    let profile = state
        .engine
        .profile(&identity.member_id)
        .await?
        .ok_or(ApiError {
            status: StatusCode::NOT_FOUND,
            code: "MEMBER_NOT_FOUND",
            message: "no progression record for this member yet".to_string(),
        })?;

    Ok(Json(ProfileResponse {
        member_id: profile.member_id,
        display_name: profile.display_name,
        total_xp: profile.total_xp,
        tier: profile.tier.rank(),
        tier_name: profile.tier.name(),
        completed_task_ids: profile.completed_task_ids,
    }))
}

async fn complete_task(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    Json(request): Json<CompleteTaskRequest>,
) -> Result<Json<AwardResponse>, ApiError> {
    let identity = identity(&headers)?;
    let comment = validated_comment(request.comment.as_deref())?;

    let outcome = state
        .engine
        .complete_task(
            &identity.member_id,
            &identity.member_name,
            &request.task_id,
            comment,
        )
        .await?;

    accepted_response(&state, outcome)
}

async fn award_special(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
    Json(request): Json<AwardRequest>,
) -> Result<Json<AwardResponse>, ApiError> {
    let identity = identity(&headers)?;
    if !identity.can_manage_roles {
        return Err(ApiError {
            status: StatusCode::FORBIDDEN,
            code: "CAPABILITY_REQUIRED",
            message: "the manage-roles capability is required to grant awards".to_string(),
        });
    }
    validated_comment(request.comment.as_deref())?;

    // Audit trail: the recorded comment names the acting moderator.
    let comment = match request.comment.as_deref() {
        Some(comment) => format!("{} (awarded by {})", comment, identity.member_name),
        None => format!("Awarded by {}", identity.member_name),
    };

    let outcome = state
        .engine
        .award_special(
            &request.member_id,
            &request.member_name,
            &request.task_id,
            Some(&comment),
        )
        .await?;

    accepted_response(&state, outcome)
}

async fn reaction_event(
    State(state): State<AppStateArc>,
    Json(event): Json<ReactionEvent>,
) -> Result<StatusCode, ApiError> {
    match state.engine.award_from_reaction(&event).await? {
        Some(Outcome::Accepted(award)) => notify_after_commit(&state, award),
        Some(Outcome::Rejected(rejection)) => {
            // Possible only when the emoji table and catalog disagree.
            warn!(code = rejection.code(), "reaction award rejected");
        }
        None => {}
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn leaderboard(
    State(state): State<AppStateArc>,
) -> Result<Json<Vec<LeaderboardRow>>, ApiError> {
    let entries = state.engine.leaderboard().await?;
    Ok(Json(
        entries
            .into_iter()
            .map(|entry| LeaderboardRow {
                member_id: entry.member_id,
                display_name: entry.display_name,
                total_xp: entry.total_xp,
                tier: entry.tier.rank(),
                tier_name: entry.tier.name(),
            })
            .collect(),
    ))
}

async fn health(State(state): State<AppStateArc>) -> Result<Json<serde_json::Value>, ApiError> {
    state.engine.health_check().await?;
    Ok(Json(json!({ "status": "ok" })))
}

// ============================================================================
// Helpers
// ============================================================================

fn validated_comment(comment: Option<&str>) -> Result<Option<&str>, ApiError> {
    match comment {
        Some(text) if text.chars().count() > MAX_COMMENT_CHARS => Err(ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            code: "COMMENT_TOO_LONG",
            message: format!("comment must be at most {} characters", MAX_COMMENT_CHARS),
        }),
        Some(text) if text.is_empty() => Ok(None),
        other => Ok(other),
    }
}

fn accepted_response(
    state: &AppStateArc,
    outcome: Outcome,
) -> Result<Json<AwardResponse>, ApiError> {
    match outcome {
        Outcome::Accepted(award) => {
            let response = AwardResponse::from(&award);
            notify_after_commit(state, award);
            Ok(Json(response))
        }
        Outcome::Rejected(rejection) => Err(rejection.into()),
    }
}

/// Fire-and-forget announcement and tier-role sync, after the ledger commit
/// and outside every lock. Notifier failures are logged by the
/// implementation and never surface here.
fn notify_after_commit(state: &AppStateArc, award: Award) {
    let notifier = state.notifier.clone();
    tokio::spawn(async move {
        notifier.announce(&award).await;
        notifier.sync_tier(&award.member_id, award.tier).await;
    });
}
