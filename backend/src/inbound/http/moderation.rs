//! Post moderation and the moderation log.
//!
//! ```text
//! POST /moderate/post/{id}     action=close&comment=duplicate
//! POST /moderate/spam/{id}     ?restore=1 (any value but 0/false) puts the post back
//! POST /moderate/release/{id}
//! GET  /logs
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{ApiResult, Error, ModerationLog, PostId, PostModerationForm};

use super::page::{PageOutcome, flash, location, respond};
use super::session::SessionContext;
use super::state::HttpState;

fn parse_post_id(raw: &str) -> ApiResult<PostId> {
    PostId::parse(raw).ok_or_else(|| Error::not_found("post does not exist"))
}

/// Open, close, delete or bump a post.
#[utoipa::path(
    post,
    path = "/moderate/post/{id}",
    params(("id" = String, Path, description = "Post identifier")),
    request_body(content = PostModerationForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 303, description = "Redirect to the thread, or home after deleting it")),
    tags = ["moderation"],
    operation_id = "moderatePost"
)]
#[post("/moderate/post/{id}")]
pub async fn moderate_post(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    form: web::Form<PostModerationForm>,
) -> HttpResponse {
    let fallback = format!("/p/{}", path.as_str());
    let result: ApiResult<PageOutcome<()>> = async {
        let post_id = parse_post_id(&path)?;
        let viewer = state.viewer(&session).await?;
        let next = state.moderation.moderate_post(&viewer, post_id, &form).await?;
        flash(&session, "moderation action completed");
        Ok(PageOutcome::next(&next))
    }
    .await;
    respond(&session, &fallback, result)
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SpamParams {
    /// Any non-empty value other than `0` or `false` restores the post
    /// instead of marking it.
    pub restore: Option<String>,
}

impl SpamParams {
    /// Whether the request asks to put the post back.
    #[must_use]
    pub fn restores(&self) -> bool {
        self.restore.as_deref().map(str::trim).is_some_and(|raw| {
            !raw.is_empty() && raw != "0" && !raw.eq_ignore_ascii_case("false")
        })
    }
}

/// Mark a post as spam, or restore it.
#[utoipa::path(
    post,
    path = "/moderate/spam/{id}",
    params(("id" = String, Path, description = "Post identifier"), SpamParams),
    responses((status = 303, description = "Redirect to the spam queue or home")),
    tags = ["moderation"],
    operation_id = "markSpam"
)]
#[post("/moderate/spam/{id}")]
pub async fn mark_spam(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    params: web::Query<SpamParams>,
) -> HttpResponse {
    let restore = params.restores();
    let result: ApiResult<PageOutcome<()>> = async {
        let post_id = parse_post_id(&path)?;
        let viewer = state.viewer(&session).await?;
        let decision = state.moderation.mark_spam(&viewer, post_id, restore).await?;
        if decision.changed {
            flash(
                &session,
                if restore { "post restored" } else { "post marked as spam" },
            );
        } else {
            debug!(post_id = %decision.post_id, spam = ?decision.spam, "spam status unchanged");
        }
        Ok(PageOutcome::Redirect(location(&decision.next)))
    }
    .await;
    respond(&session, "/", result)
}

/// Release a quarantined post.
#[utoipa::path(
    post,
    path = "/moderate/release/{id}",
    params(("id" = String, Path, description = "Post identifier")),
    responses((status = 303, description = "Redirect home")),
    tags = ["moderation"],
    operation_id = "releaseQuarantine"
)]
#[post("/moderate/release/{id}")]
pub async fn release_quarantine(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> HttpResponse {
    let result: ApiResult<PageOutcome<()>> = async {
        let post_id = parse_post_id(&path)?;
        let viewer = state.viewer(&session).await?;
        let decision = state.moderation.release_quarantine(&viewer, post_id).await?;
        if decision.changed {
            flash(&session, "post released");
        }
        Ok(PageOutcome::Redirect(location(&decision.next)))
    }
    .await;
    respond(&session, "/", result)
}

/// Recent moderation actions.
#[derive(Debug, Serialize, ToSchema)]
pub struct LogList {
    pub logs: Vec<ModerationLog>,
}

/// Moderation log page; empty for anyone but moderators.
#[utoipa::path(
    get,
    path = "/logs",
    responses((status = 200, description = "Recent actions, newest first", body = LogList)),
    tags = ["moderation"],
    operation_id = "moderationLogs"
)]
#[get("/logs")]
pub async fn moderation_logs(state: web::Data<HttpState>, session: SessionContext) -> HttpResponse {
    let result: ApiResult<PageOutcome<LogList>> = async {
        let viewer = state.viewer(&session).await?;
        let logs = state.moderation.recent_logs(&viewer).await?;
        Ok(PageOutcome::Render(LogList { logs }))
    }
    .await;
    respond(&session, "/", result)
}
