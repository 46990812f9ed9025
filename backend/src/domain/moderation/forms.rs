//! Validation of moderation form submissions.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{FormErrors, Profile, ProfileState};

/// Raw user moderation submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct UserModerationForm {
    /// Target state, by name or numeric code.
    pub action: String,
}

/// Raw post moderation submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct PostModerationForm {
    /// Action keyword.
    pub action: String,
    /// Free-text justification.
    #[serde(default)]
    pub comment: String,
}

/// Moderation actions on a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostAction {
    /// Reopen a closed or deleted post.
    Open,
    /// Close the post, recording why.
    Close {
        /// Justification shown in the log.
        comment: String,
    },
    /// Soft delete the post.
    Delete,
    /// Move the post to the top of the rank ordering.
    Bump,
}

impl PostAction {
    /// Description written to the moderation log.
    pub fn log_text(&self) -> String {
        match self {
            Self::Open => "opened post".to_owned(),
            Self::Close { comment } => format!("closed post: {comment}"),
            Self::Delete => "deleted post".to_owned(),
            Self::Bump => "bumped post".to_owned(),
        }
    }
}

/// Maximum length of a moderation comment.
pub const COMMENT_MAX: usize = 200;

/// Validate a user moderation submission by `actor` against `target`.
pub fn validate_user_moderation(
    actor: &Profile,
    target: &Profile,
    form: &UserModerationForm,
) -> Result<ProfileState, FormErrors> {
    let mut errors = FormErrors::new();
    let state = match form.action.parse::<ProfileState>() {
        Ok(state) => Some(state),
        Err(_) => {
            errors.add_field("action", "select a valid choice");
            None
        }
    };
    if !actor.is_moderator() {
        errors.add_non_field("you need moderator rights to do that");
    }
    if actor.user_id == target.user_id {
        errors.add_non_field("you can not moderate yourself");
    }
    if target.is_moderator() && !actor.is_manager() {
        errors.add_non_field("only managers can moderate other moderators");
    }
    match state {
        Some(state) => errors.finish(state),
        None => Err(errors),
    }
}

/// Validate a post moderation submission.
pub fn validate_post_moderation(form: &PostModerationForm) -> Result<PostAction, FormErrors> {
    let mut errors = FormErrors::new();
    let comment = form.comment.trim();
    if comment.chars().count() > COMMENT_MAX {
        errors.add_field("comment", format!("comment must be at most {COMMENT_MAX} characters"));
    }
    let action = match form.action.trim().to_lowercase().as_str() {
        "open" => Some(PostAction::Open),
        "close" if comment.is_empty() => {
            errors.add_field("comment", "closing a post requires a comment");
            None
        }
        "close" => Some(PostAction::Close {
            comment: comment.to_owned(),
        }),
        "delete" => Some(PostAction::Delete),
        "bump" => Some(PostAction::Bump),
        _ => {
            errors.add_field("action", "select a valid choice");
            None
        }
    };
    match action {
        Some(action) => errors.finish(action),
        None => Err(errors),
    }
}
