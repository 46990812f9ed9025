//! Validation of authoring forms.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{FormErrors, PostType};

/// Title length bounds, in characters.
pub const TITLE_MIN: usize = 10;
/// Upper title bound.
pub const TITLE_MAX: usize = 180;
/// Shortest accepted body.
pub const CONTENT_MIN: usize = 10;
/// Most tags a post may carry.
pub const TAGS_MAX: usize = 5;

/// Raw submission for a new thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostForm {
    /// Thread title.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Post type keyword.
    #[serde(default)]
    pub post_type: String,
    /// Comma or whitespace separated tags.
    #[serde(default)]
    pub tags: String,
}

/// Raw submission for a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct AnswerForm {
    /// Body text.
    pub content: String,
}

/// A validated thread submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanPost {
    /// Trimmed title.
    pub title: String,
    /// Trimmed body.
    pub content: String,
    /// Top-level type.
    pub post_type: PostType,
    /// Lowercased, de-duplicated tags.
    pub tags: Vec<String>,
}

fn split_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(|c: char| c == ',' || c.is_whitespace()) {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Validate a new thread. A blank type means a question.
pub fn validate_post_form(form: &PostForm) -> Result<CleanPost, FormErrors> {
    let mut errors = FormErrors::new();

    let title = form.title.trim();
    let title_len = title.chars().count();
    if !(TITLE_MIN..=TITLE_MAX).contains(&title_len) {
        errors.add_field(
            "title",
            format!("title must be between {TITLE_MIN} and {TITLE_MAX} characters"),
        );
    }

    let content = form.content.trim();
    if content.chars().count() < CONTENT_MIN {
        errors.add_field("content", format!("content must be at least {CONTENT_MIN} characters"));
    }

    let post_type = if form.post_type.trim().is_empty() {
        Some(PostType::Question)
    } else {
        form.post_type
            .parse::<PostType>()
            .ok()
            .filter(|kind| kind.is_toplevel())
    };
    if post_type.is_none() {
        errors.add_field("postType", "select a valid choice");
    }

    let tags = split_tags(&form.tags);
    if tags.is_empty() {
        errors.add_field("tags", "add at least one tag");
    } else if tags.len() > TAGS_MAX {
        errors.add_field("tags", format!("use at most {TAGS_MAX} tags"));
    }

    match post_type {
        Some(post_type) => errors.finish(CleanPost {
            title: title.to_owned(),
            content: content.to_owned(),
            post_type,
            tags,
        }),
        None => Err(errors),
    }
}

/// Validate a reply body.
pub fn validate_answer_form(form: &AnswerForm) -> Result<String, FormErrors> {
    let mut errors = FormErrors::new();
    let content = form.content.trim();
    if content.chars().count() < CONTENT_MIN {
        errors.add_field("content", format!("content must be at least {CONTENT_MIN} characters"));
    }
    errors.finish(content.to_owned())
}
