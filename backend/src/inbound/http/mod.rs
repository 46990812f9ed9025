//! HTTP inbound adapter: forum pages, the JSON login and vote endpoints, and
//! health checks.
//!
//! Page handlers answer with a JSON document or a `303 See Other`; failures
//! are flashed into the session and redirected (see [`page`]).

use actix_web::web;

pub mod accounts;
pub mod badges;
pub mod error;
pub mod health;
pub mod listings;
pub mod moderation;
pub mod page;
pub mod posts;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;

pub use error::ApiResult;

/// Register every forum route. Health checks are mounted by the server.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(listings::latest)
        .service(listings::topic_posts)
        .service(listings::personal)
        .service(listings::list_tags)
        .service(listings::community)
        .service(listings::search)
        .service(posts::view_thread)
        .service(posts::create_answer)
        .service(posts::create_post)
        .service(posts::cast_vote)
        .service(accounts::login)
        .service(accounts::login_page)
        .service(accounts::signup)
        .service(accounts::logout)
        .service(accounts::view_profile)
        .service(accounts::edit_profile)
        .service(accounts::moderate_user)
        .service(badges::list_badges)
        .service(badges::view_badge)
        .service(moderation::moderate_post)
        .service(moderation::mark_spam)
        .service(moderation::release_quarantine)
        .service(moderation::moderation_logs);
}
