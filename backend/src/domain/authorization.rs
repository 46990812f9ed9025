//! Composable request guards.
//!
//! Each guard inspects the [`Viewer`] and either hands back the member profile
//! or an [`AccessDenied`] reason. Handlers call them first and map a denial to
//! a flash message and redirect.

use super::{Error, Profile, Viewer};

/// Why a guard refused access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    /// The viewer is anonymous.
    #[error("you must be logged in to do that")]
    LoginRequired,
    /// The viewer is a member without moderation rights.
    #[error("you need moderator rights to do that")]
    ModeratorRequired,
    /// The member is suspended or banned.
    #[error("your account is not allowed to do that")]
    AccountInactive,
}

/// Require a logged-in member.
pub fn require_member(viewer: &Viewer) -> Result<&Profile, AccessDenied> {
    viewer.profile().ok_or(AccessDenied::LoginRequired)
}

/// Require a logged-in member who is neither suspended nor banned.
pub fn require_active_member(viewer: &Viewer) -> Result<&Profile, AccessDenied> {
    let profile = require_member(viewer)?;
    if profile.state.is_active() {
        Ok(profile)
    } else {
        Err(AccessDenied::AccountInactive)
    }
}

/// Require a logged-in moderator.
pub fn require_moderator(viewer: &Viewer) -> Result<&Profile, AccessDenied> {
    let profile = require_member(viewer)?;
    if profile.is_moderator() {
        Ok(profile)
    } else {
        Err(AccessDenied::ModeratorRequired)
    }
}

impl From<AccessDenied> for Error {
    fn from(value: AccessDenied) -> Self {
        match value {
            AccessDenied::LoginRequired => Error::unauthorized(value.to_string()),
            AccessDenied::ModeratorRequired | AccessDenied::AccountInactive => {
                Error::forbidden(value.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode, ProfileState, Role, UserId};
    use chrono::Utc;
    use rstest::rstest;

    fn member(role: Role, state: ProfileState) -> Viewer {
        let mut profile = Profile::new_member(UserId::random(), "Ada", Utc::now());
        profile.role = role;
        profile.state = state;
        Viewer::Member(profile)
    }

    #[rstest]
    fn anonymous_viewers_need_login() {
        assert_eq!(require_member(&Viewer::Anonymous), Err(AccessDenied::LoginRequired));
        assert_eq!(require_moderator(&Viewer::Anonymous), Err(AccessDenied::LoginRequired));
    }

    #[rstest]
    #[case(Role::Regular, false)]
    #[case(Role::Moderator, true)]
    #[case(Role::Manager, true)]
    fn moderator_guard_checks_role(#[case] role: Role, #[case] granted: bool) {
        let viewer = member(role, ProfileState::Trusted);
        assert_eq!(require_moderator(&viewer).is_ok(), granted);
    }

    #[rstest]
    #[case(ProfileState::New, true)]
    #[case(ProfileState::Suspended, false)]
    #[case(ProfileState::Banned, false)]
    fn active_guard_checks_state(#[case] state: ProfileState, #[case] granted: bool) {
        let viewer = member(Role::Regular, state);
        assert_eq!(require_active_member(&viewer).is_ok(), granted);
    }

    #[rstest]
    fn denials_map_to_error_codes() {
        assert_eq!(Error::from(AccessDenied::LoginRequired).code(), ErrorCode::Unauthorized);
        assert_eq!(Error::from(AccessDenied::ModeratorRequired).code(), ErrorCode::Forbidden);
    }
}
