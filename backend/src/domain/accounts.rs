//! Account use-cases: sign-up, login, viewer resolution and profiles.

use std::sync::Arc;

use mockable::Clock;
use serde::Deserialize;
use tracing::{debug, info};
use utoipa::ToSchema;

use super::authorization::require_active_member;
use super::ports::{CredentialHasher, NewAccount, ProfileRepository};
use super::{
    Error, FormErrors, LoginCredentials, Profile, ProfileState, ProfileUid, UserId, Viewer,
    validate_signup,
};

/// Longest display name.
pub const NAME_MAX: usize = 100;

/// Raw sign-up submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct SignupForm {
    /// Contact address; its local part becomes the username.
    pub email: String,
    /// Optional display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Password.
    pub password1: String,
    /// Password confirmation.
    pub password2: String,
}

/// Raw profile edit submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    /// Display name.
    pub name: String,
    /// Comma separated watched tags.
    #[serde(default)]
    pub my_tags: String,
}

fn normalise_tags(raw: &str) -> String {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',') {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags.join(",")
}

/// Validate a profile edit, returning the trimmed name and normalised tags.
pub fn validate_profile_form(form: &ProfileForm) -> Result<(String, String), FormErrors> {
    let mut errors = FormErrors::new();
    let name = form.name.trim();
    if name.is_empty() {
        errors.add_field("name", "name must not be empty");
    } else if name.chars().count() > NAME_MAX {
        errors.add_field("name", format!("name must be at most {NAME_MAX} characters"));
    }
    errors.finish((name.to_owned(), normalise_tags(&form.my_tags)))
}

/// Account use-cases.
#[derive(Clone)]
pub struct AccountService {
    profiles: Arc<dyn ProfileRepository>,
    hasher: Arc<dyn CredentialHasher>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    /// Create the service.
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        hasher: Arc<dyn CredentialHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            profiles,
            hasher,
            clock,
        }
    }

    /// Register a member. The profile is created with the user.
    pub async fn signup(&self, form: &SignupForm) -> Result<Profile, Error> {
        let request = validate_signup(
            &form.email,
            form.name.as_deref(),
            &form.password1,
            &form.password2,
        )?;
        let password_hash = self.hasher.hash(request.password.as_str())?;
        let profile = Profile::new_member(UserId::random(), request.name, self.clock.utc());
        let created = self
            .profiles
            .create_account(NewAccount {
                username: request.username,
                email: request.email,
                password_hash,
                profile,
            })
            .await?;
        info!(user_id = %created.user_id, uid = %created.uid, "member signed up");
        Ok(created)
    }

    /// Check credentials and record the login.
    ///
    /// Unknown users and wrong passwords are indistinguishable to the caller.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<Profile, Error> {
        let invalid = || Error::unauthorized("invalid username or password");
        let stored = self
            .profiles
            .find_credentials(credentials.username())
            .await?
            .ok_or_else(invalid)?;
        if !self.hasher.verify(credentials.password(), &stored.password_hash) {
            debug!(user_id = %stored.user_id, "password mismatch");
            return Err(invalid());
        }
        let mut profile = self
            .profiles
            .find_by_user(stored.user_id)
            .await?
            .ok_or_else(invalid)?;
        if profile.state == ProfileState::Banned {
            return Err(Error::forbidden("this account has been banned"));
        }

        let now = self.clock.utc();
        self.profiles.touch_login(profile.user_id, now).await?;
        profile.last_login = Some(now);
        info!(user_id = %profile.user_id, "member logged in");
        Ok(profile)
    }

    /// Turn a session user id into a viewer. Stale ids become anonymous.
    pub async fn resolve_viewer(&self, user_id: Option<UserId>) -> Result<Viewer, Error> {
        let Some(user_id) = user_id else {
            return Ok(Viewer::Anonymous);
        };
        Ok(self
            .profiles
            .find_by_user(user_id)
            .await?
            .map_or(Viewer::Anonymous, Viewer::Member))
    }

    /// Public profile by uid.
    pub async fn profile(&self, uid: &str) -> Result<Profile, Error> {
        let missing = || Error::not_found("user does not exist");
        let uid = ProfileUid::new(uid).ok_or_else(missing)?;
        self.profiles.find_by_uid(&uid).await?.ok_or_else(missing)
    }

    /// Edit the viewer's own display name and watched tags.
    pub async fn update_details(&self, viewer: &Viewer, form: &ProfileForm) -> Result<Profile, Error> {
        let member = require_active_member(viewer)?;
        let (name, my_tags) = validate_profile_form(form)?;
        self.profiles
            .update_details(member.user_id, &name, &my_tags)
            .await?;
        let mut updated = member.clone();
        updated.name = name;
        updated.my_tags = my_tags;
        Ok(updated)
    }
}
