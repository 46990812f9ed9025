//! Starter content for development deployments: an administrator account
//! and a pair of welcome posts.

use mockable::Clock;
use tracing::info;

use super::ports::{CredentialHasher, NewAccount, PostRepository, ProfileRepository};
use super::{EmailAddress, Error, NewPost, PostType, Profile, ProfileState, Role, UserId};

/// Login name of the seeded administrator.
pub const ADMIN_USERNAME: &str = "admin";

/// Posts written by the administrator when it is first created.
pub const WELCOME_POSTS: &[(PostType, &str, &str)] = &[
    (
        PostType::Blog,
        "Welcome to the forum!",
        "A short description of the forum and how to use it.",
    ),
    (
        PostType::Tutorial,
        "Get started with the site",
        "This is a test post.",
    ),
];

/// Credentials of the administrator to seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminAccount {
    pub email: EmailAddress,
    pub password: String,
}

/// Storage and services used while seeding.
pub struct DemoContentPorts<'a> {
    pub profiles: &'a dyn ProfileRepository,
    pub posts: &'a dyn PostRepository,
    pub hasher: &'a dyn CredentialHasher,
    pub clock: &'a dyn Clock,
}

/// Create the administrator and its welcome posts unless an account with
/// the administrator's email already exists.
///
/// Returns the new administrator, or `None` when nothing was created.
pub async fn seed_demo_content(
    ports: DemoContentPorts<'_>,
    admin: &AdminAccount,
) -> Result<Option<Profile>, Error> {
    if ports.profiles.find_credentials(admin.email.as_str()).await?.is_some() {
        return Ok(None);
    }
    let now = ports.clock.utc();
    let mut profile = Profile::new_member(UserId::random(), ADMIN_USERNAME, now);
    profile.role = Role::Manager;
    profile.state = ProfileState::Trusted;
    let created = ports
        .profiles
        .create_account(NewAccount {
            username: ADMIN_USERNAME.to_owned(),
            email: admin.email.clone(),
            password_hash: ports.hasher.hash(&admin.password)?,
            profile,
        })
        .await?;
    info!(user_id = %created.user_id, "administrator created");

    for (post_type, title, content) in WELCOME_POSTS {
        let post = ports
            .posts
            .insert(NewPost::root(created.user_id, *post_type, *title, *content, Vec::new(), now))
            .await?;
        info!(post_id = %post.id, post_type = post_type.as_str(), "welcome post created");
    }
    Ok(Some(created))
}
