//! Badge seeding and award listings.

use std::sync::Arc;

use pagination::{Page, PageRequest};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use super::cached_pagination::CachedPaginator;
use super::ports::{BadgeRepository, BadgeRepositoryError, ProfileRepository};
use super::{AwardDefinition, AwardRecord, Badge, BadgeId, BadgeWithCount, Error, ProfileUid};

/// Insert or refresh one badge per definition.
///
/// Badges are matched by name, so running this repeatedly leaves exactly one
/// row per definition carrying the latest description, icon and kind.
pub async fn seed_badges(
    badges: &dyn BadgeRepository,
    definitions: &[AwardDefinition],
) -> Result<Vec<Badge>, BadgeRepositoryError> {
    let mut seeded = Vec::with_capacity(definitions.len());
    for definition in definitions {
        seeded.push(badges.upsert(definition).await?);
    }
    info!(count = seeded.len(), "badges seeded");
    Ok(seeded)
}

/// A badge with one page of its awards.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BadgeDetail {
    /// The badge.
    pub badge: Badge,
    /// Uid filter applied to the awards, if any.
    pub user: Option<ProfileUid>,
    /// Awards, newest first.
    #[schema(value_type = Object)]
    pub awards: Page<AwardRecord>,
}

/// Read side of badges.
#[derive(Clone)]
pub struct BadgeService {
    badges: Arc<dyn BadgeRepository>,
    profiles: Arc<dyn ProfileRepository>,
    paginator: CachedPaginator,
}

impl BadgeService {
    /// Create the service.
    pub fn new(
        badges: Arc<dyn BadgeRepository>,
        profiles: Arc<dyn ProfileRepository>,
        paginator: CachedPaginator,
    ) -> Self {
        Self {
            badges,
            profiles,
            paginator,
        }
    }

    /// Every badge with its award count.
    pub async fn list(&self) -> Result<Vec<BadgeWithCount>, Error> {
        Ok(self.badges.list_with_counts().await?)
    }

    /// A badge and its awards, optionally limited to one member.
    pub async fn view(
        &self,
        badge_id: BadgeId,
        user: Option<&str>,
        page: PageRequest,
    ) -> Result<BadgeDetail, Error> {
        let badge = self
            .badges
            .find(badge_id)
            .await?
            .ok_or_else(|| Error::not_found("badge does not exist"))?;

        let filter = match user.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => {
                let uid = ProfileUid::new(raw).ok_or_else(|| Error::not_found("user does not exist"))?;
                let profile = self
                    .profiles
                    .find_by_uid(&uid)
                    .await?
                    .ok_or_else(|| Error::not_found("user does not exist"))?;
                Some(profile)
            }
            None => None,
        };
        let user_id = filter.as_ref().map(|profile| profile.user_id);
        let key = match &filter {
            Some(_) => String::new(),
            None => format!("awards-{badge_id}"),
        };

        let badges = &self.badges;
        let awards = self
            .paginator
            .paginate(
                &key,
                page,
                move || async move { badges.count_awards(badge_id, user_id).await.map_err(Error::from) },
                move |window| async move {
                    badges
                        .list_awards(badge_id, user_id, window)
                        .await
                        .map_err(Error::from)
                },
            )
            .await?;

        Ok(BadgeDetail {
            badge,
            user: filter.map(|profile| profile.uid),
            awards,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockBadgeRepository, MockCountCache, MockProfileRepository};
    use crate::domain::{AWARD_DEFINITIONS, BadgeKind, ErrorCode};
    use pagination::PageSize;
    use rstest::rstest;
    use std::time::Duration;

    fn badge(id: BadgeId, definition: &AwardDefinition) -> Badge {
        Badge {
            id,
            name: definition.name.to_owned(),
            description: definition.description.to_owned(),
            icon: definition.icon.to_owned(),
            kind: definition.kind,
        }
    }

    fn paginator(cache: MockCountCache) -> CachedPaginator {
        CachedPaginator::new(
            Arc::new(cache),
            Duration::from_secs(60),
            PageSize::new(10).expect("page size"),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn seeding_upserts_every_definition() {
        let mut badges = MockBadgeRepository::new();
        badges
            .expect_upsert()
            .times(AWARD_DEFINITIONS.len())
            .returning(|definition| Ok(badge(1, definition)));

        let seeded = seed_badges(&badges, AWARD_DEFINITIONS).await.expect("seeded");
        let names: Vec<_> = seeded.iter().map(|badge| badge.name.as_str()).collect();
        let expected: Vec<_> = AWARD_DEFINITIONS.iter().map(|definition| definition.name).collect();
        assert_eq!(names, expected);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_badge_is_not_found() {
        let mut badges = MockBadgeRepository::new();
        badges.expect_find().returning(|_| Ok(None));
        let service = BadgeService::new(
            Arc::new(badges),
            Arc::new(MockProfileRepository::new()),
            paginator(MockCountCache::new()),
        );
        let err = service
            .view(99, None, PageRequest::first())
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_user_filter_is_not_found() {
        let mut badges = MockBadgeRepository::new();
        badges.expect_find().returning(|id| {
            Ok(Some(Badge {
                id,
                name: "Student".to_owned(),
                description: String::new(),
                icon: String::new(),
                kind: BadgeKind::Bronze,
            }))
        });
        badges.expect_count_awards().never();
        let mut profiles = MockProfileRepository::new();
        profiles.expect_find_by_uid().returning(|_| Ok(None));
        let service = BadgeService::new(
            Arc::new(badges),
            Arc::new(profiles),
            paginator(MockCountCache::new()),
        );
        let err = service
            .view(1, Some("abcd1234"), PageRequest::first())
            .await
            .expect_err("missing user");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
