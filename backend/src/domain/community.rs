//! Member directory listing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use pagination::{Page, PageRequest, PageSize};

use super::cached_pagination::CachedPaginator;
use super::listing::TimeWindow;
use super::ports::ProfileRepository;
use super::{Error, Profile, ProfileState};

/// Members shown on each directory page.
pub const COMMUNITY_PAGE_SIZE: PageSize = match PageSize::new(60) {
    Ok(size) => size,
    Err(_) => panic!("community page size must be non-zero"),
};

/// Shortest free-text filter that is applied.
pub const COMMUNITY_QUERY_MIN: usize = 3;

/// Directory ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommunityOrder {
    /// Most recent login first.
    #[default]
    Visit,
    /// Highest score first.
    Reputation,
    /// Newest members first.
    Joined,
}

impl CommunityOrder {
    /// Parse an ordering keyword; unknown keywords select the default.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_lowercase()).as_deref() {
            Some("reputation") => Self::Reputation,
            Some("date" | "joined") => Self::Joined,
            _ => Self::Visit,
        }
    }

    /// Canonical keyword.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Visit => "visit",
            Self::Reputation => "reputation",
            Self::Joined => "joined",
        }
    }
}

/// Which members to list.
///
/// Only `New` and `Trusted` members are ever listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityQuery {
    /// Ordering.
    pub order: CommunityOrder,
    /// Only members who logged in after this instant.
    pub active_since: Option<DateTime<Utc>>,
    /// Case-insensitive name filter.
    pub text: Option<String>,
}

impl CommunityQuery {
    /// States visible in the directory.
    pub const LISTED_STATES: [ProfileState; 2] = [ProfileState::New, ProfileState::Trusted];

    /// Build a query, ignoring text filters shorter than
    /// [`COMMUNITY_QUERY_MIN`] characters.
    pub fn new(order: CommunityOrder, active_since: Option<DateTime<Utc>>, text: Option<&str>) -> Self {
        let text = text
            .map(str::trim)
            .filter(|value| value.chars().count() >= COMMUNITY_QUERY_MIN)
            .map(str::to_lowercase);
        Self {
            order,
            active_since,
            text,
        }
    }

    /// Whether `profile` satisfies the query.
    pub fn matches(&self, profile: &Profile) -> bool {
        Self::LISTED_STATES.contains(&profile.state)
            && self
                .active_since
                .is_none_or(|since| profile.last_login.is_some_and(|login| login > since))
            && self
                .text
                .as_deref()
                .is_none_or(|text| profile.name.to_lowercase().contains(text))
    }
}

/// Raw directory parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommunityRequest {
    /// Ordering keyword.
    pub order: Option<String>,
    /// Time window keyword applied to the last login.
    pub limit: Option<String>,
    /// Name filter.
    pub query: Option<String>,
    /// Requested page.
    pub page: PageRequest,
}

/// Lists members. Counts are never cached because the name filter makes
/// them unstable.
#[derive(Clone)]
pub struct CommunityService {
    profiles: Arc<dyn ProfileRepository>,
    paginator: CachedPaginator,
    clock: Arc<dyn Clock>,
}

impl CommunityService {
    /// Create the service; the paginator is re-sized to
    /// [`COMMUNITY_PAGE_SIZE`].
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        paginator: &CachedPaginator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            profiles,
            paginator: paginator.with_page_size(COMMUNITY_PAGE_SIZE),
            clock,
        }
    }

    /// One page of the directory.
    pub async fn list(&self, request: &CommunityRequest) -> Result<Page<Profile>, Error> {
        let window = TimeWindow::parse(request.limit.as_deref());
        let query = CommunityQuery::new(
            CommunityOrder::parse(request.order.as_deref()),
            window.cutoff(self.clock.utc()),
            request.query.as_deref(),
        );
        let profiles = &self.profiles;
        let query_ref = &query;
        self.paginator
            .paginate(
                "",
                request.page,
                move || async move { profiles.count_community(query_ref).await.map_err(Error::from) },
                move |page_window| async move {
                    profiles
                        .list_community(query_ref, page_window)
                        .await
                        .map_err(Error::from)
                },
            )
            .await
    }
}
