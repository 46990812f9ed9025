//! Where a completed action sends the user next.

use super::{PostId, ProfileUid};

/// Destination after a state-changing action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// The latest listing.
    Home,
    /// The moderator spam queue.
    SpamQueue,
    /// A thread.
    Post(PostId),
    /// A member profile.
    Profile(ProfileUid),
}
