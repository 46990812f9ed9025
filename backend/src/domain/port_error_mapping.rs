//! Translate port errors into domain [`Error`] values.
//!
//! Connection failures become `ServiceUnavailable`; everything else is an
//! internal error whose message is redacted by the HTTP adapter.

use super::Error;
use super::ports::{
    BadgeRepositoryError, CredentialHashError, JobDispatchError, ModerationLogError,
    PostRepositoryError, ProfileRepositoryError, TagRepositoryError, VoteRepositoryError,
};

impl From<PostRepositoryError> for Error {
    fn from(value: PostRepositoryError) -> Self {
        match value {
            PostRepositoryError::Connection { message } => Error::service_unavailable(message),
            PostRepositoryError::Query { message } => Error::internal(message),
        }
    }
}

impl From<ProfileRepositoryError> for Error {
    fn from(value: ProfileRepositoryError) -> Self {
        match value {
            ProfileRepositoryError::Connection { message } => Error::service_unavailable(message),
            ProfileRepositoryError::Query { message } => Error::internal(message),
            ProfileRepositoryError::Duplicate { message } => Error::conflict(message),
        }
    }
}

impl From<VoteRepositoryError> for Error {
    fn from(value: VoteRepositoryError) -> Self {
        match value {
            VoteRepositoryError::Connection { message } => Error::service_unavailable(message),
            VoteRepositoryError::Query { message } => Error::internal(message),
        }
    }
}

impl From<TagRepositoryError> for Error {
    fn from(value: TagRepositoryError) -> Self {
        match value {
            TagRepositoryError::Connection { message } => Error::service_unavailable(message),
            TagRepositoryError::Query { message } => Error::internal(message),
        }
    }
}

impl From<BadgeRepositoryError> for Error {
    fn from(value: BadgeRepositoryError) -> Self {
        match value {
            BadgeRepositoryError::Connection { message } => Error::service_unavailable(message),
            BadgeRepositoryError::Query { message } => Error::internal(message),
        }
    }
}

impl From<ModerationLogError> for Error {
    fn from(value: ModerationLogError) -> Self {
        match value {
            ModerationLogError::Connection { message } => Error::service_unavailable(message),
            ModerationLogError::Query { message } => Error::internal(message),
            ModerationLogError::MissingTarget { message } => Error::not_found(message),
        }
    }
}

impl From<JobDispatchError> for Error {
    fn from(value: JobDispatchError) -> Self {
        match value {
            JobDispatchError::Unavailable { message } => Error::service_unavailable(message),
            JobDispatchError::Rejected { message } => Error::internal(message),
        }
    }
}

impl From<CredentialHashError> for Error {
    fn from(value: CredentialHashError) -> Self {
        Error::internal(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(PostRepositoryError::connection("down").into(), ErrorCode::ServiceUnavailable)]
    #[case(PostRepositoryError::query("syntax").into(), ErrorCode::InternalError)]
    #[case(ProfileRepositoryError::duplicate("ada").into(), ErrorCode::Conflict)]
    #[case(JobDispatchError::rejected("bad").into(), ErrorCode::InternalError)]
    fn maps_port_errors(#[case] error: Error, #[case] expected: ErrorCode) {
        assert_eq!(error.code(), expected);
    }
}
