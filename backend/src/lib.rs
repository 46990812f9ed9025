//! Community question and answer forum.
//!
//! - [`domain`]: entities, services and the ports they depend on.
//! - [`inbound`]: the actix-web adapter.
//! - [`outbound`]: PostgreSQL, Redis, search and in-memory adapters.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
