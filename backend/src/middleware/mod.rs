//! Actix middleware shared by every forum route.

pub mod trace;

pub use trace::Trace;
