//! Session-aware route guarding.
//!
//! The guard holds no session state of its own: validity is delegated to
//! the external auth provider, and the guard only forwards or refreshes the
//! cookies that provider sets.

pub mod guard;
pub mod provider;

pub use guard::{session_guard, RouteClass, RouteMatcher};
pub use provider::{
    HttpSessionProvider, NullSessionProvider, SessionError, SessionLookup, SessionProvider,
    SessionUser,
};
