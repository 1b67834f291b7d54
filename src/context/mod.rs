//! Request/process-scoped context.
//!
//! The [`ContextStore`] holds the ambient data that every event built in its scope
//! inherits: user, tags, extra, request and breadcrumbs. It is an explicit handle,
//! threaded through capture calls, never a global.
//!
//! ## Scoping
//! ```text
//! Client::context()  (process scope, lives as long as the client)
//!      │
//!      ├── fork() ──► request scope A  (created at request entry, dropped at exit)
//!      └── fork() ──► request scope B
//! ```
//! A fork starts as a copy of its parent; writes to the fork never reach the
//! parent or sibling scopes.

mod store;

pub use store::{ContextSnapshot, ContextStore};
