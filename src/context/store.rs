use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::error::BuildError;
use crate::protocol::{Breadcrumb, Request};

/// Point-in-time copy of a [`ContextStore`], read by the event builder.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContextSnapshot {
    pub user: Map<String, Value>,
    pub tags: Map<String, Value>,
    pub extra: Map<String, Value>,
    pub request: Request,
    /// Oldest first.
    pub breadcrumbs: Vec<Breadcrumb>,
}

#[derive(Debug, Default)]
struct ContextData {
    user: Map<String, Value>,
    tags: Map<String, Value>,
    extra: Map<String, Value>,
    request: Request,
    breadcrumbs: VecDeque<Breadcrumb>,
}

/// Shared, cheaply cloneable context handle.
///
/// Clones share the same underlying data; use [`ContextStore::fork`] for an
/// independent child scope. Reads and writes take a short `parking_lot` lock and
/// never await.
#[derive(Clone, Debug)]
pub struct ContextStore {
    inner: Arc<RwLock<ContextData>>,
    max_breadcrumbs: usize,
}

impl ContextStore {
    /// Creates an empty store keeping at most `max_breadcrumbs` breadcrumbs.
    pub fn new(max_breadcrumbs: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ContextData::default())),
            max_breadcrumbs,
        }
    }

    /// Merges `user` into the user context (new keys override).
    pub fn set_user_context(&self, user: Map<String, Value>) {
        self.inner.write().user.extend(user);
    }

    /// Merges `tags` into the tags context (new keys override).
    pub fn set_tags_context(&self, tags: Map<String, Value>) {
        self.inner.write().tags.extend(tags);
    }

    /// Merges `extra` into the extra context (new keys override).
    pub fn set_extra_context(&self, extra: Map<String, Value>) {
        self.inner.write().extra.extend(extra);
    }

    /// Validates `request` and merges it into the request context.
    ///
    /// ### Errors
    /// [`BuildError::UnknownRequestField`] if the map has a key outside the known
    /// request fields; the stored context is left untouched.
    pub fn set_request_context(&self, request: Map<String, Value>) -> Result<(), BuildError> {
        let request = Request::from_map(request)?;
        let mut data = self.inner.write();
        let current = std::mem::take(&mut data.request);
        data.request = current.merge(request);
        Ok(())
    }

    /// Appends a breadcrumb, dropping the oldest once the cap is reached.
    pub fn add_breadcrumb(&self, crumb: Breadcrumb) {
        if self.max_breadcrumbs == 0 {
            return;
        }
        let mut data = self.inner.write();
        while data.breadcrumbs.len() >= self.max_breadcrumbs {
            data.breadcrumbs.pop_front();
        }
        data.breadcrumbs.push_back(crumb);
    }

    /// Clears every field of this scope.
    pub fn clear_all(&self) {
        *self.inner.write() = ContextData::default();
    }

    /// Copies the current state.
    pub fn snapshot(&self) -> ContextSnapshot {
        let data = self.inner.read();
        ContextSnapshot {
            user: data.user.clone(),
            tags: data.tags.clone(),
            extra: data.extra.clone(),
            request: data.request.clone(),
            breadcrumbs: data.breadcrumbs.iter().cloned().collect(),
        }
    }

    /// Creates an independent child scope seeded with the current state.
    pub fn fork(&self) -> Self {
        let data = self.inner.read();
        let copy = ContextData {
            user: data.user.clone(),
            tags: data.tags.clone(),
            extra: data.extra.clone(),
            request: data.request.clone(),
            breadcrumbs: data.breadcrumbs.clone(),
        };
        Self {
            inner: Arc::new(RwLock::new(copy)),
            max_breadcrumbs: self.max_breadcrumbs,
        }
    }
}
