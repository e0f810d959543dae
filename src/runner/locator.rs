//! Finds the next actionable item.
//!
//! Discovery is polling: the view is re-queried on every call instead of
//! subscribing to change notifications.

use std::collections::HashSet;

use crate::domain::ItemRef;
use crate::error::Result;
use crate::view::{Scope, Selector, View};

/// Returns the first candidate in document order that has not been processed.
#[derive(Debug, Clone)]
pub struct ElementLocator {
    candidate: Selector,
    retired: HashSet<ItemRef>,
}

impl ElementLocator {
    pub fn new(candidate: Selector) -> Self {
        Self {
            candidate,
            retired: HashSet::new(),
        }
    }

    /// Next candidate, or `None` when the view currently shows nothing actionable.
    ///
    /// Reads only; calling it twice without a mutation in between yields the same item.
    pub async fn locate_next<V: View + ?Sized>(&self, view: &V) -> Result<Option<ItemRef>> {
        let found = view.query_all(&self.candidate, Scope::Document).await?;
        Ok(found
            .into_iter()
            .map(ItemRef::new)
            .find(|item| !self.retired.contains(item)))
    }

    /// Exclude an item from every future result, even if the view still shows it.
    pub fn retire(&mut self, item: &ItemRef) {
        self.retired.insert(item.clone());
    }

    pub fn is_retired(&self, item: &ItemRef) -> bool {
        self.retired.contains(item)
    }

    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }
}
