//! Generated feeds for dry runs against `MemoryView`.

use crate::profile::ProfileKind;
use crate::view::{FeedItem, FeedScript, InjectedFault};

/// Shape of a generated feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub items: u64,
    pub page_size: usize,
    /// Every Nth item (1-based) has no overflow control
    pub no_permission_every: Option<u64>,
    /// Every Nth item (1-based) fails when triggered
    pub fail_every: Option<u64>,
    /// Keep generating items forever
    pub infinite: bool,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            items: 20,
            page_size: 10,
            no_permission_every: None,
            fail_every: None,
            infinite: false,
        }
    }
}

impl Scenario {
    /// Build the feed script for `kind`.
    ///
    /// Unlike items carry no overflow control, so `no_permission_every` only
    /// shapes delete feeds.
    pub fn script(&self, kind: ProfileKind) -> FeedScript {
        let shape = self.clone();
        let make = move |n: u64| shape.item(kind, n);
        let items = (0..self.items).map(&make).collect();
        let script = FeedScript::new(items).paged(self.page_size);
        if self.infinite {
            let offset = self.items;
            script.endless(move |n| make(offset + n))
        } else {
            script
        }
    }

    fn item(&self, kind: ProfileKind, n: u64) -> FeedItem {
        let ordinal = n + 1;
        let id = format!("{}-{}", kind, ordinal);
        let hits = |every: Option<u64>| every.is_some_and(|m| m > 0 && ordinal % m == 0);

        let mut item = if kind == ProfileKind::Delete && hits(self.no_permission_every) {
            FeedItem::foreign(id)
        } else {
            FeedItem::owned(id)
        };
        if hits(self.fail_every) {
            item = item.with_fault(InjectedFault::Trigger);
        }
        item
    }
}
