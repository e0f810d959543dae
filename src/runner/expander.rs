//! Loads more content when the visible set is exhausted.

use std::time::Duration;

use crate::error::Result;
use crate::pacing::Clock;
use crate::view::View;

/// Scroll-to-load trigger followed by a fixed settle wait.
#[derive(Debug, Clone, Copy)]
pub struct ViewExpander {
    settle: Duration,
}

impl ViewExpander {
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }

    /// Ask the view for more items, then wait for them to render.
    ///
    /// The settle wait happens even if the request failed.
    pub async fn expand<V, C>(&self, view: &V, clock: &C) -> Result<()>
    where
        V: View + ?Sized,
        C: Clock + ?Sized,
    {
        let requested = view.expand().await;
        clock.sleep(self.settle).await;
        requested?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::ManualClock;
    use crate::profile::ActionProfile;
    use crate::view::{FeedItem, FeedScript, MemoryView};

    #[tokio::test]
    async fn test_expand_renders_and_settles() {
        let profile = ActionProfile::delete();
        let script = FeedScript::new((0..4).map(|i| FeedItem::owned(format!("p{}", i))).collect()).paged(2);
        let view = MemoryView::new(&profile, script);
        let clock = ManualClock::new();

        ViewExpander::new(Duration::from_millis(3000))
            .expand(&view, &clock)
            .await
            .unwrap();

        assert_eq!(view.rendered_ids().len(), 4);
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(3000)]);
    }
}
