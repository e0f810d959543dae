//! View trait and the types it speaks in.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ElementRef;

/// A query understood by the view (a CSS selector for browser views).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selector(String);

impl Selector {
    pub fn new(selector: impl Into<String>) -> Self {
        Self(selector.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a query looks.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    /// The whole document, in document order
    Document,
    /// Only descendants of one element
    Within(&'a ElementRef),
}

/// Errors reported by view implementations.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The referenced element is no longer attached
    #[error("element detached: {0}")]
    Detached(String),

    /// The interaction was attempted but failed
    #[error("interaction failed: {0}")]
    Interaction(String),

    /// Talking to the backing document failed
    #[error("transport: {0}")]
    Transport(String),
}

/// Live, mutable, partially observable list of items.
///
/// Reads have no side effects. Handles returned by queries are valid until the
/// next mutation (`trigger`, `remove`, `dismiss_overlays`, `expand`).
#[async_trait]
pub trait View: Send + Sync {
    /// First element matching `selector` in document order.
    async fn query_first(&self, selector: &Selector, scope: Scope<'_>) -> Result<Option<ElementRef>, ViewError>;

    /// Every element matching `selector`, in document order.
    async fn query_all(&self, selector: &Selector, scope: Scope<'_>) -> Result<Vec<ElementRef>, ViewError>;

    /// Move focus to an element.
    async fn focus(&self, element: &ElementRef) -> Result<(), ViewError>;

    /// Perform a UI trigger (click) on an element.
    async fn trigger(&self, element: &ElementRef) -> Result<(), ViewError>;

    /// Visible text of an element.
    async fn read_label(&self, element: &ElementRef) -> Result<String, ViewError>;

    /// Detach an element so it is never returned again.
    async fn remove(&self, element: &ElementRef) -> Result<(), ViewError>;

    /// Close open menus and popups (click on an empty area).
    async fn dismiss_overlays(&self) -> Result<(), ViewError>;

    /// Ask for more content (scroll-to-load).
    async fn expand(&self) -> Result<(), ViewError>;
}
