//! Handles into the view.
//!
//! Handles are not owned by the core. They stay valid only until the next
//! mutation of the view, so they are cheap to clone and never cached across
//! iterations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque reference to one element of the view (a post, a button, a menu entry).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementRef(String);

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to one actionable item (an unlike-able or deletable entry).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemRef(ElementRef);

impl ItemRef {
    pub fn new(element: ElementRef) -> Self {
        Self(element)
    }

    /// The element backing this item.
    pub fn element(&self) -> &ElementRef {
        &self.0
    }
}

impl From<ElementRef> for ItemRef {
    fn from(element: ElementRef) -> Self {
        Self(element)
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_ref_display() {
        let item = ItemRef::new(ElementRef::new("post-3"));
        assert_eq!(item.to_string(), "item:post-3");
        assert_eq!(item.element().as_str(), "post-3");
    }

    #[test]
    fn test_element_ref_serializes_transparently() {
        let json = serde_json::to_string(&ElementRef::new("fs-12")).unwrap();
        assert_eq!(json, "\"fs-12\"");
    }
}
