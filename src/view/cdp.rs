//! Live browser tab driven over the DevTools protocol.
//!
//! Elements are addressed by a `data-feedsweep-ref` attribute stamped on them
//! the first time a query returns them, so handles survive across evaluations
//! until the node leaves the DOM.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;

use super::traits::{Scope, Selector, View, ViewError};
use crate::domain::ElementRef;

/// Shared JS prelude: resolve a ref, stamp fresh refs on query results.
const PRELUDE: &str = r#"
const __fsAttr = 'data-feedsweep-ref';
const __fsFind = (r) => document.querySelector('[' + __fsAttr + '="' + r + '"]');
const __fsStamp = (el) => {
  if (!el.hasAttribute(__fsAttr)) {
    window.__fsNext = (window.__fsNext || 0) + 1;
    el.setAttribute(__fsAttr, 'fs-' + window.__fsNext);
  }
  return el.getAttribute(__fsAttr);
};
"#;

pub struct CdpView {
    _browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    closed: Arc<AtomicBool>,
}

impl CdpView {
    /// Attach to an already running browser and pick the tab whose URL contains `page_match`.
    pub async fn connect(ws_url: &str, page_match: Option<&str>) -> Result<Self, ViewError> {
        let (browser, handler) = Browser::connect(ws_url.to_string())
            .await
            .map_err(|e| ViewError::Transport(format!("connect {}: {}", ws_url, e)))?;

        let closed = Arc::new(AtomicBool::new(false));
        let handler_task = spawn_handler_task(handler, Arc::clone(&closed));

        let pages = browser
            .pages()
            .await
            .map_err(|e| ViewError::Transport(format!("list pages: {}", e)))?;

        let mut selected = None;
        for page in pages {
            let url = page.url().await.ok().flatten().unwrap_or_default();
            if page_match.is_none_or(|needle| url.contains(needle)) {
                log::info!("Attached to tab {}", url);
                selected = Some(page);
                break;
            }
        }

        let page = selected.ok_or_else(|| {
            ViewError::Transport(format!("no open tab matches {:?}", page_match.unwrap_or("<any>")))
        })?;

        Ok(Self {
            _browser: browser,
            page,
            handler_task,
            closed,
        })
    }

    async fn eval<T: DeserializeOwned>(&self, body: String) -> Result<T, ViewError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ViewError::Transport("browser connection closed".into()));
        }
        let script = format!("(() => {{ {}\n{} }})()", PRELUDE, body);
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ViewError::Transport(e.to_string()))?;
        result
            .into_value::<T>()
            .map_err(|e| ViewError::Transport(format!("unexpected script result: {}", e)))
    }

    /// Run `action` (JS using `el`) against a referenced element.
    async fn on_element(&self, element: &ElementRef, action: &str) -> Result<(), ViewError> {
        let body = format!(
            "const el = __fsFind({}); if (!el) return false; {}; return true;",
            js_str(element.as_str()),
            action
        );
        match self.eval::<bool>(body).await? {
            true => Ok(()),
            false => Err(ViewError::Detached(element.to_string())),
        }
    }

    fn root_expr(scope: Scope<'_>) -> String {
        match scope {
            Scope::Document => "document".to_string(),
            Scope::Within(el) => format!("__fsFind({})", js_str(el.as_str())),
        }
    }
}

impl Drop for CdpView {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

#[async_trait]
impl View for CdpView {
    async fn query_first(&self, selector: &Selector, scope: Scope<'_>) -> Result<Option<ElementRef>, ViewError> {
        let body = format!(
            "const root = {}; if (!root) return null; \
             const el = root.querySelector({}); return el ? __fsStamp(el) : null;",
            Self::root_expr(scope),
            js_str(selector.as_str())
        );
        let found: Option<String> = self.eval(body).await?;
        Ok(found.map(ElementRef::new))
    }

    async fn query_all(&self, selector: &Selector, scope: Scope<'_>) -> Result<Vec<ElementRef>, ViewError> {
        let body = format!(
            "const root = {}; if (!root) return []; return Array.from(root.querySelectorAll({})).map(__fsStamp);",
            Self::root_expr(scope),
            js_str(selector.as_str())
        );
        let found: Vec<String> = self.eval(body).await?;
        Ok(found.into_iter().map(ElementRef::new).collect())
    }

    async fn focus(&self, element: &ElementRef) -> Result<(), ViewError> {
        self.on_element(element, "el.scrollIntoView({block: 'center'}); if (el.focus) el.focus()")
            .await
    }

    async fn trigger(&self, element: &ElementRef) -> Result<(), ViewError> {
        self.on_element(element, "el.click()").await
    }

    async fn read_label(&self, element: &ElementRef) -> Result<String, ViewError> {
        let body = format!(
            "const el = __fsFind({}); if (!el) return null; \
             return el.innerText || el.getAttribute('aria-label') || '';",
            js_str(element.as_str())
        );
        let label: Option<String> = self.eval(body).await?;
        label.ok_or_else(|| ViewError::Detached(element.to_string()))
    }

    async fn remove(&self, element: &ElementRef) -> Result<(), ViewError> {
        self.on_element(element, "el.remove()").await
    }

    async fn dismiss_overlays(&self) -> Result<(), ViewError> {
        let body = "document.dispatchEvent(new KeyboardEvent('keydown', {key: 'Escape', bubbles: true})); \
                    document.body.click(); return true;";
        self.eval::<bool>(body.to_string()).await.map(|_| ())
    }

    async fn expand(&self) -> Result<(), ViewError> {
        let body = "window.scrollTo(0, document.body.scrollHeight); return true;";
        self.eval::<bool>(body.to_string()).await.map(|_| ())
    }
}

fn spawn_handler_task(mut handler: chromiumoxide::Handler, closed: Arc<AtomicBool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                tracing::warn!(error = %e, "DevTools handler event error");
            }
        }
        closed.store(true, Ordering::SeqCst);
    })
}

/// Quote a Rust string as a JS string literal.
fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}
