//! In-memory feed that behaves like a rendered timeline.
//!
//! Only part of the feed is rendered at a time; `expand` renders the next page,
//! like scrolling to the bottom of an infinite timeline. Items are scripted:
//! whether they carry an overflow control, what their menu shows, how the
//! confirmation looks, and where an interaction should blow up.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::traits::{Scope, Selector, View, ViewError};
use crate::domain::ElementRef;
use crate::profile::{label_matches, ActionProfile};

const DELETE_LABEL: &str = "Delete";
const CANCEL_LABEL: &str = "Cancel";

/// How a pending deletion can be confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmSurface {
    /// The dedicated confirmation control is present
    Canonical,
    /// Only generic buttons, one of them labeled "Delete"
    LabeledButton,
    /// No way to confirm
    Missing,
}

/// Interaction that fails for a scripted item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFault {
    Focus,
    Trigger,
    MenuEntry,
    Confirm,
}

/// One scripted entry of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub id: String,
    pub label: String,
    /// Carries an overflow control (the user's own post)
    pub has_control: bool,
    pub menu_entries: Vec<String>,
    pub confirm: ConfirmSurface,
    pub fault: Option<InjectedFault>,
    /// The delete entry only renders after the first menu scan
    pub late_menu: bool,
}

impl FeedItem {
    /// A post the user owns and can delete.
    pub fn owned(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: format!("post {}", id),
            id,
            has_control: true,
            menu_entries: vec!["Pin to your profile".to_string(), "Delete".to_string()],
            confirm: ConfirmSurface::Canonical,
            fault: None,
            late_menu: false,
        }
    }

    /// Someone else's post shown in the timeline: no overflow control.
    pub fn foreign(id: impl Into<String>) -> Self {
        Self {
            has_control: false,
            menu_entries: Vec::new(),
            ..Self::owned(id)
        }
    }

    /// Has a menu, but nothing in it deletes.
    pub fn without_delete(id: impl Into<String>) -> Self {
        Self {
            menu_entries: vec!["Not interested in this post".to_string(), "Mute".to_string()],
            ..Self::owned(id)
        }
    }

    pub fn with_confirm(mut self, confirm: ConfirmSurface) -> Self {
        self.confirm = confirm;
        self
    }

    pub fn with_fault(mut self, fault: InjectedFault) -> Self {
        self.fault = Some(fault);
        self
    }

    pub fn with_late_menu(mut self) -> Self {
        self.late_menu = true;
        self
    }
}

type ItemGenerator = Arc<dyn Fn(u64) -> FeedItem + Send + Sync>;

/// Content and paging of a `MemoryView`.
#[derive(Clone, Default)]
pub struct FeedScript {
    items: Vec<FeedItem>,
    page_size: Option<usize>,
    endless: Option<ItemGenerator>,
}

impl FeedScript {
    pub fn new(items: Vec<FeedItem>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// Render `size` items at a time.
    pub fn paged(mut self, size: usize) -> Self {
        self.page_size = Some(size.max(1));
        self
    }

    /// Keep producing items after the scripted ones run out.
    pub fn endless<F>(mut self, generator: F) -> Self
    where
        F: Fn(u64) -> FeedItem + Send + Sync + 'static,
    {
        self.endless = Some(Arc::new(generator));
        self
    }
}

/// Something that happened to the feed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Focused(String),
    Triggered(String),
    Removed(String),
    Dismissed,
    Expanded,
}

#[derive(Debug, Clone)]
struct Rendered {
    item: FeedItem,
    done: bool,
}

struct FeedState {
    rendered: Vec<Rendered>,
    pending: VecDeque<FeedItem>,
    page_size: Option<usize>,
    endless: Option<ItemGenerator>,
    generated: u64,
    open_menu: Option<String>,
    menu_scans: u32,
    dialog: Option<String>,
    completed: Vec<String>,
    events: Vec<ViewEvent>,
    expansions: u64,
}

impl FeedState {
    fn find(&self, id: &str) -> Option<&Rendered> {
        self.rendered.iter().find(|r| r.item.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Rendered> {
        self.rendered.iter_mut().find(|r| r.item.id == id)
    }

    fn render_page(&mut self) -> usize {
        let take = self.page_size.unwrap_or(usize::MAX);
        let mut added = 0;
        while added < take {
            let next = match self.pending.pop_front() {
                Some(item) => item,
                None => match &self.endless {
                    Some(generator) => {
                        let item = generator(self.generated);
                        self.generated += 1;
                        item
                    }
                    None => break,
                },
            };
            self.rendered.push(Rendered { item: next, done: false });
            added += 1;
            if self.endless.is_some() && self.pending.is_empty() && self.page_size.is_none() {
                break;
            }
        }
        added
    }

    fn complete(&mut self, id: &str, detach: bool) {
        if let Some(r) = self.find_mut(id) {
            r.done = true;
        }
        self.completed.push(id.to_string());
        if detach {
            self.rendered.retain(|r| r.item.id != id);
        }
    }
}

/// Parsed element handle.
enum Handle<'a> {
    Item(&'a str),
    Control(&'a str),
    MenuEntry(&'a str, usize),
    Confirm(&'a str),
    Button(&'a str, usize),
}

fn parse(element: &ElementRef) -> Option<Handle<'_>> {
    let mut parts = element.as_str().splitn(3, '/');
    let kind = parts.next()?;
    let id = parts.next()?;
    let index = parts.next().and_then(|n| n.parse::<usize>().ok());
    match (kind, index) {
        ("item", None) => Some(Handle::Item(id)),
        ("ctl", None) => Some(Handle::Control(id)),
        ("menu", Some(n)) => Some(Handle::MenuEntry(id, n)),
        ("confirm", None) => Some(Handle::Confirm(id)),
        ("button", Some(n)) => Some(Handle::Button(id, n)),
        _ => None,
    }
}

/// Scripted, paged, in-memory `View`.
pub struct MemoryView {
    profile: ActionProfile,
    state: Mutex<FeedState>,
}

impl MemoryView {
    /// Build a feed whose selectors follow `profile`, rendering the first page.
    pub fn new(profile: &ActionProfile, script: FeedScript) -> Self {
        let mut state = FeedState {
            rendered: Vec::new(),
            pending: script.items.into_iter().collect(),
            page_size: script.page_size,
            endless: script.endless,
            generated: 0,
            open_menu: None,
            menu_scans: 0,
            dialog: None,
            completed: Vec::new(),
            events: Vec::new(),
            expansions: 0,
        };
        state.render_page();
        Self {
            profile: profile.clone(),
            state: Mutex::new(state),
        }
    }

    /// Ids whose action took effect (unliked or deleted), in order.
    pub fn completed(&self) -> Vec<String> {
        self.state.lock().map(|s| s.completed.clone()).unwrap_or_default()
    }

    /// Ids currently attached to the view, in document order.
    pub fn rendered_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.rendered.iter().map(|r| r.item.id.clone()).collect())
            .unwrap_or_default()
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.state.lock().map(|s| s.events.clone()).unwrap_or_default()
    }

    pub fn expansions(&self) -> u64 {
        self.state.lock().map(|s| s.expansions).unwrap_or_default()
    }

    /// True when no menu or dialog is left open.
    pub fn is_settled(&self) -> bool {
        self.state
            .lock()
            .map(|s| s.open_menu.is_none() && s.dialog.is_none())
            .unwrap_or(false)
    }

    fn state(&self) -> Result<MutexGuard<'_, FeedState>, ViewError> {
        self.state
            .lock()
            .map_err(|_| ViewError::Transport("feed state poisoned".to_string()))
    }

    fn matches(&self, selector: &Selector, state: &mut FeedState, scope: Scope<'_>) -> Vec<ElementRef> {
        let item_scope = match scope {
            Scope::Document => None,
            Scope::Within(element) => match parse(element) {
                Some(Handle::Item(id)) => Some(id.to_string()),
                _ => return Vec::new(),
            },
        };

        if *selector == self.profile.candidate {
            if item_scope.is_some() {
                return Vec::new();
            }
            return state
                .rendered
                .iter()
                .filter(|r| !r.done)
                .map(|r| ElementRef::new(format!("item/{}", r.item.id)))
                .collect();
        }

        if self.profile.primary_control.as_ref() == Some(selector) {
            return state
                .rendered
                .iter()
                .filter(|r| r.item.has_control && !r.done)
                .filter(|r| item_scope.as_deref().is_none_or(|id| id == r.item.id))
                .map(|r| ElementRef::new(format!("ctl/{}", r.item.id)))
                .collect();
        }

        if item_scope.is_some() {
            return Vec::new();
        }

        if let Some(menu) = &self.profile.menu
            && menu.entries == *selector
        {
            let Some(open) = state.open_menu.clone() else {
                return Vec::new();
            };
            let first_scan = state.menu_scans == 0;
            state.menu_scans += 1;
            let Some(rendered) = state.find(&open) else {
                return Vec::new();
            };
            let hide_delete = rendered.item.late_menu && first_scan;
            return rendered
                .item
                .menu_entries
                .iter()
                .enumerate()
                .filter(|(_, label)| !(hide_delete && label_matches(label, &menu.needle)))
                .map(|(n, _)| ElementRef::new(format!("menu/{}/{}", open, n)))
                .collect();
        }

        if let Some(confirm) = &self.profile.confirm {
            let Some(dialog) = state.dialog.clone() else {
                return Vec::new();
            };
            let surface = state
                .find(&dialog)
                .map(|r| r.item.confirm)
                .unwrap_or(ConfirmSurface::Missing);
            if confirm.canonical == *selector {
                return match surface {
                    ConfirmSurface::Canonical => vec![ElementRef::new(format!("confirm/{}", dialog))],
                    _ => Vec::new(),
                };
            }
            if confirm.fallback == *selector {
                return match surface {
                    ConfirmSurface::LabeledButton => vec![
                        ElementRef::new(format!("button/{}/0", dialog)),
                        ElementRef::new(format!("button/{}/1", dialog)),
                    ],
                    _ => vec![ElementRef::new(format!("button/{}/0", dialog))],
                };
            }
        }

        Vec::new()
    }

    fn fault(state: &FeedState, id: &str, fault: InjectedFault) -> Result<(), ViewError> {
        match state.find(id) {
            Some(r) if r.item.fault == Some(fault) => {
                Err(ViewError::Interaction(format!("{:?} failed on {}", fault, id)))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl View for MemoryView {
    async fn query_first(&self, selector: &Selector, scope: Scope<'_>) -> Result<Option<ElementRef>, ViewError> {
        let mut state = self.state()?;
        Ok(self.matches(selector, &mut state, scope).into_iter().next())
    }

    async fn query_all(&self, selector: &Selector, scope: Scope<'_>) -> Result<Vec<ElementRef>, ViewError> {
        let mut state = self.state()?;
        Ok(self.matches(selector, &mut state, scope))
    }

    async fn focus(&self, element: &ElementRef) -> Result<(), ViewError> {
        let mut state = self.state()?;
        if let Some(Handle::Item(id)) | Some(Handle::Control(id)) = parse(element) {
            if state.find(id).is_none() {
                return Err(ViewError::Detached(element.to_string()));
            }
            Self::fault(&state, id, InjectedFault::Focus)?;
        }
        state.events.push(ViewEvent::Focused(element.to_string()));
        Ok(())
    }

    async fn trigger(&self, element: &ElementRef) -> Result<(), ViewError> {
        let mut state = self.state()?;
        let detached = || ViewError::Detached(element.to_string());
        match parse(element).ok_or_else(detached)? {
            Handle::Item(id) => {
                if state.find(id).is_none() {
                    return Err(detached());
                }
                Self::fault(&state, id, InjectedFault::Trigger)?;
                if self.profile.primary_control.is_none() {
                    state.complete(id, false);
                }
            }
            Handle::Control(id) => {
                match state.find(id) {
                    Some(r) if r.item.has_control => {}
                    _ => return Err(detached()),
                }
                Self::fault(&state, id, InjectedFault::Trigger)?;
                state.open_menu = Some(id.to_string());
                state.menu_scans = 0;
            }
            Handle::MenuEntry(id, n) => {
                if state.open_menu.as_deref() != Some(id) {
                    return Err(detached());
                }
                let label = state
                    .find(id)
                    .and_then(|r| r.item.menu_entries.get(n).cloned())
                    .ok_or_else(detached)?;
                Self::fault(&state, id, InjectedFault::MenuEntry)?;
                state.open_menu = None;
                if label_matches(&label, DELETE_LABEL) {
                    state.dialog = Some(id.to_string());
                }
            }
            Handle::Confirm(id) | Handle::Button(id, 1) => {
                if state.dialog.as_deref() != Some(id) {
                    return Err(detached());
                }
                Self::fault(&state, id, InjectedFault::Confirm)?;
                state.dialog = None;
                state.complete(id, true);
            }
            Handle::Button(id, _) => {
                if state.dialog.as_deref() != Some(id) {
                    return Err(detached());
                }
                state.dialog = None;
            }
        }
        state.events.push(ViewEvent::Triggered(element.to_string()));
        Ok(())
    }

    async fn read_label(&self, element: &ElementRef) -> Result<String, ViewError> {
        let state = self.state()?;
        let detached = || ViewError::Detached(element.to_string());
        match parse(element).ok_or_else(detached)? {
            Handle::Item(id) => state.find(id).map(|r| r.item.label.clone()).ok_or_else(detached),
            Handle::Control(_) => Ok("More".to_string()),
            Handle::MenuEntry(id, n) => state
                .find(id)
                .and_then(|r| r.item.menu_entries.get(n).cloned())
                .ok_or_else(detached),
            Handle::Confirm(_) | Handle::Button(_, 1) => Ok(DELETE_LABEL.to_string()),
            Handle::Button(_, _) => Ok(CANCEL_LABEL.to_string()),
        }
    }

    async fn remove(&self, element: &ElementRef) -> Result<(), ViewError> {
        let mut state = self.state()?;
        if let Some(Handle::Item(id)) = parse(element) {
            let id = id.to_string();
            state.rendered.retain(|r| r.item.id != id);
            if state.open_menu.as_deref() == Some(id.as_str()) {
                state.open_menu = None;
            }
            if state.dialog.as_deref() == Some(id.as_str()) {
                state.dialog = None;
            }
        }
        state.events.push(ViewEvent::Removed(element.to_string()));
        Ok(())
    }

    async fn dismiss_overlays(&self) -> Result<(), ViewError> {
        let mut state = self.state()?;
        state.open_menu = None;
        state.dialog = None;
        state.events.push(ViewEvent::Dismissed);
        Ok(())
    }

    async fn expand(&self) -> Result<(), ViewError> {
        let mut state = self.state()?;
        let added = state.render_page();
        state.expansions += 1;
        state.events.push(ViewEvent::Expanded);
        log::debug!("memory view rendered {} more item(s)", added);
        Ok(())
    }
}
