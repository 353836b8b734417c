//! Boundary to the rendering layer. The core decides what to show; the sink
//! decides how. Sinks never act as the state model.

use shared::domain::{EntityKey, EntityKind, SessionId, StateTag};

use crate::lists::PaginationControls;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    AccountRoster,
    ServerRoster,
    AccountDetail,
    ServerDetail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Failure,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub title: String,
    pub badge: String,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
    pub pagination: Option<PaginationControls>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Ok,
    Remove,
}

impl Icon {
    pub fn for_tag(tag: StateTag) -> Self {
        if tag.is_on() {
            Self::Ok
        } else {
            Self::Remove
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDisplay {
    pub tag: StateTag,
    pub icon: Icon,
    pub label: String,
}

impl TagDisplay {
    /// e.g. "User enabled", "Server inactive".
    pub fn for_entity(kind: EntityKind, tag: StateTag) -> Self {
        Self {
            tag,
            icon: Icon::for_tag(tag),
            label: format!("{} {}", kind.display_noun(), tag.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Idle,
    Busy,
    Found,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogSpec {
    pub title: &'static str,
    pub action: &'static str,
}

pub trait DialogSurface: Send {
    fn set_indicator(&mut self, indicator: Indicator);
    fn show_error(&mut self, message: &str);
    fn clear_error(&mut self);
    fn reselect_input(&mut self);
    fn close(&mut self);
}

pub trait RenderSink: Send + Sync {
    /// Replaces whatever notification is currently shown.
    fn notify(&self, notification: Notification);
    fn clear_notifications(&self);
    fn render_table(&self, region: Region, table: TableView);
    fn render_empty(&self, region: Region, message: String);
    fn show_tag(&self, key: EntityKey, display: TagDisplay);
    fn show_tunnel_destination(&self, session: SessionId, destination: &str);
    fn open_dialog(&self, spec: DialogSpec) -> Box<dyn DialogSurface>;
}
