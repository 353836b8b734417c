use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use serde::Serialize;
use shared::{
    domain::{AccountId, EntityKey, SessionId, StateTag},
    protocol::{AccountRow, CommandEnvelope, Endpoint, ListPage, ResponseEnvelope},
};
use tokio::sync::oneshot;

use crate::{
    dispatcher::CommandDispatcher,
    render::{
        DialogSpec, DialogSurface, Indicator, Notification, NotificationLevel, Region,
        RenderSink, TableView, TagDisplay,
    },
    transport::{CommandTransport, TransportError},
    types::ConsoleOptions,
    Console,
};

pub(crate) const TOKEN: &str = "tok-1";

enum Reply {
    Ready(Result<ResponseEnvelope, TransportError>),
    Deferred(oneshot::Receiver<ResponseEnvelope>),
}

/// Transport that answers from a queue. Replies are consumed in the order
/// commands are sent; an exhausted queue behaves like a dropped connection.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    sent: Mutex<Vec<(Endpoint, CommandEnvelope)>>,
}

impl ScriptedTransport {
    pub(crate) fn reply(&self, response: ResponseEnvelope) {
        self.push(Reply::Ready(Ok(response)));
    }

    pub(crate) fn reply_ok(&self, payload: &impl Serialize) {
        let data = serde_json::to_string(payload).expect("serialize payload");
        self.reply(ResponseEnvelope::ok(data));
    }

    pub(crate) fn refuse(&self, err_no: i64, message: &str) {
        self.reply(ResponseEnvelope::declared(err_no, message));
    }

    pub(crate) fn fail(&self) {
        self.push(Reply::Ready(Err(unavailable())));
    }

    /// Queues a reply that is only delivered once the returned sender fires.
    pub(crate) fn defer(&self) -> oneshot::Sender<ResponseEnvelope> {
        let (tx, rx) = oneshot::channel();
        self.push(Reply::Deferred(rx));
        tx
    }

    pub(crate) fn sent(&self) -> Vec<(Endpoint, CommandEnvelope)> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn endpoints(&self) -> Vec<Endpoint> {
        self.sent().into_iter().map(|(endpoint, _)| endpoint).collect()
    }

    pub(crate) fn pending_replies(&self) -> usize {
        self.replies.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn push(&self, reply: Reply) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }
}

#[async_trait]
impl CommandTransport for ScriptedTransport {
    async fn post(
        &self,
        endpoint: Endpoint,
        envelope: &CommandEnvelope,
    ) -> Result<ResponseEnvelope, TransportError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((endpoint, envelope.clone()));
        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match reply {
            Some(Reply::Ready(result)) => result,
            Some(Reply::Deferred(rx)) => rx.await.map_err(|_| unavailable()),
            None => Err(unavailable()),
        }
    }
}

fn unavailable() -> TransportError {
    TransportError::Status(503)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SinkEvent {
    Notify(Notification),
    ClearNotifications,
    Table(Region, TableView),
    Empty(Region, String),
    Tag(EntityKey, TagDisplay),
    Destination(SessionId, String),
    DialogOpened(DialogSpec),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DialogEvent {
    Indicator(Indicator),
    Error(String),
    ClearError,
    Reselect,
    Closed,
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
    dialog_events: Arc<Mutex<Vec<DialogEvent>>>,
}

impl RecordingSink {
    pub(crate) fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn notifications(&self) -> Vec<Notification> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Notify(notification) => Some(notification),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn last_notification(&self) -> Option<Notification> {
        self.notifications().pop()
    }

    pub(crate) fn successes(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter(|notification| notification.level == NotificationLevel::Success)
            .map(|notification| notification.message)
            .collect()
    }

    pub(crate) fn tables(&self) -> Vec<(Region, TableView)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Table(region, table) => Some((region, table)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn empties(&self) -> Vec<(Region, String)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Empty(region, message) => Some((region, message)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn tags(&self) -> Vec<(EntityKey, TagDisplay)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Tag(key, display) => Some((key, display)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn dialogs_opened(&self) -> Vec<DialogSpec> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::DialogOpened(spec) => Some(spec),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn dialog_events(&self) -> Vec<DialogEvent> {
        self.dialog_events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, event: SinkEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl RenderSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.record(SinkEvent::Notify(notification));
    }

    fn clear_notifications(&self) {
        self.record(SinkEvent::ClearNotifications);
    }

    fn render_table(&self, region: Region, table: TableView) {
        self.record(SinkEvent::Table(region, table));
    }

    fn render_empty(&self, region: Region, message: String) {
        self.record(SinkEvent::Empty(region, message));
    }

    fn show_tag(&self, key: EntityKey, display: TagDisplay) {
        self.record(SinkEvent::Tag(key, display));
    }

    fn show_tunnel_destination(&self, session: SessionId, destination: &str) {
        self.record(SinkEvent::Destination(session, destination.to_string()));
    }

    fn open_dialog(&self, spec: DialogSpec) -> Box<dyn DialogSurface> {
        self.record(SinkEvent::DialogOpened(spec));
        Box::new(RecordingDialog {
            events: Arc::clone(&self.dialog_events),
        })
    }
}

struct RecordingDialog {
    events: Arc<Mutex<Vec<DialogEvent>>>,
}

impl RecordingDialog {
    fn record(&self, event: DialogEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl DialogSurface for RecordingDialog {
    fn set_indicator(&mut self, indicator: Indicator) {
        self.record(DialogEvent::Indicator(indicator));
    }

    fn show_error(&mut self, message: &str) {
        self.record(DialogEvent::Error(message.to_string()));
    }

    fn clear_error(&mut self) {
        self.record(DialogEvent::ClearError);
    }

    fn reselect_input(&mut self) {
        self.record(DialogEvent::Reselect);
    }

    fn close(&mut self) {
        self.record(DialogEvent::Closed);
    }
}

pub(crate) struct Harness {
    pub(crate) transport: Arc<ScriptedTransport>,
    pub(crate) sink: Arc<RecordingSink>,
    pub(crate) console: Console,
}

pub(crate) fn harness() -> Harness {
    harness_with(ConsoleOptions::default())
}

pub(crate) fn harness_with(options: ConsoleOptions) -> Harness {
    let transport = Arc::new(ScriptedTransport::default());
    let sink = Arc::new(RecordingSink::default());
    let console = Console::new(
        CommandDispatcher::new(transport.clone(), TOKEN),
        sink.clone(),
        options,
    );
    Harness {
        transport,
        sink,
        console,
    }
}

pub(crate) fn page<T: Serialize>(total: u64, entries: Vec<T>) -> ListPage<T> {
    ListPage { total, entries }
}

pub(crate) fn account_row(id: i64, login: &str, admin: StateTag, status: StateTag) -> AccountRow {
    AccountRow {
        id: AccountId(id),
        login: login.to_string(),
        name: format!("{login} name"),
        registered: "2024-03-01".to_string(),
        admin,
        status,
    }
}
