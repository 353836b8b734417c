//! Activation and deactivation of an account's tunnel sessions.

use shared::{
    domain::{EntityKey, EntityKind, StateTag},
    protocol::{AddressEcho, Endpoint},
};
use tracing::{info, warn};

use crate::{
    render::{DialogSpec, DialogSurface, Notification, TagDisplay},
    toggle::toggle_command,
    types::{CommandOutcome, SessionRef},
    Console,
};

const DESTINATION_DIALOG: DialogSpec = DialogSpec {
    title: "Tunnel Destination",
    action: "Activate",
};

pub enum SessionStep<'a> {
    Sent(CommandOutcome),
    AwaitingDestination(DestinationPrompt<'a>),
}

pub enum PromptResult<'a> {
    Sent(CommandOutcome),
    Open(DestinationPrompt<'a>),
}

pub struct SessionActivationFlow<'a> {
    console: &'a Console,
}

impl<'a> SessionActivationFlow<'a> {
    pub(crate) fn new(console: &'a Console) -> Self {
        Self { console }
    }

    /// Acts on the session's confirmed lifecycle tag. An active session is
    /// deactivated immediately using its displayed destination; an inactive
    /// one opens the destination prompt.
    pub async fn toggle(&self, session: &SessionRef) -> SessionStep<'a> {
        let console = self.console;
        console.sink().clear_notifications();

        let key = EntityKey::session(session.session);
        let state = console.entity(key).unwrap_or_default();
        let Some(current) = state.lifecycle else {
            console.sink().notify(Notification::failure(format!(
                "{} is not on the current roster",
                session_label(session)
            )));
            return SessionStep::Sent(CommandOutcome::Rejected);
        };

        match current {
            StateTag::Active => {
                let destination = state.tunnel_destination.unwrap_or_default();
                let outcome = send_session_command(console, session, current, &destination).await;
                SessionStep::Sent(outcome)
            }
            _ => SessionStep::AwaitingDestination(DestinationPrompt {
                console,
                session: session.clone(),
                current,
                dialog: Some(console.sink().open_dialog(DESTINATION_DIALOG)),
            }),
        }
    }
}

/// Closed on submit, cancel or drop.
pub struct DestinationPrompt<'a> {
    console: &'a Console,
    session: SessionRef,
    current: StateTag,
    dialog: Option<Box<dyn DialogSurface>>,
}

impl<'a> DestinationPrompt<'a> {
    pub fn session(&self) -> &SessionRef {
        &self.session
    }

    /// Explicit submit. The address is sent as typed, empty included.
    pub async fn submit(mut self, destination: &str) -> CommandOutcome {
        self.close();
        send_session_command(self.console, &self.session, self.current, destination).await
    }

    /// Keyboard confirmation only commits when the input is empty.
    pub async fn confirm_key(self, input: &str) -> PromptResult<'a> {
        if input.is_empty() {
            PromptResult::Sent(self.submit(input).await)
        } else {
            PromptResult::Open(self)
        }
    }

    pub fn cancel(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if let Some(mut dialog) = self.dialog.take() {
            dialog.close();
        }
    }
}

impl Drop for DestinationPrompt<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

fn session_label(session: &SessionRef) -> String {
    format!("Session [{}:{}]", session.server_name, session.session)
}

async fn send_session_command(
    console: &Console,
    session: &SessionRef,
    current: StateTag,
    destination: &str,
) -> CommandOutcome {
    let sink = console.sink();
    let key = EntityKey::session(session.session);
    let next = current.inverse();
    let command = toggle_command(EntityKind::Session, current);
    let label = session_label(session);

    let Some(ticket) = console.sequencer().begin(key) else {
        sink.notify(Notification::failure(format!(
            "{label} already has a pending command"
        )));
        return CommandOutcome::Rejected;
    };

    let envelope = console.dispatcher().envelope(
        session.server.0,
        &command,
        format!("{destination}:{}", session.account),
    );
    let result = console
        .dispatcher()
        .execute_decoded::<AddressEcho>(Endpoint::SetSessionState, envelope)
        .await;
    let echo = match result {
        Ok(echo) => echo,
        Err(err) => {
            drop(ticket);
            warn!(
                command = %command,
                session_id = session.session.0,
                "activation: command failed: {err}"
            );
            sink.notify(Notification::failure(format!(
                "{label} cannot be {}",
                next.participle()
            )));
            return CommandOutcome::Failed;
        }
    };

    if !ticket.confirm() {
        warn!(
            command = %command,
            session_id = session.session.0,
            "activation: discarding response older than the applied confirmation"
        );
        return CommandOutcome::Discarded;
    }

    let displayed = if next == StateTag::Active {
        echo.address
    } else {
        String::new()
    };
    console.with_model(|model| {
        model.set_tag(key, next);
        model.set_tunnel_destination(key, Some(displayed.clone()));
    });
    sink.show_tunnel_destination(session.session, &displayed);
    sink.show_tag(key, TagDisplay::for_entity(EntityKind::Session, next));
    info!(command = %command, session_id = session.session.0, "activation: confirmed");
    sink.notify(Notification::success(format!("{label} {}", next.participle())));
    CommandOutcome::Confirmed
}

#[cfg(test)]
#[path = "tests/activation_tests.rs"]
mod tests;
