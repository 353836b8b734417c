//! Binary state toggles and free-text attribute edits for accounts and
//! servers. Nothing is flipped before the server confirms.

use shared::{
    domain::{Attribute, EntityKey, EntityKind, StateTag},
    protocol::{Endpoint, ValueEcho},
};
use tracing::{info, warn};

use crate::{
    dispatcher::DispatchError,
    lists::ListQuery,
    render::{Notification, TagDisplay},
    types::{AccountContext, CommandOutcome, ServerContext},
    Console,
};

#[derive(Debug, Clone, Copy)]
pub enum EntityTarget<'c> {
    Account(&'c AccountContext),
    Server(&'c ServerContext),
}

impl EntityTarget<'_> {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Account(_) => EntityKind::Account,
            Self::Server(_) => EntityKind::Server,
        }
    }

    pub fn key(&self) -> EntityKey {
        match self {
            Self::Account(account) => EntityKey::account(account.id),
            Self::Server(server) => EntityKey::server(server.id),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Account(account) => &account.login,
            Self::Server(server) => &server.name,
        }
    }

    fn status_endpoint(&self) -> Endpoint {
        match self {
            Self::Account(_) => Endpoint::SetAccountStatus,
            Self::Server(_) => Endpoint::SetServerStatus,
        }
    }

    fn attr_endpoint(&self) -> Endpoint {
        match self {
            Self::Account(_) => Endpoint::SetAccountAttr,
            Self::Server(_) => Endpoint::SetServerAttr,
        }
    }
}

/// Command that moves an entity off `current`: `disabled` on an account
/// yields `enable-user`, `active` on a server yields `deactivate-server`.
pub fn toggle_command(kind: EntityKind, current: StateTag) -> String {
    format!("{}-{}", current.inverse().verb(), kind.command_noun())
}

pub struct ToggleStateController<'a> {
    console: &'a Console,
}

impl<'a> ToggleStateController<'a> {
    pub(crate) fn new(console: &'a Console) -> Self {
        Self { console }
    }

    /// Sends the inverse of `current`. A confirmation older than one already
    /// applied for the entity is discarded; failures never change the display.
    pub async fn toggle(&self, target: EntityTarget<'_>, current: StateTag) -> CommandOutcome {
        let sink = self.console.sink();
        sink.clear_notifications();

        let key = target.key();
        let next = current.inverse();
        let command = toggle_command(target.kind(), current);

        let Some(ticket) = self.console.sequencer().begin(key) else {
            sink.notify(Notification::failure(format!(
                "{} already has a pending command",
                target.label()
            )));
            return CommandOutcome::Rejected;
        };

        let envelope = self.console.dispatcher().envelope(key.id, &command, "");
        let result = self
            .console
            .dispatcher()
            .execute(target.status_endpoint(), envelope)
            .await;
        if let Err(err) = result {
            drop(ticket);
            self.report_failure(&command, &err);
            return CommandOutcome::Failed;
        }

        if !ticket.confirm() {
            warn!(
                command = %command,
                target_id = key.id,
                "toggle: discarding response older than the applied confirmation"
            );
            return CommandOutcome::Discarded;
        }

        self.console.with_model(|model| model.set_tag(key, next));
        sink.show_tag(key, TagDisplay::for_entity(target.kind(), next));
        info!(command = %command, target_id = key.id, tag = %next, "toggle: confirmed");
        sink.notify(Notification::success(format!(
            "{} is now {}",
            target.label(),
            next.participle()
        )));

        self.refresh_dependents(target).await;
        CommandOutcome::Confirmed
    }

    /// Commits a free-text attribute. The confirmation shows the value echoed
    /// by the server, which may differ from what was typed.
    pub async fn change_attr(
        &self,
        target: EntityTarget<'_>,
        attr: Attribute,
        value: &str,
    ) -> CommandOutcome {
        let sink = self.console.sink();
        sink.clear_notifications();

        if !attr.applies_to(target.kind()) {
            sink.notify(Notification::failure(format!(
                "{} has no {attr} attribute",
                target.label()
            )));
            return CommandOutcome::Rejected;
        }

        let envelope = self
            .console
            .dispatcher()
            .envelope(target.key().id, attr.as_str(), value);
        let echo: ValueEcho = match self
            .console
            .dispatcher()
            .execute_decoded(target.attr_endpoint(), envelope)
            .await
        {
            Ok(echo) => echo,
            Err(err) => {
                self.report_failure(attr.as_str(), &err);
                return CommandOutcome::Failed;
            }
        };

        info!(attr = %attr, target_id = target.key().id, "toggle: attribute stored");
        sink.notify(Notification::success(format!(
            "{} {attr} is now {}",
            target.label(),
            echo.value
        )));

        if let EntityTarget::Account(account) = target {
            self.console
                .lists()
                .load(&ListQuery::activity_history(account))
                .await;
        }
        CommandOutcome::Confirmed
    }

    pub async fn reset_password(&self, account: &AccountContext) -> CommandOutcome {
        let sink = self.console.sink();
        sink.clear_notifications();

        let envelope = self.console.dispatcher().envelope(account.id.0, "", "");
        if let Err(err) = self
            .console
            .dispatcher()
            .execute(Endpoint::ResetPassword, envelope)
            .await
        {
            self.report_failure("reset-password", &err);
            return CommandOutcome::Failed;
        }

        sink.notify(Notification::success(format!(
            "{} password has been reset",
            account.login
        )));
        self.console
            .lists()
            .load(&ListQuery::activity_history(account))
            .await;
        CommandOutcome::Confirmed
    }

    async fn refresh_dependents(&self, target: EntityTarget<'_>) {
        let query = match target {
            EntityTarget::Account(account) => ListQuery::activity_history(account),
            EntityTarget::Server(server) => ListQuery::assigned_sessions(server),
        };
        self.console.lists().load(&query).await;
    }

    fn report_failure(&self, command: &str, err: &DispatchError) {
        warn!(command = %command, "toggle: command failed: {err}");
        self.console
            .sink()
            .notify(Notification::failure(err.operator_message()));
    }
}

#[cfg(test)]
#[path = "tests/toggle_tests.rs"]
mod tests;
