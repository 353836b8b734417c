//! Resolve-then-commit workflow that hands a tunnel session on a server to
//! an account found by login.

use shared::{
    domain::AccountId,
    protocol::{Endpoint, IdEcho, SessionIdEcho},
};
use tracing::{info, warn};

use crate::{
    lists::ListQuery,
    render::{DialogSpec, DialogSurface, Indicator, Notification},
    types::{CommandOutcome, ServerContext},
    Console,
};

const ASSIGN_DIALOG: DialogSpec = DialogSpec {
    title: "Assign User",
    action: "Assign",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentCommand {
    Assign,
    Reassign,
}

impl AssignmentCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "assign-session",
            Self::Reassign => "reassign-session",
        }
    }

    fn refresh_query(self, server: &ServerContext) -> ListQuery {
        match self {
            Self::Assign => ListQuery::assigned_sessions(server),
            Self::Reassign => ListQuery::unassigned_sessions(server),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Resolving,
    Committing,
    Done(CommandOutcome),
    Cancelled,
}

/// One invocation of the assign-user dialog. The dialog surface is closed
/// when the workflow finishes, is cancelled, or is dropped; a new invocation
/// always starts in [`WorkflowState::Resolving`].
pub struct AssignmentWorkflow<'a> {
    console: &'a Console,
    server: ServerContext,
    command: AssignmentCommand,
    state: WorkflowState,
    dialog: Option<Box<dyn DialogSurface>>,
}

impl<'a> AssignmentWorkflow<'a> {
    pub(crate) fn start(
        console: &'a Console,
        server: ServerContext,
        command: AssignmentCommand,
    ) -> Self {
        let dialog = console.sink().open_dialog(ASSIGN_DIALOG);
        Self {
            console,
            server,
            command,
            state: WorkflowState::Resolving,
            dialog: Some(dialog),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn command(&self) -> AssignmentCommand {
        self.command
    }

    /// Resolves `login`; on success advances straight into the commit. A
    /// failed resolve leaves the workflow in `Resolving` for another try.
    pub async fn submit(&mut self, login: &str) -> WorkflowState {
        if self.state != WorkflowState::Resolving {
            return self.state;
        }

        let Some(account) = self.resolve(login).await else {
            return self.state;
        };

        self.state = WorkflowState::Committing;
        let outcome = self.commit(login, account).await;
        self.finish(WorkflowState::Done(outcome));
        self.state
    }

    pub fn cancel(mut self) {
        self.finish(WorkflowState::Cancelled);
    }

    async fn resolve(&mut self, login: &str) -> Option<AccountId> {
        if let Some(dialog) = self.dialog.as_mut() {
            dialog.set_indicator(Indicator::Busy);
        }

        let envelope = self
            .console
            .dispatcher()
            .envelope(self.server.id.0, "resolve-user", login);
        let result = self
            .console
            .dispatcher()
            .execute_decoded::<IdEcho>(Endpoint::ResolveLogin, envelope)
            .await;

        let Some(dialog) = self.dialog.as_mut() else {
            return None;
        };
        match result {
            Ok(echo) => {
                dialog.clear_error();
                dialog.set_indicator(Indicator::Found);
                Some(echo.id)
            }
            Err(err) => {
                warn!(server_id = self.server.id.0, "assignment: resolve failed: {err}");
                dialog.set_indicator(Indicator::Idle);
                dialog.show_error(&err.operator_message());
                dialog.reselect_input();
                None
            }
        }
    }

    async fn commit(&mut self, login: &str, account: AccountId) -> CommandOutcome {
        let console = self.console;
        let sink = console.sink();
        sink.clear_notifications();

        let envelope = console.dispatcher().envelope(
            self.server.id.0,
            self.command.as_str(),
            account.to_string(),
        );
        let result = console
            .dispatcher()
            .execute_decoded::<SessionIdEcho>(Endpoint::SetSessionOwner, envelope)
            .await;

        match result {
            Ok(echo) => {
                info!(
                    command = self.command.as_str(),
                    server_id = self.server.id.0,
                    account_id = account.0,
                    session_id = echo.session_id.0,
                    "assignment: session owner set"
                );
                self.close_dialog();
                sink.notify(Notification::success(format!(
                    "{login} assigned tunnel session ID {}",
                    echo.session_id
                )));
                console
                    .lists()
                    .load(&self.command.refresh_query(&self.server))
                    .await;
                CommandOutcome::Confirmed
            }
            Err(err) => {
                warn!(
                    command = self.command.as_str(),
                    server_id = self.server.id.0,
                    "assignment: commit failed: {err}"
                );
                sink.notify(Notification::failure(format!(
                    "Unable to assign tunnel server session for {login}"
                )));
                CommandOutcome::Failed
            }
        }
    }

    fn finish(&mut self, state: WorkflowState) {
        self.close_dialog();
        self.state = state;
    }

    fn close_dialog(&mut self) {
        if let Some(mut dialog) = self.dialog.take() {
            dialog.close();
        }
    }
}

impl Drop for AssignmentWorkflow<'_> {
    fn drop(&mut self) {
        self.close_dialog();
    }
}

#[cfg(test)]
#[path = "tests/assignment_tests.rs"]
mod tests;
