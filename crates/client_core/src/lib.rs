//! Administrative console core: command dispatch against the console API and
//! synchronisation of the operator's view with server-confirmed state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::domain::{Axis, EntityKey, StateTag};

pub mod activation;
pub mod assignment;
pub mod dispatcher;
pub mod lists;
pub mod model;
pub mod pagination;
pub mod render;
pub mod toggle;
pub mod transport;
pub mod types;

pub use activation::{DestinationPrompt, PromptResult, SessionActivationFlow, SessionStep};
pub use assignment::{AssignmentCommand, AssignmentWorkflow, WorkflowState};
pub use dispatcher::{CommandDispatcher, DispatchError};
pub use lists::{AccountSessions, ListOutcome, ListQuery, ListSource, PaginatedListLoader};
pub use model::{ConsoleModel, EntityState, RequestSequencer};
pub use render::{DialogSurface, Notification, Region, RenderSink, TableView};
pub use toggle::{EntityTarget, ToggleStateController};
pub use transport::{CommandTransport, HttpTransport, TransportError};
pub use types::{
    AccountContext, CommandOutcome, ConsoleOptions, InFlightPolicy, ResponseOrdering,
    ServerContext, SessionRef,
};

/// Entry point for every console operation. Owns the dispatcher, the view
/// model and the rendering sink; components borrow it for one operation.
pub struct Console {
    dispatcher: CommandDispatcher,
    sink: Arc<dyn RenderSink>,
    model: Mutex<ConsoleModel>,
    sequencer: RequestSequencer,
}

impl Console {
    pub fn new(
        dispatcher: CommandDispatcher,
        sink: Arc<dyn RenderSink>,
        options: ConsoleOptions,
    ) -> Self {
        Self {
            dispatcher,
            sink,
            model: Mutex::new(ConsoleModel::default()),
            sequencer: RequestSequencer::new(options),
        }
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    pub fn sink(&self) -> &dyn RenderSink {
        self.sink.as_ref()
    }

    pub fn sequencer(&self) -> &RequestSequencer {
        &self.sequencer
    }

    pub fn lists(&self) -> PaginatedListLoader<'_> {
        PaginatedListLoader::new(self)
    }

    pub fn toggles(&self) -> ToggleStateController<'_> {
        ToggleStateController::new(self)
    }

    pub fn activation(&self) -> SessionActivationFlow<'_> {
        SessionActivationFlow::new(self)
    }

    pub fn assignment(
        &self,
        server: ServerContext,
        command: AssignmentCommand,
    ) -> AssignmentWorkflow<'_> {
        AssignmentWorkflow::start(self, server, command)
    }

    pub fn tag(&self, key: EntityKey, axis: Axis) -> Option<StateTag> {
        self.model().tag(key, axis)
    }

    pub fn entity(&self, key: EntityKey) -> Option<EntityState> {
        self.model().entity(key).cloned()
    }

    /// Seeds the model with a tag the operator already sees, e.g. from a
    /// detail page rendered by the routing layer.
    pub fn record_tag(&self, key: EntityKey, tag: StateTag) {
        self.model().set_tag(key, tag);
    }

    pub(crate) fn with_model<R>(&self, f: impl FnOnce(&mut ConsoleModel) -> R) -> R {
        f(&mut self.model())
    }

    fn model(&self) -> MutexGuard<'_, ConsoleModel> {
        self.model.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
