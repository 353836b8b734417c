//! In-memory view model. Tags here only ever change after a confirmed
//! response; the rendering layer reads from this, never the reverse.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use shared::domain::{Axis, EntityKey, StateTag};
use tracing::debug;

use crate::types::{ConsoleOptions, InFlightPolicy, ResponseOrdering};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityState {
    pub admin: Option<StateTag>,
    pub lifecycle: Option<StateTag>,
    pub tunnel_destination: Option<String>,
}

impl EntityState {
    pub fn tag(&self, axis: Axis) -> Option<StateTag> {
        match axis {
            Axis::Admin => self.admin,
            Axis::Lifecycle => self.lifecycle,
        }
    }
}

#[derive(Debug, Default)]
pub struct ConsoleModel {
    entities: HashMap<EntityKey, EntityState>,
}

impl ConsoleModel {
    pub fn entity(&self, key: EntityKey) -> Option<&EntityState> {
        self.entities.get(&key)
    }

    pub fn tag(&self, key: EntityKey, axis: Axis) -> Option<StateTag> {
        self.entities.get(&key).and_then(|state| state.tag(axis))
    }

    pub fn set_tag(&mut self, key: EntityKey, tag: StateTag) {
        let state = self.entities.entry(key).or_default();
        match tag.axis() {
            Axis::Admin => state.admin = Some(tag),
            Axis::Lifecycle => state.lifecycle = Some(tag),
        }
    }

    pub fn set_tunnel_destination(&mut self, key: EntityKey, destination: Option<String>) {
        self.entities.entry(key).or_default().tunnel_destination = destination;
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[derive(Debug, Default)]
struct RequestTracker {
    issued: u64,
    applied: u64,
    in_flight: u32,
}

/// Tracks issued and applied commands per entity so late responses can be
/// recognised.
pub struct RequestSequencer {
    options: ConsoleOptions,
    trackers: Mutex<HashMap<EntityKey, RequestTracker>>,
}

impl RequestSequencer {
    pub fn new(options: ConsoleOptions) -> Self {
        Self {
            options,
            trackers: Mutex::new(HashMap::new()),
        }
    }

    fn trackers(&self) -> MutexGuard<'_, HashMap<EntityKey, RequestTracker>> {
        self.trackers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn begin(&self, key: EntityKey) -> Option<SequenceTicket<'_>> {
        let mut trackers = self.trackers();
        let tracker = trackers.entry(key).or_default();
        if self.options.in_flight == InFlightPolicy::Reject && tracker.in_flight > 0 {
            debug!(kind = ?key.kind, id = key.id, "sequencer: command already in flight");
            return None;
        }
        tracker.issued += 1;
        tracker.in_flight += 1;
        Some(SequenceTicket {
            sequencer: self,
            key,
            token: tracker.issued,
            released: false,
        })
    }

    pub fn in_flight(&self, key: EntityKey) -> u32 {
        self.trackers().get(&key).map_or(0, |tracker| tracker.in_flight)
    }

    fn release(&self, key: EntityKey, confirmed: Option<u64>) -> bool {
        let mut trackers = self.trackers();
        let Some(tracker) = trackers.get_mut(&key) else {
            return confirmed.is_some();
        };
        tracker.in_flight = tracker.in_flight.saturating_sub(1);
        let Some(token) = confirmed else {
            return false;
        };
        match self.options.ordering {
            ResponseOrdering::LastCompleted => {
                tracker.applied = tracker.applied.max(token);
                true
            }
            ResponseOrdering::LatestIssued if token > tracker.applied => {
                tracker.applied = token;
                true
            }
            ResponseOrdering::LatestIssued => false,
        }
    }
}

/// Held for the duration of one round trip. A failed round trip just drops
/// it, which frees the in-flight slot and leaves the applied token alone.
pub struct SequenceTicket<'a> {
    sequencer: &'a RequestSequencer,
    key: EntityKey,
    token: u64,
    released: bool,
}

impl SequenceTicket<'_> {
    pub fn token(&self) -> u64 {
        self.token
    }

    /// Records a server confirmation. Returns false when a later command for
    /// the same entity has already been applied.
    pub fn confirm(mut self) -> bool {
        self.released = true;
        self.sequencer.release(self.key, Some(self.token))
    }
}

impl Drop for SequenceTicket<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.sequencer.release(self.key, None);
        }
    }
}
