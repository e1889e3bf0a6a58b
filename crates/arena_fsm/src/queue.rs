//! Transitions in flight and the requests that arrive while they run.
//!
//! A state machine is checked out of its slot while it transitions, so a
//! request issued from inside an enter/exit effect (a sibling's `on_enable`,
//! a `StateEntered` listener) cannot reach it directly. Such requests are
//! ranked here against the in-flight transition and at most one winner is
//! kept; the machine picks it up when the running transition completes.
//!
//! Flights are keyed by entity and behavior key, so several machines on one
//! entity transition independently.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use arena_core::{BehaviorKey, EntityId};
use tracing::{debug, warn};

use crate::error::FsmError;
use crate::graph::{State, StateGraph};
use crate::machine::Switch;

/// World resource tracking every transition currently executing.
#[derive(Debug, Default)]
pub struct TransitionQueue {
    in_flight: HashMap<(EntityId, BehaviorKey), InFlight>,
}

#[derive(Debug)]
pub(crate) struct InFlight {
    graph: Arc<StateGraph>,
    target: String,
    priority: i32,
    pub(crate) pending: Option<Pending>,
    pub(crate) conflicts: u64,
}

#[derive(Debug)]
pub(crate) struct Pending {
    pub(crate) target: String,
    pub(crate) priority: i32,
}

impl TransitionQueue {
    pub(crate) fn begin(
        &mut self,
        entity: EntityId,
        key: BehaviorKey,
        graph: Arc<StateGraph>,
        target: String,
        priority: i32,
    ) {
        self.in_flight.insert(
            (entity, key),
            InFlight {
                graph,
                target,
                priority,
                pending: None,
                conflicts: 0,
            },
        );
    }

    pub(crate) fn finish(&mut self, entity: EntityId, key: BehaviorKey) -> Option<InFlight> {
        self.in_flight.remove(&(entity, key))
    }

    /// Returns `true` while the machine under `key` is transitioning.
    #[must_use]
    pub fn is_in_flight(&self, entity: EntityId, key: BehaviorKey) -> bool {
        self.in_flight.contains_key(&(entity, key))
    }

    /// The state the machine under `key` is currently entering.
    #[must_use]
    pub fn in_flight_target(&self, entity: EntityId, key: BehaviorKey) -> Option<&str> {
        self.in_flight.get(&(entity, key)).map(|f| f.target.as_str())
    }

    /// Whether `trigger` leads anywhere from the state being entered.
    #[must_use]
    pub fn can_trigger(&self, entity: EntityId, key: BehaviorKey, trigger: &str) -> bool {
        self.in_flight.get(&(entity, key)).is_some_and(|f| {
            f.graph
                .state(&f.target)
                .and_then(|s| s.edge(trigger))
                .is_some()
        })
    }

    /// Rank a request for `target` against the entity's in-flight transition.
    ///
    /// A request is kept only if its state's priority strictly exceeds both
    /// the in-flight transition and any request already kept. A tie is a
    /// conflict: logged, counted, and dropped. Anything lower is dropped
    /// quietly.
    pub(crate) fn request(
        &mut self,
        entity: EntityId,
        key: BehaviorKey,
        target: &str,
    ) -> Result<Switch, FsmError> {
        let Some(flight) = self.in_flight.get_mut(&(entity, key)) else {
            return Err(FsmError::Busy(entity));
        };
        if flight.target == target || flight.pending.as_ref().is_some_and(|p| p.target == target) {
            return Ok(Switch::Unchanged);
        }
        let Some(priority) = flight.graph.state(target).map(State::priority) else {
            debug!(entity = %entity, state = target, "switch to unknown state ignored");
            return Ok(Switch::Unknown);
        };

        let bar = flight
            .pending
            .as_ref()
            .map_or(flight.priority, |p| p.priority.max(flight.priority));
        match priority.cmp(&bar) {
            Ordering::Greater => {
                debug!(
                    entity = %entity,
                    state = target,
                    priority,
                    in_flight = %flight.target,
                    "state switch deferred behind in-flight transition"
                );
                flight.pending = Some(Pending {
                    target: target.to_owned(),
                    priority,
                });
                Ok(Switch::Deferred)
            }
            Ordering::Equal => {
                warn!(
                    entity = %entity,
                    state = target,
                    priority,
                    in_flight = %flight.target,
                    "state transition conflict, request dropped"
                );
                flight.conflicts += 1;
                Ok(Switch::Dropped)
            }
            Ordering::Less => Ok(Switch::Dropped),
        }
    }

    /// Resolve `trigger` from the state being entered and rank the result.
    pub(crate) fn request_trigger(
        &mut self,
        entity: EntityId,
        key: BehaviorKey,
        trigger: &str,
    ) -> Result<Switch, FsmError> {
        let Some(flight) = self.in_flight.get(&(entity, key)) else {
            return Err(FsmError::Busy(entity));
        };
        let Some(target) = flight
            .graph
            .state(&flight.target)
            .and_then(|s| s.edge(trigger))
            .map(str::to_owned)
        else {
            return Ok(Switch::Unknown);
        };
        self.request(entity, key, &target)
    }
}
