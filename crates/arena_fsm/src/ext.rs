//! State-machine operations addressed by entity.

use arena_core::{BehaviorKey, EntityId, World, WorldError};

use crate::error::FsmError;
use crate::machine::{StateMachine, Switch};
use crate::queue::TransitionQueue;

/// Drive the [`StateMachine`] on an entity from outside of it.
///
/// Requests made while the machine is transitioning (from an effect hook or
/// a state listener) are ranked against the in-flight transition instead of
/// running immediately.
pub trait FsmExt {
    /// Switch the entity's machine to `name`.
    ///
    /// # Errors
    ///
    /// [`FsmError::NotAttached`] if the entity is not in the world,
    /// [`FsmError::NoMachine`] if it has no machine.
    fn switch_state(&mut self, entity: EntityId, name: &str) -> Result<Switch, FsmError>;

    /// Follow the current state's edge for `trigger`.
    ///
    /// # Errors
    ///
    /// Same as [`FsmExt::switch_state`].
    fn trigger(&mut self, entity: EntityId, trigger: &str) -> Result<Switch, FsmError>;

    /// Returns `true` if the machine's current state has an edge for `trigger`.
    fn can_trigger(&self, entity: EntityId, trigger: &str) -> bool;

    /// Set the current state without effects or events.
    ///
    /// # Errors
    ///
    /// Same as [`FsmExt::switch_state`], plus [`FsmError::Busy`] while the
    /// machine is executing.
    fn jump_state(&mut self, entity: EntityId, name: &str) -> Result<bool, FsmError>;

    /// The machine's current state. While it transitions, the state being
    /// entered.
    fn current_state(&self, entity: EntityId) -> Option<&str>;
}

impl FsmExt for World {
    fn switch_state(&mut self, entity: EntityId, name: &str) -> Result<Switch, FsmError> {
        match self.with_behavior::<StateMachine, _>(entity, |fsm, ctx| fsm.switch_state(ctx, name)) {
            Ok(outcome) => outcome,
            Err(WorldError::BehaviorBusy { .. }) => self
                .resources_mut()
                .get_or_default::<TransitionQueue>()
                .request(entity, machine_key(), name),
            Err(err) => Err(machine_error(entity, err)),
        }
    }

    fn trigger(&mut self, entity: EntityId, trigger: &str) -> Result<Switch, FsmError> {
        match self.with_behavior::<StateMachine, _>(entity, |fsm, ctx| fsm.trigger(ctx, trigger)) {
            Ok(outcome) => outcome,
            Err(WorldError::BehaviorBusy { .. }) => self
                .resources_mut()
                .get_or_default::<TransitionQueue>()
                .request_trigger(entity, machine_key(), trigger),
            Err(err) => Err(machine_error(entity, err)),
        }
    }

    fn can_trigger(&self, entity: EntityId, trigger: &str) -> bool {
        match self.get::<StateMachine>(entity) {
            Some(fsm) => fsm.can_trigger(trigger),
            None => self
                .resources()
                .get::<TransitionQueue>()
                .is_some_and(|q| q.can_trigger(entity, machine_key(), trigger)),
        }
    }

    fn jump_state(&mut self, entity: EntityId, name: &str) -> Result<bool, FsmError> {
        match self.with_behavior::<StateMachine, _>(entity, |fsm, _| fsm.jump_state(name)) {
            Ok(outcome) => outcome,
            Err(WorldError::BehaviorBusy { .. }) => Err(FsmError::Busy(entity)),
            Err(err) => Err(machine_error(entity, err)),
        }
    }

    fn current_state(&self, entity: EntityId) -> Option<&str> {
        match self.get::<StateMachine>(entity) {
            Some(fsm) => fsm.current(),
            None => self
                .resources()
                .get::<TransitionQueue>()?
                .in_flight_target(entity, machine_key()),
        }
    }
}

fn machine_error(entity: EntityId, err: WorldError) -> FsmError {
    match err {
        WorldError::EntityNotFound(_) | WorldError::EntityDestroyed(_) => FsmError::NotAttached,
        WorldError::BehaviorNotFound { .. } => FsmError::NoMachine(entity),
        other => FsmError::World(other),
    }
}

/// Key of the machine the entity-addressed operations drive.
fn machine_key() -> BehaviorKey {
    BehaviorKey::of::<StateMachine>()
}
