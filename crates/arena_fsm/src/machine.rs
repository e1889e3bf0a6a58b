//! The state-machine behavior.

use std::sync::Arc;

use arena_core::{Behavior, BehaviorCtx, EntityEvent, EntityId, WorldError, priority};
use tracing::{debug, warn};

use crate::error::FsmError;
use crate::graph::{Effect, State, StateGraph, Toggle};
use crate::queue::TransitionQueue;

/// Outcome of a switch or trigger request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    /// The machine moved to the requested state.
    Applied,
    /// The request outranked the in-flight transition and runs after it.
    Deferred,
    /// The machine is already in (or already headed to) that state.
    Unchanged,
    /// No such state, or no edge for the trigger.
    Unknown,
    /// Lost to the in-flight transition or to a stronger queued request.
    Dropped,
}

impl Switch {
    /// Returns `true` if the request changed or will change the state.
    #[must_use]
    pub fn accepted(self) -> bool {
        matches!(self, Self::Applied | Self::Deferred)
    }
}

#[derive(Debug, Clone)]
struct Countdown {
    target: String,
    remaining: f32,
}

/// A finite-state machine driving its entity's behaviors.
///
/// Entering a state applies that state's enable/disable effects to sibling
/// behaviors; leaving it applies its exit effects. Runs at
/// [`priority::FSM`], after movement and body mirroring.
#[derive(Debug)]
pub struct StateMachine {
    graph: Arc<StateGraph>,
    initial: Option<String>,
    current: Option<String>,
    entity: Option<EntityId>,
    countdown: Option<Countdown>,
    transitions: u64,
    conflicts: u64,
}

impl StateMachine {
    /// A machine with no current state until the first switch.
    #[must_use]
    pub fn new(graph: impl Into<Arc<StateGraph>>) -> Self {
        Self {
            graph: graph.into(),
            initial: None,
            current: None,
            entity: None,
            countdown: None,
            transitions: 0,
            conflicts: 0,
        }
    }

    /// A machine that enters `initial` when attached.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::UnknownTarget`] if the graph has no such state.
    pub fn starting_in(
        graph: impl Into<Arc<StateGraph>>,
        initial: &str,
    ) -> Result<Self, FsmError> {
        let mut machine = Self::new(graph);
        if !machine.graph.contains(initial) {
            return Err(FsmError::UnknownTarget {
                from: "initial".to_owned(),
                to: initial.to_owned(),
            });
        }
        machine.initial = Some(initial.to_owned());
        Ok(machine)
    }

    /// The current state.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// The shared graph.
    #[must_use]
    pub fn graph(&self) -> &StateGraph {
        &self.graph
    }

    /// The owning entity once attached.
    #[must_use]
    pub fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    /// Seconds left on the armed auto-transition.
    #[must_use]
    pub fn countdown(&self) -> Option<f32> {
        self.countdown.as_ref().map(|c| c.remaining)
    }

    /// Number of completed transitions.
    #[must_use]
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Number of equal-priority requests dropped while a transition ran.
    #[must_use]
    pub fn conflicts(&self) -> u64 {
        self.conflicts
    }

    /// Returns `true` if the current state has an edge for `trigger`.
    #[must_use]
    pub fn can_trigger(&self, trigger: &str) -> bool {
        self.current_state()
            .and_then(|state| state.edge(trigger))
            .is_some()
    }

    /// Move to `name`, applying exit then enter effects.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::NotAttached`] before the machine's `init` ran.
    pub fn switch_state(
        &mut self,
        ctx: &mut BehaviorCtx<'_>,
        name: &str,
    ) -> Result<Switch, FsmError> {
        if self.entity.is_none() {
            return Err(FsmError::NotAttached);
        }
        if self.current.as_deref() == Some(name) {
            return Ok(Switch::Unchanged);
        }
        let Some(priority) = self.graph.state(name).map(State::priority) else {
            debug!(entity = %ctx.entity_id(), state = name, "switch to unknown state ignored");
            return Ok(Switch::Unknown);
        };
        self.run(ctx, name.to_owned(), priority);
        Ok(Switch::Applied)
    }

    /// Follow the current state's edge for `trigger`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::NotAttached`] before the machine's `init` ran.
    pub fn trigger(&mut self, ctx: &mut BehaviorCtx<'_>, trigger: &str) -> Result<Switch, FsmError> {
        if self.entity.is_none() {
            return Err(FsmError::NotAttached);
        }
        let Some(target) = self
            .current_state()
            .and_then(|state| state.edge(trigger))
            .map(str::to_owned)
        else {
            return Ok(Switch::Unknown);
        };
        self.switch_state(ctx, &target)
    }

    /// Set the current state without effects or events. The destination's
    /// auto-transition is re-armed.
    ///
    /// Returns `Ok(false)` for an unknown or already-current state.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::NotAttached`] before the machine's `init` ran.
    pub fn jump_state(&mut self, name: &str) -> Result<bool, FsmError> {
        if self.entity.is_none() {
            return Err(FsmError::NotAttached);
        }
        if self.current.as_deref() == Some(name) {
            return Ok(false);
        }
        let Some(state) = self.graph.state(name) else {
            return Ok(false);
        };
        self.countdown = arm(state);
        self.current = Some(name.to_owned());
        Ok(true)
    }

    fn current_state(&self) -> Option<&State> {
        self.graph.state(self.current.as_deref()?)
    }

    /// Run a transition, then any request that outranked it while it ran.
    fn run(&mut self, ctx: &mut BehaviorCtx<'_>, target: String, priority: i32) {
        let (entity, key) = (ctx.entity_id(), ctx.key());
        let mut next = Some((target, priority));
        while let Some((target, priority)) = next.take() {
            queue(ctx).begin(entity, key, Arc::clone(&self.graph), target.clone(), priority);
            self.enter(ctx, &target);
            let Some(flight) = queue(ctx).finish(entity, key) else {
                break;
            };
            self.conflicts += flight.conflicts;
            next = flight
                .pending
                .filter(|p| self.current.as_deref() != Some(p.target.as_str()))
                .map(|p| (p.target, p.priority));
        }
    }

    fn enter(&mut self, ctx: &mut BehaviorCtx<'_>, target: &str) {
        let graph = Arc::clone(&self.graph);
        let Some(next) = graph.state(target) else {
            return;
        };
        let previous = self.current.take();
        if let Some(name) = &previous {
            if let Some(state) = graph.state(name) {
                apply_effects(ctx, state.exit_effects());
            }
            ctx.emit(EntityEvent::StateExited(name.clone()));
        }

        debug!(
            entity = %ctx.entity_id(),
            from = previous.as_deref().unwrap_or("-"),
            to = target,
            "state transition"
        );
        self.current = Some(target.to_owned());
        self.countdown = arm(next);
        self.transitions += 1;

        apply_effects(ctx, next.enter_effects());
        ctx.emit(EntityEvent::StateEntered(target.to_owned()));
    }
}

fn arm(state: &State) -> Option<Countdown> {
    state.auto_transition().map(|auto| Countdown {
        target: auto.target.clone(),
        remaining: auto.delay,
    })
}

fn queue<'a>(ctx: &'a mut BehaviorCtx<'_>) -> &'a mut TransitionQueue {
    ctx.world_mut().resources_mut().get_or_default::<TransitionQueue>()
}

fn apply_effects(ctx: &mut BehaviorCtx<'_>, effects: &[Effect]) {
    let entity = ctx.entity_id();
    for effect in effects {
        let enabled = effect.toggle == Toggle::Enable;
        match ctx.world_mut().set_enabled_keyed(entity, effect.key, enabled) {
            Ok(_) => {}
            Err(WorldError::BehaviorNotFound { .. }) => {
                warn!(entity = %entity, behavior = effect.label, "state effect target missing, skipped");
            }
            Err(err) => {
                debug!(entity = %entity, behavior = effect.label, %err, "state effect skipped");
            }
        }
    }
}

impl Behavior for StateMachine {
    fn name(&self) -> &'static str {
        "StateMachine"
    }

    fn priority(&self) -> i32 {
        priority::FSM
    }

    fn init(&mut self, ctx: &mut BehaviorCtx<'_>) {
        self.entity = Some(ctx.entity_id());
        if let Some(initial) = self.initial.clone()
            && let Some(priority) = self.graph.state(&initial).map(State::priority)
        {
            self.run(ctx, initial, priority);
        }
    }

    fn update(&mut self, ctx: &mut BehaviorCtx<'_>, delta: f32) {
        let Some(countdown) = &mut self.countdown else {
            return;
        };
        countdown.remaining -= delta;
        if countdown.remaining > 0.0 {
            return;
        }
        let target = countdown.target.clone();
        self.countdown = None;
        // Returning to the current state is a no-op; the countdown stays disarmed.
        if let Err(err) = self.switch_state(ctx, &target) {
            warn!(entity = %ctx.entity_id(), %err, "auto-transition failed");
        }
    }
}
