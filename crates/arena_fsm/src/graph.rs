//! Declarative state graphs.
//!
//! A [`StateGraph`] is built once and shared by every machine that uses it.
//! Each [`State`] lists the sibling behaviors to enable or disable when it is
//! entered and left, the trigger edges leading out of it, an optional timed
//! auto-transition, and the priority its transitions carry when they compete
//! with a transition already in flight.

use std::collections::{BTreeMap, HashMap};

use arena_core::{Behavior, BehaviorKey};

use crate::error::FsmError;

/// Whether an effect turns its target on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// Set the target's enabled flag.
    Enable,
    /// Clear the target's enabled flag.
    Disable,
}

/// One enable/disable instruction resolved against the owning entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effect {
    /// The sibling behavior's key.
    pub key: BehaviorKey,
    /// Label used in logs.
    pub label: &'static str,
    /// What to do with it.
    pub toggle: Toggle,
}

impl Effect {
    fn of<T: Behavior>(toggle: Toggle) -> Self {
        Self {
            key: BehaviorKey::of::<T>(),
            label: std::any::type_name::<T>(),
            toggle,
        }
    }
}

/// A timed transition armed on entering a state.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoTransition {
    /// Destination state.
    pub target: String,
    /// Seconds spent in the state before switching.
    pub delay: f32,
}

/// A named node of a [`StateGraph`].
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    name: String,
    priority: i32,
    enter: Vec<Effect>,
    exit: Vec<Effect>,
    edges: BTreeMap<String, String>,
    auto: Option<AutoTransition>,
}

impl State {
    /// A state with no effects, edges, or auto-transition, at priority 0.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            enter: Vec::new(),
            exit: Vec::new(),
            edges: BTreeMap::new(),
            auto: None,
        }
    }

    /// Priority of transitions into this state.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Enable `T` on entering this state.
    #[must_use]
    pub fn enable<T: Behavior>(mut self) -> Self {
        self.enter.push(Effect::of::<T>(Toggle::Enable));
        self
    }

    /// Disable `T` on entering this state.
    #[must_use]
    pub fn disable<T: Behavior>(mut self) -> Self {
        self.enter.push(Effect::of::<T>(Toggle::Disable));
        self
    }

    /// Enable `T` on leaving this state.
    #[must_use]
    pub fn exit_enable<T: Behavior>(mut self) -> Self {
        self.exit.push(Effect::of::<T>(Toggle::Enable));
        self
    }

    /// Disable `T` on leaving this state.
    #[must_use]
    pub fn exit_disable<T: Behavior>(mut self) -> Self {
        self.exit.push(Effect::of::<T>(Toggle::Disable));
        self
    }

    /// Add an entering effect for a behavior registered under an explicit key.
    #[must_use]
    pub fn effect(mut self, key: BehaviorKey, label: &'static str, toggle: Toggle) -> Self {
        self.enter.push(Effect { key, label, toggle });
        self
    }

    /// Follow `trigger` to `target`.
    #[must_use]
    pub fn on(mut self, trigger: impl Into<String>, target: impl Into<String>) -> Self {
        self.edges.insert(trigger.into(), target.into());
        self
    }

    /// Switch to `target` after `delay` seconds in this state.
    #[must_use]
    pub fn auto(mut self, target: impl Into<String>, delay: f32) -> Self {
        self.auto = Some(AutoTransition {
            target: target.into(),
            delay,
        });
        self
    }

    /// The state's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The state's priority.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Effects applied on entry, in declaration order.
    #[must_use]
    pub fn enter_effects(&self) -> &[Effect] {
        &self.enter
    }

    /// Effects applied on exit, in declaration order.
    #[must_use]
    pub fn exit_effects(&self) -> &[Effect] {
        &self.exit
    }

    /// The state reached by `trigger`, if there is an edge for it.
    #[must_use]
    pub fn edge(&self, trigger: &str) -> Option<&str> {
        self.edges.get(trigger).map(String::as_str)
    }

    /// The timed auto-transition, if declared.
    #[must_use]
    pub fn auto_transition(&self) -> Option<&AutoTransition> {
        self.auto.as_ref()
    }
}

/// An immutable, validated set of states.
#[derive(Debug, Clone, Default)]
pub struct StateGraph {
    states: HashMap<String, State>,
    order: Vec<String>,
}

impl StateGraph {
    /// Start building a graph.
    #[must_use]
    pub fn builder() -> StateGraphBuilder {
        StateGraphBuilder::default()
    }

    /// Look up a state.
    #[must_use]
    pub fn state(&self, name: &str) -> Option<&State> {
        self.states.get(name)
    }

    /// Returns `true` if the graph has a state named `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    /// State names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the graph has no states.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Collects states and validates them into a [`StateGraph`].
#[derive(Debug, Default)]
pub struct StateGraphBuilder {
    states: Vec<State>,
}

impl StateGraphBuilder {
    /// Declare a state.
    #[must_use]
    pub fn state(mut self, state: State) -> Self {
        self.states.push(state);
        self
    }

    /// Validate and freeze the graph.
    ///
    /// # Errors
    ///
    /// Returns [`FsmError::DuplicateState`] for a repeated name,
    /// [`FsmError::UnknownTarget`] for an edge or auto-transition leading
    /// nowhere, and [`FsmError::InvalidDelay`] for a negative or non-finite
    /// delay.
    pub fn build(self) -> Result<StateGraph, FsmError> {
        let mut graph = StateGraph::default();
        for state in self.states {
            if graph.states.contains_key(&state.name) {
                return Err(FsmError::DuplicateState(state.name));
            }
            graph.order.push(state.name.clone());
            graph.states.insert(state.name.clone(), state);
        }

        for name in &graph.order {
            let state = &graph.states[name];
            for target in state.edges.values() {
                if !graph.states.contains_key(target) {
                    return Err(FsmError::UnknownTarget {
                        from: name.clone(),
                        to: target.clone(),
                    });
                }
            }
            if let Some(auto) = &state.auto {
                if !graph.states.contains_key(&auto.target) {
                    return Err(FsmError::UnknownTarget {
                        from: name.clone(),
                        to: auto.target.clone(),
                    });
                }
                if !auto.delay.is_finite() || auto.delay < 0.0 {
                    return Err(FsmError::InvalidDelay(name.clone()));
                }
            }
        }
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Legs;
    impl Behavior for Legs {}

    struct Gun;
    impl Behavior for Gun {}

    #[test]
    fn test_build_valid_graph() {
        let graph = StateGraph::builder()
            .state(State::new("alive").enable::<Legs>().enable::<Gun>())
            .state(
                State::new("dead")
                    .disable::<Legs>()
                    .disable::<Gun>()
                    .auto("alive", 3.0)
                    .with_priority(10),
            )
            .build()
            .unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.names().collect::<Vec<_>>(), vec!["alive", "dead"]);
        let dead = graph.state("dead").unwrap();
        assert_eq!(dead.priority(), 10);
        assert_eq!(dead.enter_effects().len(), 2);
        assert_eq!(dead.enter_effects()[0].key, BehaviorKey::of::<Legs>());
        assert_eq!(dead.enter_effects()[0].toggle, Toggle::Disable);
        assert_eq!(dead.auto_transition().unwrap().target, "alive");
    }

    #[test]
    fn test_edges() {
        let graph = StateGraph::builder()
            .state(State::new("idle").on("alarm", "chase"))
            .state(State::new("chase").on("lost", "idle"))
            .build()
            .unwrap();
        assert_eq!(graph.state("idle").unwrap().edge("alarm"), Some("chase"));
        assert_eq!(graph.state("idle").unwrap().edge("lost"), None);
    }

    #[test]
    fn test_duplicate_state_rejected() {
        let err = StateGraph::builder()
            .state(State::new("a"))
            .state(State::new("a"))
            .build()
            .unwrap_err();
        assert_eq!(err, FsmError::DuplicateState("a".into()));
    }

    #[test]
    fn test_dangling_edge_rejected() {
        let err = StateGraph::builder()
            .state(State::new("a").on("go", "nowhere"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            FsmError::UnknownTarget {
                from: "a".into(),
                to: "nowhere".into()
            }
        );
    }

    #[test]
    fn test_negative_delay_rejected() {
        let err = StateGraph::builder()
            .state(State::new("a").auto("a", -1.0))
            .build()
            .unwrap_err();
        assert_eq!(err, FsmError::InvalidDelay("a".into()));
    }

    #[test]
    fn test_exit_effects() {
        let state = State::new("stunned").exit_enable::<Legs>().exit_disable::<Gun>();
        assert!(state.enter_effects().is_empty());
        assert_eq!(state.exit_effects()[0].toggle, Toggle::Enable);
        assert_eq!(state.exit_effects()[1].key, BehaviorKey::of::<Gun>());
    }
}
