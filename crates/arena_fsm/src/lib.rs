//! # arena_fsm
//!
//! Declarative finite-state machines for arena entities.
//!
//! A [`StateGraph`] names states and, for each, the sibling behaviors to
//! enable or disable on entry and exit, trigger edges, an optional timed
//! auto-transition, and a priority. A [`StateMachine`] behavior walks the
//! graph for one entity; [`FsmExt`] drives it by entity id.
//!
//! At most one transition runs at a time per machine. A request raised while
//! one is running is kept only if its state's priority is strictly higher;
//! ties are logged as conflicts and dropped.
//!
//! ```rust
//! use arena_core::{Behavior, Transform2D, World};
//! use arena_fsm::{FsmExt, State, StateGraph, StateMachine};
//!
//! struct Legs;
//! impl Behavior for Legs {}
//!
//! let graph = StateGraph::builder()
//!     .state(State::new("alive").enable::<Legs>())
//!     .state(State::new("dead").disable::<Legs>().auto("alive", 3.0))
//!     .build()
//!     .unwrap();
//!
//! let mut world = World::new();
//! let mut entity = world.create_entity(Transform2D::IDENTITY);
//! entity.add_behavior(Legs);
//! entity.add_behavior(StateMachine::starting_in(graph, "alive").unwrap());
//! let id = world.add_entity(entity, None).unwrap();
//!
//! world.switch_state(id, "dead").unwrap();
//! assert_eq!(world.current_state(id), Some("dead"));
//! ```

pub mod error;
pub mod ext;
pub mod graph;
pub mod machine;
pub mod queue;

pub use error::FsmError;
pub use ext::FsmExt;
pub use graph::{AutoTransition, Effect, State, StateGraph, StateGraphBuilder, Toggle};
pub use machine::{StateMachine, Switch};
pub use queue::TransitionQueue;
