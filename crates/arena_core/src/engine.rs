//! Simulation loop state.
//!
//! The [`Engine`] owns the [`World`] and an ordered list of [`Updater`]s.
//! One call to [`Engine::tick`] is one simulation step:
//!
//! 1. Advance the tick counter.
//! 2. Update every live entity (registration order, behaviors by priority).
//! 3. Run every running updater once, in registration order.

use tracing::{debug, info};

use crate::behavior::AsAny;
use crate::group::GroupId;
use crate::world::World;

/// A world-level system run once per tick after the entity pass.
pub trait Updater: AsAny {
    /// The updater name, used to start and stop it.
    fn name(&self) -> &str;

    /// The group holding this updater's own entities, if any.
    ///
    /// Stopping the updater pauses this group; starting it resumes it.
    fn group(&self) -> Option<GroupId> {
        None
    }

    /// Per-tick logic.
    fn update(&mut self, world: &mut World, delta: f32);
}

struct UpdaterEntry {
    updater: Box<dyn Updater>,
    running: bool,
}

/// The simulation engine.
pub struct Engine {
    world: World,
    updaters: Vec<UpdaterEntry>,
    tick_id: u64,
    elapsed: f64,
}

impl Engine {
    /// Create an engine around an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::with_world(World::new())
    }

    /// Create an engine around an existing world.
    #[must_use]
    pub fn with_world(world: World) -> Self {
        Self {
            world,
            updaters: Vec::new(),
            tick_id: 0,
            elapsed: 0.0,
        }
    }

    /// Returns a reference to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Returns a mutable reference to the world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Register an updater. It starts running immediately.
    pub fn add_updater(&mut self, updater: impl Updater) {
        info!(updater = updater.name(), "updater registered");
        self.updaters.push(UpdaterEntry {
            updater: Box::new(updater),
            running: true,
        });
    }

    /// Resume a stopped updater and its group. Returns `false` if no updater
    /// has that name.
    pub fn start(&mut self, name: &str) -> bool {
        self.set_running(name, true)
    }

    /// Stop an updater and pause its group. Its entities stay alive.
    pub fn stop(&mut self, name: &str) -> bool {
        self.set_running(name, false)
    }

    fn set_running(&mut self, name: &str, running: bool) -> bool {
        let Some(entry) = self.updaters.iter_mut().find(|e| e.updater.name() == name) else {
            return false;
        };
        entry.running = running;
        if let Some(group) = entry.updater.group() {
            let toggled = if running {
                self.world.resume_group(group)
            } else {
                self.world.pause_group(group)
            };
            if let Err(err) = toggled {
                debug!(updater = name, error = %err, "updater group not toggled");
            }
        }
        debug!(updater = name, running, "updater toggled");
        true
    }

    /// Returns `true` if the named updater exists and is running.
    #[must_use]
    pub fn is_running(&self, name: &str) -> bool {
        self.updaters
            .iter()
            .any(|e| e.running && e.updater.name() == name)
    }

    /// Borrow the first updater of type `T`.
    #[must_use]
    pub fn updater<T: Updater>(&self) -> Option<&T> {
        self.updaters
            .iter()
            .find_map(|e| (*e.updater).as_any().downcast_ref::<T>())
    }

    /// Mutably borrow the first updater of type `T`.
    pub fn updater_mut<T: Updater>(&mut self) -> Option<&mut T> {
        self.updaters
            .iter_mut()
            .find_map(|e| (*e.updater).as_any_mut().downcast_mut::<T>())
    }

    /// Number of registered updaters.
    #[must_use]
    pub fn updater_count(&self) -> usize {
        self.updaters.len()
    }

    /// Run one simulation step.
    pub fn tick(&mut self, delta: f32) {
        self.tick_id += 1;
        self.elapsed += f64::from(delta);
        debug!(tick_id = self.tick_id, delta, "tick start");

        self.world.update(delta);
        for entry in &mut self.updaters {
            if entry.running {
                entry.updater.update(&mut self.world, delta);
            }
        }
    }

    /// Returns the current tick counter.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    /// Simulated seconds since the engine was created.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("tick_id", &self.tick_id)
            .field("updaters", &self.updaters.len())
            .field("world", &self.world)
            .finish()
    }
}
