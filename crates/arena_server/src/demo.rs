//! The demo match: two teams patrolling toward each other across a walled
//! arena, trading volleys, fighting over a capture point in the middle.

use std::sync::Arc;

use anyhow::Result;
use arena_core::{Engine, EntityEvent, EntityId, Updater, Vec2, World};
use arena_gameplay::{
    BoundsWatcher, DEAD, PLAYER_RADIUS, PROJECTILE_RADIUS, life_cycle, spawn_capture_point,
    spawn_heal_zone, spawn_player, spawn_projectile, spawn_wall,
};
use arena_physics::{Bridge, CaptureZone, CollisionSystem, Health, OverlapWorld, Team};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::SimConfig;

/// First team, spawning on the left.
pub const RED: Team = Team(1);
/// Second team, spawning on the right.
pub const BLUE: Team = Team(2);

const SHOT_SPEED: f32 = 12.0;
const SHOT_POWER: f32 = 20.0;
const ROW_SPACING: f32 = 6.0;
const ADVANCE: f32 = 8.0;
const CULL_MARGIN: f32 = 2.0;
const MUZZLE_GAP: f32 = 0.05;

/// Running totals of the events a match produced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct MatchStats {
    /// Contact starts accepted by colliders.
    pub hits: u64,
    /// Total damage applied.
    pub damage_dealt: f32,
    /// Total hit points restored.
    pub healed: f32,
    /// Players downed.
    pub downs: u64,
    /// Players respawned.
    pub respawns: u64,
    /// Entities destroyed.
    pub destroyed: u64,
    /// Capture point ownership changes.
    pub captures: u64,
}

impl MatchStats {
    fn record(&mut self, event: &EntityEvent) {
        match event {
            EntityEvent::Hit { .. } => self.hits += 1,
            EntityEvent::Damaged { amount, .. } => self.damage_dealt += amount,
            EntityEvent::Healed { amount, .. } => self.healed += amount,
            EntityEvent::StateEntered(state) if state == DEAD => self.downs += 1,
            EntityEvent::StateExited(state) if state == DEAD => self.respawns += 1,
            EntityEvent::Destroyed => self.destroyed += 1,
            EntityEvent::Custom(tag) if tag.starts_with("captured:") => self.captures += 1,
            _ => {}
        }
    }
}

/// Where a shot leaves a player facing `direction`, just clear of its body.
fn muzzle(origin: Vec2, direction: Vec2) -> Vec2 {
    origin + direction * (PLAYER_RADIUS + PROJECTILE_RADIUS + MUZZLE_GAP)
}

/// Fires a shot from every standing player at the nearest standing enemy
/// every `interval` seconds.
#[derive(Debug)]
struct Volley {
    interval: f32,
    countdown: f32,
    roster: Vec<(EntityId, Team)>,
    fired: u64,
}

impl Volley {
    fn new(interval: f32, roster: Vec<(EntityId, Team)>) -> Self {
        Self {
            interval,
            countdown: interval,
            roster,
            fired: 0,
        }
    }

    fn standing(world: &World, id: EntityId) -> Option<Vec2> {
        if world.get::<Health>(id).is_none_or(Health::is_dead) {
            return None;
        }
        world.entity(id).map(|e| e.position())
    }

    fn aim(&self, world: &World, origin: Vec2, team: Team) -> Option<Vec2> {
        self.roster
            .iter()
            .filter(|&&(_, other)| other != team)
            .filter_map(|&(id, _)| Self::standing(world, id))
            .min_by(|a, b| origin.distance_squared(*a).total_cmp(&origin.distance_squared(*b)))
    }
}

impl Updater for Volley {
    fn name(&self) -> &str {
        "volley"
    }

    fn update(&mut self, world: &mut World, delta: f32) {
        self.countdown -= delta;
        if self.countdown > 0.0 {
            return;
        }
        self.countdown += self.interval;

        let view: &World = world;
        let shots: Vec<_> = self
            .roster
            .iter()
            .filter_map(|&(id, team)| {
                let origin = Self::standing(view, id)?;
                let direction = (self.aim(view, origin, team)? - origin).normalize_or_zero();
                (direction != Vec2::ZERO).then_some((origin, direction, team))
            })
            .collect();

        for (origin, direction, team) in shots {
            let velocity = direction * SHOT_SPEED;
            match spawn_projectile(world, muzzle(origin, direction), velocity, team, SHOT_POWER) {
                Ok(id) => {
                    self.fired += 1;
                    debug!(projectile = %id, %team, "shot fired");
                }
                Err(err) => warn!(error = %err, "failed to spawn projectile"),
            }
        }
    }
}

/// A running match.
pub struct Arena {
    engine: Engine,
    stats: MatchStats,
    capture_point: EntityId,
}

impl Arena {
    /// Lay out the arena described by `config`.
    ///
    /// # Errors
    ///
    /// Fails if the life cycle graph or any entity cannot be built.
    pub fn build(config: &SimConfig) -> Result<Self> {
        let mut engine = Engine::new();
        CollisionSystem::install(engine.world_mut(), OverlapWorld::with_substeps(config.substeps));

        let graph = Arc::new(life_cycle(config.respawn_delay)?);
        let bounds = config.bounds;
        let center = bounds.center();
        let reach = (bounds.max.x - center.x) * 0.7;
        let world = engine.world_mut();

        let mut roster = Vec::new();
        for (team, side) in [(RED, -1.0), (BLUE, 1.0)] {
            let home_x = center.x + side * reach;
            for row in 0..config.team_size {
                let offset = (row as f32 - (config.team_size as f32 - 1.0) / 2.0) * ROW_SPACING;
                let home = Vec2::new(home_x, center.y + offset);
                let front = Vec2::new(home_x - side * ADVANCE, home.y);
                let id = spawn_player(world, &graph, home, team, vec![home, front])?;
                roster.push((id, team));
            }
            spawn_heal_zone(world, Vec2::new(home_x + side * 2.0, center.y), 2.5, 0.5, Some(team))?;
            spawn_wall(world, Vec2::new(center.x + side * ADVANCE, center.y), Vec2::new(0.5, 4.0))?;
        }
        let capture_point = spawn_capture_point(world, center, 3.0, 1.0, 5.0)?;

        let players = roster.len();
        engine.add_updater(CollisionSystem::new());
        engine.add_updater(BoundsWatcher::new(bounds, CULL_MARGIN));
        engine.add_updater(Volley::new(config.volley_interval, roster));

        info!(players, entities = engine.world().entity_count(), "arena ready");
        Ok(Self {
            engine,
            stats: MatchStats::default(),
            capture_point,
        })
    }

    /// Advance the match one tick and tally what happened.
    pub fn tick(&mut self, delta: f32) {
        self.engine.tick(delta);
        for (_, event) in self.engine.world_mut().drain_events() {
            self.stats.record(&event);
        }
    }

    /// The engine running the match.
    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Totals so far.
    #[must_use]
    pub fn stats(&self) -> &MatchStats {
        &self.stats
    }

    /// Shots fired so far.
    #[must_use]
    pub fn shots_fired(&self) -> u64 {
        self.engine.updater::<Volley>().map_or(0, |volley| volley.fired)
    }

    /// Team holding the capture point.
    #[must_use]
    pub fn capture_owner(&self) -> Option<Team> {
        self.engine
            .world()
            .get::<Bridge<CaptureZone>>(self.capture_point)
            .and_then(|bridge| bridge.handler().owner())
    }

    /// Players currently standing, per team.
    #[must_use]
    pub fn standing(&self, team: Team) -> usize {
        self.engine.updater::<Volley>().map_or(0, |volley| {
            volley
                .roster
                .iter()
                .filter(|&&(id, t)| t == team && Volley::standing(self.engine.world(), id).is_some())
                .count()
        })
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("tick_id", &self.engine.tick_id())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
