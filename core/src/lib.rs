#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Last Stand wave director.
//!
//! Two paths touch session state. Drivers (the host loop, tests, the CLI)
//! submit [`Command`] values that the host session executes through its own
//! `apply` entry point, such as joining players or killing enemies. The wave
//! director does not go through [`Command`]: each call borrows the host's
//! collaborator traits bundled in [`Collaborators`] and mutates the host
//! through them directly, creating enemies and respawning players. Both paths
//! report what happened as [`Event`] values, and the host hands enemy deaths
//! back to the director as [`Event::EnemyKilled`].

use glam::Vec3;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when a session boots.
pub const WELCOME_BANNER: &str = "Last Stand. Hold the line.";

/// Speed multipliers applied per tier when an archetype does not override them.
pub const DEFAULT_TIER_SPEED: [f32; 4] = [1.0, 1.3, 1.6, 2.0];

/// Discrete movement-speed class assigned to every spawned enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpeedTier {
    /// Slowest shamble; the only tier available in the opening rounds.
    Tier1,
    /// Jog.
    Tier2,
    /// Run.
    Tier3,
    /// Sprint.
    Tier4,
}

impl SpeedTier {
    /// Every tier in sampling order.
    pub const ALL: [SpeedTier; 4] = [Self::Tier1, Self::Tier2, Self::Tier3, Self::Tier4];

    /// Zero-based position of the tier inside [`SpeedTier::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Tier1 => 0,
            Self::Tier2 => 1,
            Self::Tier3 => 2,
            Self::Tier4 => 3,
        }
    }
}

/// Identifier of an enemy archetype loaded from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArchetypeId(u32);

impl ArchetypeId {
    /// Creates a new archetype identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Handle returned by the enemy factory for a spawned enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// External identity required to recreate a player after it was destroyed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerIdentity {
    slot: u32,
    device: String,
    control_scheme: String,
}

impl PlayerIdentity {
    /// Creates a new identity for the provided join slot, device and control scheme.
    #[must_use]
    pub fn new(slot: u32, device: impl Into<String>, control_scheme: impl Into<String>) -> Self {
        Self {
            slot,
            device: device.into(),
            control_scheme: control_scheme.into(),
        }
    }

    /// Join slot occupied by the player.
    #[must_use]
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    /// Input device the player joined with.
    #[must_use]
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Control scheme bound to the device.
    #[must_use]
    pub fn control_scheme(&self) -> &str {
        &self.control_scheme
    }
}

/// Immutable representation of a single player's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerRecord {
    /// Identity used to destroy or recreate the player.
    pub identity: PlayerIdentity,
    /// World position of the player's current instance.
    pub position: Vec3,
    /// Indicates whether the player is standing.
    pub alive: bool,
    /// Points currently held by the player.
    pub points: i64,
}

/// Inclusive range of rounds during which an archetype may be sampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundWindow {
    #[serde(rename = "from")]
    from_round: u32,
    #[serde(rename = "to")]
    to_round: u32,
}

impl RoundWindow {
    /// Creates a window covering `from_round..=to_round`.
    #[must_use]
    pub const fn new(from_round: u32, to_round: u32) -> Self {
        Self {
            from_round,
            to_round,
        }
    }

    /// Window that never closes.
    #[must_use]
    pub const fn always() -> Self {
        Self::new(1, u32::MAX)
    }

    /// First round of the window.
    #[must_use]
    pub const fn from_round(&self) -> u32 {
        self.from_round
    }

    /// Last round of the window.
    #[must_use]
    pub const fn to_round(&self) -> u32 {
        self.to_round
    }

    /// Reports whether the provided round falls inside the window.
    #[must_use]
    pub const fn contains(&self, round: u32) -> bool {
        self.from_round <= round && round <= self.to_round
    }

    /// Reports whether the window spans at least one round.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.from_round <= self.to_round
    }
}

/// Base or scaled combat statistics of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    /// Hit points.
    pub health: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Damage dealt per hit.
    pub attack: f32,
}

/// Rule describing how an archetype's stats grow with difficulty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatScaling {
    /// Health follows the round health curve, attack follows the strength multiplier.
    #[default]
    RoundHealth,
    /// Health and attack both follow the strength multiplier.
    Strength,
    /// Base stats are never scaled.
    Fixed,
}

/// Immutable per-archetype configuration shared with every spawned enemy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyArchetype {
    id: ArchetypeId,
    name: String,
    window: RoundWindow,
    base: EnemyStats,
    #[serde(default)]
    scaling: StatScaling,
    #[serde(default = "default_tier_speed")]
    tier_speed: [f32; 4],
}

fn default_tier_speed() -> [f32; 4] {
    DEFAULT_TIER_SPEED
}

impl EnemyArchetype {
    /// Creates an archetype that scales with the round health curve.
    #[must_use]
    pub fn new(id: ArchetypeId, name: impl Into<String>, window: RoundWindow, base: EnemyStats) -> Self {
        Self {
            id,
            name: name.into(),
            window,
            base,
            scaling: StatScaling::default(),
            tier_speed: DEFAULT_TIER_SPEED,
        }
    }

    /// Replaces the scaling rule.
    #[must_use]
    pub fn with_scaling(mut self, scaling: StatScaling) -> Self {
        self.scaling = scaling;
        self
    }

    /// Replaces the per-tier speed multipliers.
    #[must_use]
    pub fn with_tier_speed(mut self, tier_speed: [f32; 4]) -> Self {
        self.tier_speed = tier_speed;
        self
    }

    /// Identifier of the archetype.
    #[must_use]
    pub const fn id(&self) -> ArchetypeId {
        self.id
    }

    /// Human readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rounds during which the archetype may be sampled.
    #[must_use]
    pub const fn window(&self) -> RoundWindow {
        self.window
    }

    /// Unscaled statistics.
    #[must_use]
    pub const fn base(&self) -> EnemyStats {
        self.base
    }

    /// Scaling rule applied at spawn time.
    #[must_use]
    pub const fn scaling(&self) -> StatScaling {
        self.scaling
    }

    /// Derives the stats handed to a freshly spawned enemy.
    ///
    /// `health_factor` is the round health curve normalised to round one and
    /// `strength` the director's compounding multiplier.
    #[must_use]
    pub fn scaled_stats(&self, health_factor: f64, strength: f32, tier: SpeedTier) -> EnemyStats {
        let (health, attack) = match self.scaling {
            StatScaling::RoundHealth => (
                (f64::from(self.base.health) * health_factor) as f32,
                self.base.attack * strength,
            ),
            StatScaling::Strength => (self.base.health * strength, self.base.attack * strength),
            StatScaling::Fixed => (self.base.health, self.base.attack),
        };

        EnemyStats {
            health,
            speed: self.base.speed * self.tier_speed[tier.index()],
            attack,
        }
    }
}

/// Creation request handed to the enemy factory.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnRequest {
    /// Archetype selected by the spawn plan.
    pub archetype: ArchetypeId,
    /// Spawn point chosen for the enemy.
    pub position: Vec3,
    /// Strength multiplier of the current round.
    pub strength: f32,
    /// Round health curve normalised to round one.
    pub health_factor: f64,
    /// Speed tier sampled for the enemy.
    pub tier: SpeedTier,
}

impl SpawnRequest {
    /// Stats of the enemy produced by this request.
    #[must_use]
    pub fn stats(&self, archetype: &EnemyArchetype) -> EnemyStats {
        archetype.scaled_stats(self.health_factor, self.strength, self.tier)
    }
}

/// Mutable round bookkeeping owned exclusively by the director.
///
/// The alive count is derived from the spawned and dead counters, so
/// `alive == spawned - dead` holds at all times.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundState {
    round: u32,
    target: u32,
    spawned: u32,
    dead: u32,
    strength: f32,
    active: bool,
    total_killed: u64,
}

impl Default for RoundState {
    fn default() -> Self {
        Self {
            round: 0,
            target: 0,
            spawned: 0,
            dead: 0,
            strength: 1.0,
            active: false,
            total_killed: 0,
        }
    }
}

impl RoundState {
    /// Enters `round` with fresh counters and leaves the round inactive.
    pub fn begin(&mut self, round: u32, target: u32, strength: f32) {
        self.round = round;
        self.target = target;
        self.spawned = 0;
        self.dead = 0;
        self.strength = strength;
        self.active = false;
    }

    /// Marks the round as in combat.
    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Counts a spawn, refusing to exceed the round target.
    pub fn record_spawn(&mut self) -> bool {
        if self.spawned >= self.target {
            return false;
        }
        self.spawned += 1;
        true
    }

    /// Counts a death, refusing to exceed the number of spawned enemies.
    pub fn record_death(&mut self) -> bool {
        if self.dead >= self.spawned {
            return false;
        }
        self.dead += 1;
        self.total_killed = self.total_killed.saturating_add(1);
        true
    }

    /// Current round number; zero before the first round starts.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Total enemies to spawn this round.
    #[must_use]
    pub const fn target(&self) -> u32 {
        self.target
    }

    /// Enemies spawned so far this round.
    #[must_use]
    pub const fn spawned(&self) -> u32 {
        self.spawned
    }

    /// Enemies that died this round.
    #[must_use]
    pub const fn dead(&self) -> u32 {
        self.dead
    }

    /// Enemies currently alive.
    #[must_use]
    pub const fn alive(&self) -> u32 {
        self.spawned - self.dead
    }

    /// Enemies still waiting to be spawned this round.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.target - self.spawned
    }

    /// Compounding difficulty scalar handed to spawned enemies.
    #[must_use]
    pub const fn strength(&self) -> f32 {
        self.strength
    }

    /// Reports whether spawning or combat is in progress.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Enemies killed across every round of the session.
    #[must_use]
    pub const fn total_killed(&self) -> u64 {
        self.total_killed
    }

    /// Reports whether every enemy of the round has been spawned.
    #[must_use]
    pub const fn spawning_finished(&self) -> bool {
        self.spawned == self.target
    }

    /// Reports whether every enemy of the round has been spawned and killed.
    #[must_use]
    pub const fn is_cleared(&self) -> bool {
        self.spawning_finished() && self.dead == self.spawned
    }
}

/// Reasons a player could not be recreated at a round boundary.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RejoinError {
    /// No player ever joined through the slot.
    #[error("no player registered in slot {0}")]
    UnknownPlayer(u32),
    /// The slot still owns a live instance, so it was never destroyed.
    #[error("player in slot {0} still has a live instance")]
    StillActive(u32),
}

/// Creates enemies on behalf of the director.
pub trait EnemyFactory {
    /// Creates an enemy for the request and returns the handle that will be
    /// reported back when it dies.
    fn spawn(&mut self, request: &SpawnRequest, archetype: &EnemyArchetype) -> EnemyId;
}

/// Read access and lifecycle control over the players of the session.
pub trait PlayerRegistry {
    /// Snapshot of every registered player.
    fn players(&self) -> Vec<PlayerRecord>;

    /// Number of players currently standing.
    fn living_count(&self) -> u32 {
        self.players().iter().filter(|player| player.alive).count() as u32
    }

    /// Destroys the current instance of the player.
    fn destroy(&mut self, identity: &PlayerIdentity);

    /// Recreates a destroyed player from its captured identity.
    fn rejoin(&mut self, identity: &PlayerIdentity) -> Result<PlayerRecord, RejoinError>;

    /// Moves the player's current instance.
    fn place(&mut self, identity: &PlayerIdentity, position: Vec3);

    /// Adds points to the player's balance.
    fn grant_points(&mut self, identity: &PlayerIdentity, amount: i64);

    /// Designated spawn point used when no living player can anchor a respawn.
    fn default_spawn(&self) -> Option<Vec3>;
}

/// Mutable set of world locations enemies may spawn at.
pub trait SpawnPointProvider {
    /// Appends the points of a newly unlocked area.
    fn add_zone(&mut self, points: Vec<Vec3>);

    /// Picks a registered point uniformly at random.
    fn pick_random(&self, rng: &mut dyn RngCore) -> Option<Vec3>;

    /// Number of registered points.
    fn len(&self) -> usize;

    /// Reports whether no point has been registered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fire-and-forget audio/VFX trigger.
pub trait CueSink {
    /// Announces that an enemy appeared at `position`.
    fn notify_spawn(&mut self, position: Vec3);
}

/// Collaborators injected into the director for the duration of a call.
pub struct Collaborators<'a> {
    /// Factory that creates enemies.
    pub enemies: &'a mut dyn EnemyFactory,
    /// Registry of the players taking part in the session.
    pub players: &'a mut dyn PlayerRegistry,
    /// Enemy spawn locations.
    pub spawn_points: &'a mut dyn SpawnPointProvider,
    /// Audio/VFX trigger.
    pub cues: &'a mut dyn CueSink,
}

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Registers a player joining through a new slot.
    JoinPlayer {
        /// Identity the player joined with.
        identity: PlayerIdentity,
        /// Initial position of the player.
        position: Vec3,
    },
    /// Moves a standing player.
    MovePlayer {
        /// Join slot of the player.
        slot: u32,
        /// New position.
        position: Vec3,
    },
    /// Knocks a player down until the next round boundary.
    DownPlayer {
        /// Join slot of the player.
        slot: u32,
    },
    /// Kills a live enemy.
    KillEnemy {
        /// Handle of the enemy.
        enemy: EnemyId,
    },
    /// Unlocks a new map area with additional enemy spawn points.
    UnlockZone {
        /// Spawn points contained in the area.
        points: Vec<Vec3>,
    },
}

/// Events broadcast by the session and the director.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A player joined the session.
    PlayerJoined {
        /// Join slot of the player.
        slot: u32,
    },
    /// A player went down.
    PlayerDowned {
        /// Join slot of the player.
        slot: u32,
    },
    /// An enemy died; the director must be notified.
    EnemyKilled {
        /// Handle of the enemy.
        enemy: EnemyId,
    },
    /// New spawn points became available.
    ZoneUnlocked {
        /// Number of points added.
        points: usize,
    },
    /// A round was prepared and entered its inter-round pause.
    RoundStarted {
        /// Round number.
        round: u32,
        /// Enemies that will be spawned.
        target: u32,
        /// Strength multiplier of the round.
        strength: f32,
    },
    /// The inter-round pause elapsed and spawning began.
    RoundActivated {
        /// Round number.
        round: u32,
    },
    /// The director spawned an enemy.
    EnemySpawned {
        /// Handle returned by the factory.
        enemy: EnemyId,
        /// Archetype of the enemy.
        archetype: ArchetypeId,
        /// Speed tier of the enemy.
        tier: SpeedTier,
        /// Spawn point used.
        position: Vec3,
    },
    /// Every enemy of the round was spawned and killed.
    RoundCleared {
        /// Round number.
        round: u32,
    },
    /// No archetype window covered the round; every archetype was used instead.
    ArchetypePoolFallback {
        /// Round number.
        round: u32,
    },
    /// The round cannot spawn its enemies and will never complete.
    RoundStalled {
        /// Round number.
        round: u32,
        /// Enemies the round expected to spawn.
        target: u32,
    },
    /// A dead player was recreated at a round boundary.
    PlayerRespawned {
        /// Join slot of the player.
        slot: u32,
        /// Position the player was placed at.
        position: Vec3,
        /// Points granted to reach the round minimum.
        granted: i64,
    },
    /// A dead player could not be recreated.
    RespawnSkipped {
        /// Join slot of the player.
        slot: u32,
        /// Failure reported by the registry.
        reason: RejoinError,
    },
}

/// Serde adapter storing a [`std::time::Duration`] as floating seconds.
pub mod duration_secs {
    use std::time::Duration;

    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    /// Serialises the duration as seconds.
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    /// Deserialises non-negative seconds into a duration.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let seconds = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(seconds).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn round_state_derives_alive_from_counters() {
        let mut state = RoundState::default();
        state.begin(1, 3, 1.0);
        assert!(state.record_spawn());
        assert!(state.record_spawn());
        assert!(state.record_death());
        assert_eq!(state.alive(), 1);
        assert_eq!(state.remaining(), 1);
        assert!(!state.spawning_finished());
    }

    #[test]
    fn round_state_refuses_overflowing_counters() {
        let mut state = RoundState::default();
        state.begin(1, 1, 1.0);
        assert!(!state.record_death(), "no enemy spawned yet");
        assert!(state.record_spawn());
        assert!(!state.record_spawn(), "target already reached");
        assert!(state.record_death());
        assert!(!state.record_death(), "enemy already dead");
        assert!(state.is_cleared());
        assert_eq!(state.total_killed(), 1);
    }

    #[test]
    fn begin_keeps_session_kill_total() {
        let mut state = RoundState::default();
        state.begin(1, 1, 1.0);
        state.activate();
        assert!(state.record_spawn());
        assert!(state.record_death());
        state.begin(2, 4, 1.1);
        assert_eq!(state.spawned(), 0);
        assert_eq!(state.dead(), 0);
        assert!(!state.is_active());
        assert_eq!(state.total_killed(), 1);
    }

    #[test]
    fn window_is_inclusive() {
        let window = RoundWindow::new(3, 5);
        assert!(!window.contains(2));
        assert!(window.contains(3));
        assert!(window.contains(5));
        assert!(!window.contains(6));
        assert!(!RoundWindow::new(4, 3).is_valid());
    }

    #[test]
    fn scaled_stats_follow_scaling_rule() {
        let base = EnemyStats {
            health: 100.0,
            speed: 2.0,
            attack: 10.0,
        };
        let walker = EnemyArchetype::new(ArchetypeId::new(0), "walker", RoundWindow::always(), base);
        let stats = walker.scaled_stats(2.0, 1.5, SpeedTier::Tier3);
        assert!((stats.health - 200.0).abs() < 1e-4);
        assert!((stats.attack - 15.0).abs() < 1e-4);
        assert!((stats.speed - 3.2).abs() < 1e-4);

        let brute = walker.clone().with_scaling(StatScaling::Strength);
        let stats = brute.scaled_stats(2.0, 1.5, SpeedTier::Tier1);
        assert!((stats.health - 150.0).abs() < 1e-4);

        let dummy = walker.with_scaling(StatScaling::Fixed);
        assert_eq!(dummy.scaled_stats(9.0, 9.0, SpeedTier::Tier1), base);
    }

    #[derive(Debug, serde::Deserialize)]
    struct Timing {
        #[serde(with = "duration_secs")]
        delay: Duration,
    }

    #[test]
    fn durations_parse_from_seconds() {
        let timing: Timing = toml::from_str("delay = 0.25").expect("parse fractional seconds");
        assert_eq!(timing.delay, Duration::from_millis(250));

        let timing: Timing = toml::from_str("delay = 30").expect("parse integer seconds");
        assert_eq!(timing.delay, Duration::from_secs(30));

        assert!(toml::from_str::<Timing>("delay = -1.0").is_err());
    }

    #[test]
    fn archetype_defaults_fill_optional_fields() {
        let archetype: EnemyArchetype = toml::from_str(
            r#"
            id = 4
            name = "crawler"
            window = { from = 2, to = 9 }
            base = { health = 80.0, speed = 1.5, attack = 20.0 }
            "#,
        )
        .expect("parse archetype");
        assert_eq!(archetype.id(), ArchetypeId::new(4));
        assert_eq!(archetype.scaling(), StatScaling::RoundHealth);
        assert_eq!(archetype.window(), RoundWindow::new(2, 9));
    }
}
