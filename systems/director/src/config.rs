//! Director configuration and its validation.

use std::time::Duration;

use last_stand_core::{duration_secs, ArchetypeId, EnemyArchetype};
use last_stand_system_respawn::RespawnConfig;
use last_stand_system_spawning::{PacingConfig, PacingMode};
use last_stand_system_wave_generation::PoolFallback;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_GROWTH_FACTOR: f32 = 1.1;
const DEFAULT_ROUND_DELAY: Duration = Duration::from_secs(30);

/// Errors raised when a director is built from an unusable configuration.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum DirectorError {
    /// The archetype list is empty.
    #[error("at least one enemy archetype is required")]
    NoArchetypes,
    /// Two archetypes share an identifier.
    #[error("archetype id {0} is used more than once")]
    DuplicateArchetype(u32),
    /// An archetype window ends before it starts.
    #[error("archetype `{name}` has an empty round window {from}..={to}")]
    InvalidWindow {
        /// Name of the archetype.
        name: String,
        /// First round of the window.
        from: u32,
        /// Last round of the window.
        to: u32,
    },
    /// The strength growth factor would weaken enemies over time.
    #[error("growth factor must be a finite value of at least 1.0, got {0}")]
    GrowthBelowOne(f32),
    /// No enemy could ever be alive.
    #[error("max_alive must be at least 1")]
    ZeroAliveCap,
    /// Respawned players would be placed on an inverted disk.
    #[error("respawn offset radius must be finite and non-negative, got {0}")]
    NegativeRadius(f32),
    /// Delayed pacing was configured without a spawn interval.
    #[error("delayed pacing requires a positive spawn interval")]
    InvalidDelay,
}

/// Tunables of the wave director.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Strength multiplier applied at every round after the first.
    pub growth_factor: f32,
    /// Pause before a freshly started round begins spawning.
    #[serde(with = "duration_secs")]
    pub round_delay: Duration,
    /// Spawn cadence and alive cap.
    pub pacing: PacingConfig,
    /// Round-boundary respawn rules.
    pub respawn: RespawnConfig,
    /// Recovery policy for rounds no archetype window covers.
    pub pool_fallback: PoolFallback,
    /// Fixed seed for reproducible sessions; drawn from entropy when absent.
    pub rng_seed: Option<u64>,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            growth_factor: DEFAULT_GROWTH_FACTOR,
            round_delay: DEFAULT_ROUND_DELAY,
            pacing: PacingConfig::default(),
            respawn: RespawnConfig::default(),
            pool_fallback: PoolFallback::default(),
            rng_seed: None,
        }
    }
}

impl DirectorConfig {
    /// Checks the tunables that do not depend on the archetype list.
    pub fn validate(&self) -> Result<(), DirectorError> {
        if !self.growth_factor.is_finite() || self.growth_factor < 1.0 {
            return Err(DirectorError::GrowthBelowOne(self.growth_factor));
        }
        if self.pacing.max_alive == 0 {
            return Err(DirectorError::ZeroAliveCap);
        }
        if self.pacing.mode == PacingMode::Delayed && self.pacing.spawn_interval.is_zero() {
            return Err(DirectorError::InvalidDelay);
        }
        let radius = self.respawn.offset_radius;
        if !radius.is_finite() || radius < 0.0 {
            return Err(DirectorError::NegativeRadius(radius));
        }
        Ok(())
    }
}

pub(crate) fn validate_archetypes(archetypes: &[EnemyArchetype]) -> Result<(), DirectorError> {
    if archetypes.is_empty() {
        return Err(DirectorError::NoArchetypes);
    }

    let mut seen: Vec<ArchetypeId> = Vec::with_capacity(archetypes.len());
    for archetype in archetypes {
        let window = archetype.window();
        if !window.is_valid() {
            return Err(DirectorError::InvalidWindow {
                name: archetype.name().to_owned(),
                from: window.from_round(),
                to: window.to_round(),
            });
        }
        if seen.contains(&archetype.id()) {
            return Err(DirectorError::DuplicateArchetype(archetype.id().get()));
        }
        seen.push(archetype.id());
    }
    Ok(())
}
