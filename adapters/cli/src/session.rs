//! Session files describing the director tunables, archetypes and map.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use glam::Vec3;
use last_stand_core::{ArchetypeId, EnemyArchetype, EnemyStats, RoundWindow, StatScaling};
use last_stand_system_director::DirectorConfig;
use serde::Deserialize;

const ARENA_RADIUS: f32 = 25.0;
const OUTSKIRTS_RADIUS: f32 = 40.0;
const OUTSKIRTS_ROUND: u32 = 4;

/// Group of spawn points unlocked together.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub(crate) struct ZoneFile {
    /// Round at the start of which the zone opens.
    #[serde(default = "first_round")]
    pub(crate) unlock_round: u32,
    /// Spawn points of the zone.
    pub(crate) points: Vec<Vec3>,
}

fn first_round() -> u32 {
    1
}

/// Everything needed to run a headless session.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct SessionFile {
    pub(crate) director: DirectorConfig,
    pub(crate) archetypes: Vec<EnemyArchetype>,
    pub(crate) zones: Vec<ZoneFile>,
    pub(crate) player_spawn: Option<Vec3>,
}

impl SessionFile {
    /// Reads and parses a TOML session file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read session file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid session file {}", path.display()))
    }

    pub(crate) fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

impl Default for SessionFile {
    fn default() -> Self {
        Self {
            director: DirectorConfig::default(),
            archetypes: vec![
                EnemyArchetype::new(
                    ArchetypeId::new(0),
                    "shambler",
                    RoundWindow::always(),
                    EnemyStats {
                        health: 150.0,
                        speed: 1.2,
                        attack: 20.0,
                    },
                ),
                EnemyArchetype::new(
                    ArchetypeId::new(1),
                    "brute",
                    RoundWindow::new(6, u32::MAX),
                    EnemyStats {
                        health: 600.0,
                        speed: 0.8,
                        attack: 45.0,
                    },
                )
                .with_scaling(StatScaling::Strength),
            ],
            zones: vec![
                ZoneFile {
                    unlock_round: 1,
                    points: ring(ARENA_RADIUS, 8),
                },
                ZoneFile {
                    unlock_round: OUTSKIRTS_ROUND,
                    points: ring(OUTSKIRTS_RADIUS, 4),
                },
            ],
            player_spawn: Some(Vec3::ZERO),
        }
    }
}

fn ring(radius: f32, count: u32) -> Vec<Vec3> {
    (0..count)
        .map(|index| {
            let angle = std::f32::consts::TAU * index as f32 / count as f32;
            Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin())
        })
        .collect()
}
