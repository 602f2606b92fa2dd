#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Round-boundary respawn of downed players.
//!
//! Every player that went down during a round is destroyed and recreated from
//! its captured identity when the next round starts. Recreated players appear
//! next to a standing teammate and are topped up to the round's point minimum.

use std::f32::consts::TAU;

use glam::Vec3;
use last_stand_core::{Event, PlayerIdentity, PlayerRegistry};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Configuration parameters required to construct the respawn system.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RespawnConfig {
    /// Whether downed players come back at round boundaries.
    pub enabled: bool,
    /// Points guaranteed to a respawned player in round one.
    pub base_points: i64,
    /// Additional guaranteed points per round after the first.
    pub points_per_round: i64,
    /// Radius of the disk around the anchor players are placed in.
    pub offset_radius: f32,
}

impl Default for RespawnConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_points: 500,
            points_per_round: 250,
            offset_radius: 2.0,
        }
    }
}

/// Points a respawned player is guaranteed to hold in `round`.
#[must_use]
pub fn minimum_points(config: &RespawnConfig, round: u32) -> i64 {
    let rounds_survived = i64::from(round.saturating_sub(1));
    config
        .base_points
        .saturating_add(rounds_survived.saturating_mul(config.points_per_round))
        .max(0)
}

/// Uniformly distributed offset inside a disk of `radius` on the ground plane.
pub fn disk_offset<R: Rng + ?Sized>(radius: f32, rng: &mut R) -> Vec3 {
    let angle = rng.gen::<f32>() * TAU;
    let distance = radius * rng.gen::<f32>().sqrt();
    Vec3::new(distance * angle.cos(), 0.0, distance * angle.sin())
}

/// Outcome of a respawn pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RespawnSummary {
    /// Players recreated.
    pub respawned: u32,
    /// Players that could not be recreated.
    pub skipped: u32,
    /// Points granted across every respawned player.
    pub granted: i64,
}

/// Pure system that brings downed players back at round boundaries.
#[derive(Debug)]
pub struct Respawn {
    config: RespawnConfig,
}

impl Respawn {
    /// Creates a new respawn system using the supplied configuration.
    #[must_use]
    pub const fn new(config: RespawnConfig) -> Self {
        Self { config }
    }

    /// Configuration the system was created with.
    #[must_use]
    pub const fn config(&self) -> &RespawnConfig {
        &self.config
    }

    /// Recreates every downed player for the start of `round`.
    ///
    /// Standing players anchor the placement; when nobody is standing the
    /// registry's default spawn is used, or the origin if it has none. A
    /// failed rejoin skips that player and the pass continues.
    pub fn process<R: Rng + ?Sized>(
        &self,
        round: u32,
        registry: &mut dyn PlayerRegistry,
        rng: &mut R,
        out: &mut Vec<Event>,
    ) -> RespawnSummary {
        let mut summary = RespawnSummary::default();
        if !self.config.enabled {
            return summary;
        }

        let mut anchors = Vec::new();
        let mut queue: Vec<PlayerIdentity> = Vec::new();
        for player in registry.players() {
            if player.alive {
                anchors.push(player.position);
            } else {
                registry.destroy(&player.identity);
                queue.push(player.identity);
            }
        }

        if queue.is_empty() {
            return summary;
        }

        if anchors.is_empty() {
            let fallback = registry.default_spawn().unwrap_or_else(|| {
                warn!(round, "no standing player or default spawn; respawning at origin");
                Vec3::ZERO
            });
            anchors.push(fallback);
        }

        let minimum = minimum_points(&self.config, round);
        for identity in queue {
            let slot = identity.slot();
            let record = match registry.rejoin(&identity) {
                Ok(record) => record,
                Err(reason) => {
                    warn!(round, slot, %reason, "respawn skipped");
                    out.push(Event::RespawnSkipped { slot, reason });
                    summary.skipped += 1;
                    continue;
                }
            };

            let anchor = anchors[rng.gen_range(0..anchors.len())];
            let position = anchor + disk_offset(self.config.offset_radius, rng);
            registry.place(&identity, position);

            let granted = (minimum - record.points).max(0);
            if granted > 0 {
                registry.grant_points(&identity, granted);
            }

            info!(round, slot, granted, "player respawned");
            out.push(Event::PlayerRespawned {
                slot,
                position,
                granted,
            });
            summary.respawned += 1;
            summary.granted += granted;
        }

        summary
    }
}
