#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Round formulas, speed-tier odds and spawn plan construction.
//!
//! The count and health curves are pure functions of their inputs and must
//! return identical integers on every platform, so they are evaluated in
//! `f64` in a fixed operation order. Sampling only happens in
//! [`sample_speed_tier`] and [`SpawnPlan::build`], both of which draw from the
//! caller's random source.

use std::collections::VecDeque;

use last_stand_core::{ArchetypeId, EnemyArchetype, SpeedTier};
use rand::Rng;
use serde::{Deserialize, Serialize};

const ROUND_FACTORS: [f64; 5] = [0.25, 0.30, 0.50, 0.70, 0.90];
const BASE_ENEMIES: f64 = 24.0;
const ENEMIES_PER_PLAYER: f64 = 6.0;
const SOLO_WEIGHT: f64 = 0.5;
const LATE_ROUND: u32 = 10;
const LATE_ROUND_SCALE: f64 = 0.15;
const ROUND_TERM_DIVISOR: f64 = 5.0;

const EARLY_HEALTH_BASE: u32 = 150;
const EARLY_HEALTH_STEP: u32 = 100;
const HEALTH_PIVOT: u32 = 9;
const LATE_HEALTH_BASE: f64 = 950.0;
const LATE_HEALTH_GROWTH: f64 = 1.1;

const TIER_ROUND_CAP: u32 = 20;
const PURE_TIER_ROUNDS: u32 = 2;
const FAST_SHARE_PER_ROUND: f64 = 0.1;
const MAX_FAST_SHARE: f64 = 0.9;
const SPLIT_SHARE: f64 = 0.3;
const TIER3_ROUND: u32 = 8;
const TIER4_ROUND: u32 = 14;

/// Total enemies to spawn in `round` for `players` living players.
///
/// Both inputs are clamped to at least one. Rounds below ten ramp up through
/// a per-round factor; from round ten on, the count grows quadratically.
#[must_use]
pub fn enemy_count(round: u32, players: u32) -> u32 {
    let round = round.max(1);
    let players = players.max(1);
    let round_f = f64::from(round);
    let player_weight = if players == 1 {
        SOLO_WEIGHT
    } else {
        f64::from(players - 1)
    };

    let count = if round < LATE_ROUND {
        let factor = ROUND_FACTORS
            .get((round - 1) as usize)
            .copied()
            .unwrap_or(1.0);
        let round_term = (round_f / ROUND_TERM_DIVISOR).max(1.0);
        (BASE_ENEMIES + player_weight * ENEMIES_PER_PLAYER * round_term) * factor
    } else {
        let round_term = round_f / ROUND_TERM_DIVISOR;
        BASE_ENEMIES
            + player_weight * ENEMIES_PER_PLAYER * round_term * round_f * LATE_ROUND_SCALE
    };

    count.floor() as u32
}

/// Hit points of a baseline enemy in `round`.
///
/// Linear up to round nine, then compounding by ten percent per round and
/// rounded to the nearest integer. Saturates at `u32::MAX`.
#[must_use]
pub fn enemy_health(round: u32) -> u32 {
    let round = round.max(1);
    if round <= HEALTH_PIVOT {
        return EARLY_HEALTH_BASE + EARLY_HEALTH_STEP * (round - 1);
    }

    let exponent = i32::try_from(round - HEALTH_PIVOT).unwrap_or(i32::MAX);
    (LATE_HEALTH_BASE * LATE_HEALTH_GROWTH.powi(exponent)).round() as u32
}

/// Health of `round` relative to round one.
#[must_use]
pub fn health_factor(round: u32) -> f64 {
    f64::from(enemy_health(round)) / f64::from(EARLY_HEALTH_BASE)
}

/// Probability of each speed tier for a given round.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TierOdds {
    probabilities: [f64; 4],
}

impl TierOdds {
    /// Distribution used for `round`; rounds past twenty reuse round twenty.
    ///
    /// The share of fast tiers grows by a tenth per round after round two and
    /// saturates at nine tenths from round eleven on.
    #[must_use]
    pub fn for_round(round: u32) -> Self {
        let round = round.clamp(1, TIER_ROUND_CAP);
        if round <= PURE_TIER_ROUNDS {
            return Self {
                probabilities: [1.0, 0.0, 0.0, 0.0],
            };
        }

        let fast = (FAST_SHARE_PER_ROUND * f64::from(round - PURE_TIER_ROUNDS))
            .clamp(0.0, MAX_FAST_SHARE);
        let (tier2, tier3, tier4) = if round < TIER3_ROUND {
            (fast, 0.0, 0.0)
        } else if round < TIER4_ROUND {
            let tier3 = SPLIT_SHARE * fast;
            (fast - tier3, tier3, 0.0)
        } else {
            let share = SPLIT_SHARE * fast;
            (fast - share - share, share, share)
        };

        Self {
            probabilities: [1.0 - fast, tier2, tier3, tier4],
        }
    }

    /// Probability assigned to `tier`.
    #[must_use]
    pub fn probability(&self, tier: SpeedTier) -> f64 {
        self.probabilities[tier.index()]
    }

    /// Sum of every tier probability.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.probabilities.iter().sum()
    }

    /// Maps a uniform roll in `[0, 1)` onto a tier by sequential subtraction.
    ///
    /// Floating residue past the third tier lands on [`SpeedTier::Tier4`].
    #[must_use]
    pub fn pick(&self, roll: f64) -> SpeedTier {
        let mut remaining = roll;
        for tier in [SpeedTier::Tier1, SpeedTier::Tier2, SpeedTier::Tier3] {
            let probability = self.probability(tier);
            if remaining < probability {
                return tier;
            }
            remaining -= probability;
        }
        SpeedTier::Tier4
    }
}

/// Draws the speed tier of a single enemy spawned in `round`.
pub fn sample_speed_tier<R: Rng + ?Sized>(round: u32, rng: &mut R) -> SpeedTier {
    TierOdds::for_round(round).pick(rng.gen::<f64>())
}

/// Archetypes whose availability window contains `round`.
#[must_use]
pub fn available_archetypes(archetypes: &[EnemyArchetype], round: u32) -> Vec<&EnemyArchetype> {
    archetypes
        .iter()
        .filter(|archetype| archetype.window().contains(round))
        .collect()
}

/// Recovery policy applied when no archetype window covers a round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolFallback {
    /// Sample from every archetype regardless of its window.
    #[default]
    AnyArchetype,
    /// Leave the plan empty so the round stalls visibly.
    Stall,
}

/// How the archetype pool of a round was resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolResolution {
    /// Archetypes whose window covers the round were available.
    InWindow(usize),
    /// The window filter matched nothing and every archetype was used.
    FellBack(usize),
    /// No archetype could be sampled.
    Empty,
}

/// Single planned spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlanEntry {
    /// Archetype to spawn.
    pub archetype: ArchetypeId,
    /// Speed tier assigned to the enemy.
    pub tier: SpeedTier,
}

/// Ordered list of the enemies a round will spawn, consumed front to back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpawnPlan {
    entries: VecDeque<PlanEntry>,
}

/// Result of [`SpawnPlan::build`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanOutcome {
    /// Plan for the round.
    pub plan: SpawnPlan,
    /// How the archetype pool was resolved.
    pub pool: PoolResolution,
}

impl SpawnPlan {
    /// Builds `count` independent entries for `round`.
    ///
    /// Each entry draws a uniformly random archetype from the pool of the
    /// round and a speed tier from [`TierOdds::for_round`].
    pub fn build<R: Rng + ?Sized>(
        round: u32,
        count: u32,
        archetypes: &[EnemyArchetype],
        fallback: PoolFallback,
        rng: &mut R,
    ) -> PlanOutcome {
        let mut pool = available_archetypes(archetypes, round);
        let resolution = if !pool.is_empty() {
            PoolResolution::InWindow(pool.len())
        } else {
            match fallback {
                PoolFallback::AnyArchetype if !archetypes.is_empty() => {
                    pool = archetypes.iter().collect();
                    PoolResolution::FellBack(pool.len())
                }
                _ => PoolResolution::Empty,
            }
        };

        if pool.is_empty() {
            return PlanOutcome {
                plan: Self::default(),
                pool: resolution,
            };
        }

        let entries = (0..count)
            .map(|_| {
                let archetype = pool[rng.gen_range(0..pool.len())].id();
                let tier = sample_speed_tier(round, rng);
                PlanEntry { archetype, tier }
            })
            .collect();

        PlanOutcome {
            plan: Self { entries },
            pool: resolution,
        }
    }

    /// Removes and returns the next entry.
    pub fn pop(&mut self) -> Option<PlanEntry> {
        self.entries.pop_front()
    }

    /// Entries still waiting to be spawned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether every entry was consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterator over the remaining entries in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries.iter()
    }

    /// Number of remaining entries per speed tier.
    #[must_use]
    pub fn tier_histogram(&self) -> [u32; 4] {
        let mut histogram = [0; 4];
        for entry in &self.entries {
            histogram[entry.tier.index()] += 1;
        }
        histogram
    }
}
