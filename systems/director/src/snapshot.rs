//! Read-only status of the director for HUDs and logs.

use std::fmt;

use serde::Serialize;

/// Stage of the current round, derived from the round state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    /// Waiting out the inter-round delay.
    Pausing,
    /// Enemies are still being spawned.
    Spawning,
    /// Everything was spawned; waiting for the last enemies to die.
    Draining,
}

impl Phase {
    /// Short label used in status lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pausing => "PREP",
            Self::Spawning => "SPAWN",
            Self::Draining => "FIGHT",
        }
    }
}

/// Point-in-time copy of the director's counters.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DirectorSnapshot {
    /// Current round.
    pub round: u32,
    /// Stage of the round.
    pub phase: Phase,
    /// Enemies the round spawns in total.
    pub target: u32,
    /// Enemies spawned so far.
    pub spawned: u32,
    /// Enemies currently alive.
    pub alive: u32,
    /// Enemies killed this round.
    pub dead: u32,
    /// Strength multiplier of the round.
    pub strength: f32,
    /// Planned spawns left per speed tier.
    pub planned_tiers: [u32; 4],
    /// Enemies killed over the whole session.
    pub total_killed: u64,
    /// Whether the round can never complete.
    pub stalled: bool,
}

impl fmt::Display for DirectorSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Round {:>2} | {:<5} | Spawned: {:>3}/{:<3} | Alive: {:>2} | Kills: {:>3}/{:<3} | x{:.2} | Total: {:>5}",
            self.round,
            self.phase.label(),
            self.spawned,
            self.target,
            self.alive,
            self.dead,
            self.spawned,
            self.strength,
            self.total_killed,
        )?;
        if self.stalled {
            f.write_str(" | STALLED")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_is_compact() {
        let snapshot = DirectorSnapshot {
            round: 3,
            phase: Phase::Spawning,
            target: 13,
            spawned: 4,
            alive: 3,
            dead: 1,
            strength: 1.21,
            planned_tiers: [7, 2, 0, 0],
            total_killed: 15,
            stalled: false,
        };

        assert_eq!(
            snapshot.to_string(),
            "Round  3 | SPAWN | Spawned:   4/13  | Alive:  3 | Kills:   1/4   | x1.21 | Total:    15"
        );
    }

    #[test]
    fn stalled_rounds_are_flagged() {
        let snapshot = DirectorSnapshot {
            round: 7,
            phase: Phase::Spawning,
            target: 28,
            spawned: 0,
            alive: 0,
            dead: 0,
            strength: 1.0,
            planned_tiers: [0; 4],
            total_killed: 0,
            stalled: true,
        };

        assert!(snapshot.to_string().ends_with(" | STALLED"));
    }
}
