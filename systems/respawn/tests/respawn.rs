use glam::Vec3;
use last_stand_core::{Command, Event, PlayerIdentity, PlayerRecord, PlayerRegistry, RejoinError};
use last_stand_system_respawn::{Respawn, RespawnConfig, RespawnSummary};
use last_stand_world::{self as world, query, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn identity(slot: u32) -> PlayerIdentity {
    PlayerIdentity::new(slot, format!("pad-{slot}"), "gamepad")
}

fn session(positions: &[Vec3]) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    for (slot, position) in positions.iter().enumerate() {
        world::apply(
            &mut world,
            Command::JoinPlayer {
                identity: identity(slot as u32),
                position: *position,
            },
            &mut events,
        );
    }
    world
}

fn down(world: &mut World, slot: u32) {
    let mut events = Vec::new();
    world::apply(world, Command::DownPlayer { slot }, &mut events);
}

#[test]
fn downed_players_respawn_next_to_a_standing_teammate() {
    let anchor = Vec3::new(10.0, 0.0, -4.0);
    let mut world = session(&[anchor, Vec3::new(-30.0, 0.0, 0.0)]);
    down(&mut world, 1);

    let respawn = Respawn::new(RespawnConfig::default());
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let mut events = Vec::new();
    let summary = respawn.process(5, world.collaborators().players, &mut rng, &mut events);

    assert_eq!(
        summary,
        RespawnSummary {
            respawned: 1,
            skipped: 0,
            granted: 1500,
        }
    );

    let players = query::players(&world);
    let revived = players
        .iter()
        .find(|player| player.identity.slot() == 1)
        .expect("slot 1 respawned");
    assert!(revived.alive);
    assert_eq!(revived.points, 1500);
    assert!(revived.position.distance(anchor) <= 2.0 + 1e-4);
    assert_eq!(revived.position.y, 0.0);

    match events.as_slice() {
        [Event::PlayerRespawned {
            slot: 1,
            position,
            granted: 1500,
        }] => assert_eq!(*position, revived.position),
        other => panic!("unexpected events: {other:?}"),
    }
}

#[test]
fn players_above_the_minimum_keep_their_points() {
    let mut world = session(&[Vec3::ZERO, Vec3::ZERO]);
    world.collaborators().players.grant_points(&identity(1), 4_000);
    down(&mut world, 1);

    let respawn = Respawn::new(RespawnConfig::default());
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut events = Vec::new();
    let summary = respawn.process(3, world.collaborators().players, &mut rng, &mut events);

    assert_eq!(summary.respawned, 1);
    assert_eq!(summary.granted, 0);
    let revived = query::players(&world)
        .into_iter()
        .find(|player| player.identity.slot() == 1)
        .expect("slot 1 respawned");
    assert_eq!(revived.points, 4_000);
}

#[test]
fn wipe_respawns_everyone_around_the_default_spawn() {
    let spawn = Vec3::new(50.0, 0.0, 50.0);
    let mut world = session(&[Vec3::ZERO, Vec3::ZERO, Vec3::ZERO]);
    world.set_player_spawn(spawn);
    for slot in 0..3 {
        down(&mut world, slot);
    }

    let respawn = Respawn::new(RespawnConfig::default());
    let mut rng = ChaCha8Rng::seed_from_u64(33);
    let mut events = Vec::new();
    let summary = respawn.process(1, world.collaborators().players, &mut rng, &mut events);

    assert_eq!(summary.respawned, 3);
    assert_eq!(summary.granted, 1500);
    for player in query::players(&world) {
        assert!(player.alive);
        assert_eq!(player.points, 500);
        assert!(player.position.distance(spawn) <= 2.0 + 1e-4);
    }
}

#[test]
fn wipe_without_default_spawn_uses_the_origin() {
    let mut world = session(&[Vec3::new(100.0, 0.0, 0.0)]);
    down(&mut world, 0);

    let respawn = Respawn::new(RespawnConfig {
        offset_radius: 0.0,
        ..RespawnConfig::default()
    });
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let mut events = Vec::new();
    let _ = respawn.process(2, world.collaborators().players, &mut rng, &mut events);

    let players = query::players(&world);
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].position, Vec3::ZERO);
}

#[test]
fn nobody_down_changes_nothing() {
    let mut world = session(&[Vec3::ZERO, Vec3::ONE]);

    let respawn = Respawn::new(RespawnConfig::default());
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let mut events = Vec::new();
    let summary = respawn.process(7, world.collaborators().players, &mut rng, &mut events);

    assert_eq!(summary, RespawnSummary::default());
    assert!(events.is_empty());
    assert!(query::players(&world).iter().all(|player| player.points == 0));
}

#[test]
fn disabled_respawn_leaves_downed_players_alone() {
    let mut world = session(&[Vec3::ZERO, Vec3::ZERO]);
    down(&mut world, 0);

    let respawn = Respawn::new(RespawnConfig {
        enabled: false,
        ..RespawnConfig::default()
    });
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let mut events = Vec::new();
    let summary = respawn.process(2, world.collaborators().players, &mut rng, &mut events);

    assert_eq!(summary, RespawnSummary::default());
    let players = query::players(&world);
    assert_eq!(players.len(), 2);
    assert_eq!(players.iter().filter(|player| !player.alive).count(), 1);
}

/// Registry that loses one player's device, so that player can never rejoin.
struct LostDeviceRegistry<'a> {
    inner: &'a mut dyn PlayerRegistry,
    lost: u32,
    destroyed: Vec<u32>,
}

impl PlayerRegistry for LostDeviceRegistry<'_> {
    fn players(&self) -> Vec<PlayerRecord> {
        self.inner.players()
    }

    fn destroy(&mut self, identity: &PlayerIdentity) {
        self.destroyed.push(identity.slot());
        self.inner.destroy(identity);
    }

    fn rejoin(&mut self, identity: &PlayerIdentity) -> Result<PlayerRecord, RejoinError> {
        if identity.slot() == self.lost {
            return Err(RejoinError::UnknownPlayer(identity.slot()));
        }
        self.inner.rejoin(identity)
    }

    fn place(&mut self, identity: &PlayerIdentity, position: Vec3) {
        self.inner.place(identity, position);
    }

    fn grant_points(&mut self, identity: &PlayerIdentity, amount: i64) {
        self.inner.grant_points(identity, amount);
    }

    fn default_spawn(&self) -> Option<Vec3> {
        self.inner.default_spawn()
    }
}

#[test]
fn failed_rejoin_skips_the_player_and_continues() {
    let anchor = Vec3::new(5.0, 0.0, 5.0);
    let mut world = session(&[anchor, Vec3::ZERO, Vec3::ZERO]);
    down(&mut world, 1);
    down(&mut world, 2);

    let respawn = Respawn::new(RespawnConfig::default());
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let mut events = Vec::new();
    let mut registry = LostDeviceRegistry {
        inner: world.collaborators().players,
        lost: 1,
        destroyed: Vec::new(),
    };

    let summary = respawn.process(4, &mut registry, &mut rng, &mut events);

    assert_eq!(registry.destroyed, vec![1, 2]);
    assert_eq!(
        summary,
        RespawnSummary {
            respawned: 1,
            skipped: 1,
            granted: 1250,
        }
    );
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[0],
        Event::RespawnSkipped {
            slot: 1,
            reason: RejoinError::UnknownPlayer(1),
        }
    );
    match events[1] {
        Event::PlayerRespawned {
            slot,
            position,
            granted,
        } => {
            assert_eq!(slot, 2);
            assert_eq!(granted, 1250);
            assert!(position.distance(anchor) <= 2.0 + 1e-4);
        }
        ref other => panic!("expected slot 2 to respawn, got {other:?}"),
    }

    let players = query::players(&world);
    let slots: Vec<u32> = players.iter().map(|player| player.identity.slot()).collect();
    assert_eq!(slots, vec![0, 2]);
    assert!(players.iter().all(|player| player.alive));
}

#[test]
fn config_reads_from_toml_with_defaults() {
    let config: RespawnConfig = toml::from_str("points_per_round = 100").expect("parse respawn");
    assert!(config.enabled);
    assert_eq!(config.base_points, 500);
    assert_eq!(config.points_per_round, 100);
}
