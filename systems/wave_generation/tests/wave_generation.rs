use last_stand_core::{ArchetypeId, EnemyArchetype, EnemyStats, RoundWindow, SpeedTier};
use last_stand_system_wave_generation::{
    enemy_count, enemy_health, sample_speed_tier, PoolFallback, PoolResolution, SpawnPlan,
    TierOdds,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn archetype(id: u32, window: RoundWindow) -> EnemyArchetype {
    EnemyArchetype::new(
        ArchetypeId::new(id),
        format!("archetype-{id}"),
        window,
        EnemyStats {
            health: 100.0,
            speed: 2.0,
            attack: 10.0,
        },
    )
}

#[test]
fn reference_values_are_stable() {
    assert_eq!(enemy_count(1, 1), 6);
    assert_eq!(enemy_health(1), 150);
    assert_eq!(enemy_health(9), 950);
    assert_eq!(enemy_health(10), 1045);
}

#[test]
fn tier_probabilities_sum_to_one() {
    for round in 1..=20 {
        let odds = TierOdds::for_round(round);
        assert!(
            (odds.total() - 1.0).abs() < 1e-6,
            "round {round} sums to {}",
            odds.total()
        );
        for tier in SpeedTier::ALL {
            assert!(odds.probability(tier) >= 0.0, "round {round} {tier:?}");
        }
    }
}

#[test]
fn opening_rounds_only_spawn_the_slowest_tier() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
    for round in 1..=2 {
        for _ in 0..10_000 {
            assert_eq!(sample_speed_tier(round, &mut rng), SpeedTier::Tier1);
        }
    }
}

#[test]
fn early_rounds_never_reach_fast_tiers() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for round in 3..=7 {
        for _ in 0..2_000 {
            let tier = sample_speed_tier(round, &mut rng);
            assert!(
                matches!(tier, SpeedTier::Tier1 | SpeedTier::Tier2),
                "round {round} produced {tier:?}"
            );
        }
    }
}

#[test]
fn late_round_frequencies_follow_odds() {
    const DRAWS: u32 = 20_000;
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut histogram = [0_u32; 4];
    for _ in 0..DRAWS {
        histogram[sample_speed_tier(20, &mut rng).index()] += 1;
    }

    let odds = TierOdds::for_round(20);
    for tier in SpeedTier::ALL {
        let observed = f64::from(histogram[tier.index()]) / f64::from(DRAWS);
        assert!(
            (observed - odds.probability(tier)).abs() < 0.02,
            "{tier:?} observed {observed}"
        );
    }
}

#[test]
fn plan_only_samples_archetypes_inside_their_window() {
    let archetypes = vec![
        archetype(0, RoundWindow::new(1, 3)),
        archetype(1, RoundWindow::new(2, 10)),
        archetype(2, RoundWindow::new(8, 12)),
    ];
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let outcome = SpawnPlan::build(
        2,
        200,
        &archetypes,
        PoolFallback::AnyArchetype,
        &mut rng,
    );

    assert_eq!(outcome.pool, PoolResolution::InWindow(2));
    assert_eq!(outcome.plan.len(), 200);
    assert!(outcome
        .plan
        .iter()
        .all(|entry| entry.archetype != ArchetypeId::new(2)));
    assert!(outcome
        .plan
        .iter()
        .any(|entry| entry.archetype == ArchetypeId::new(0)));
    assert!(outcome
        .plan
        .iter()
        .any(|entry| entry.archetype == ArchetypeId::new(1)));
}

#[test]
fn uncovered_round_falls_back_to_every_archetype() {
    let archetypes = vec![
        archetype(0, RoundWindow::new(1, 2)),
        archetype(1, RoundWindow::new(3, 4)),
    ];
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    let outcome = SpawnPlan::build(
        9,
        50,
        &archetypes,
        PoolFallback::AnyArchetype,
        &mut rng,
    );

    assert_eq!(outcome.pool, PoolResolution::FellBack(2));
    assert_eq!(outcome.plan.len(), 50);
}

#[test]
fn stall_policy_leaves_plan_empty() {
    let archetypes = vec![archetype(0, RoundWindow::new(1, 2))];
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    let outcome = SpawnPlan::build(5, 30, &archetypes, PoolFallback::Stall, &mut rng);

    assert_eq!(outcome.pool, PoolResolution::Empty);
    assert!(outcome.plan.is_empty());
}

#[test]
fn empty_archetype_list_cannot_fall_back() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let outcome = SpawnPlan::build(1, 6, &[], PoolFallback::AnyArchetype, &mut rng);

    assert_eq!(outcome.pool, PoolResolution::Empty);
    assert!(outcome.plan.is_empty());
}

#[test]
fn plan_building_replays_with_the_same_seed() {
    let archetypes = vec![
        archetype(0, RoundWindow::always()),
        archetype(1, RoundWindow::new(5, 20)),
    ];

    let build = || {
        let mut rng = ChaCha8Rng::seed_from_u64(0xdead_beef);
        SpawnPlan::build(
            15,
            enemy_count(15, 3),
            &archetypes,
            PoolFallback::AnyArchetype,
            &mut rng,
        )
    };

    let first = build();
    let second = build();
    assert_eq!(first, second, "plan diverged between runs");
    assert_eq!(first.plan.tier_histogram().iter().sum::<u32>(), enemy_count(15, 3));
}
