//! Invariants of the agent model under generated inputs

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use hearthwood::core::config::SimulationConfig;
use hearthwood::core::types::EntityRef;
use hearthwood::entity::memory::{Importance, Memory, MemoryKind, MemoryLog};
use hearthwood::entity::needs::{NeedKind, Needs};
use hearthwood::entity::plan::Action;
use hearthwood::entity::relationships::Relationships;
use hearthwood::simulation::planning::{location_of, role_template, static_plan};

proptest! {
    #[test]
    fn prop_needs_stay_in_range(
        start in (0.0f32..=100.0, 0.0f32..=100.0, 0.0f32..=100.0),
        steps in prop::collection::vec((0.0f32..50.0, 0usize..3, -30.0f32..60.0), 1..40),
    ) {
        let config = SimulationConfig::default();
        let mut needs = Needs::new(start.0, start.1, start.2);
        for (dt, which, amount) in steps {
            needs.decay(dt, &config);
            needs.replenish(NeedKind::ALL[which], amount);
            for kind in NeedKind::ALL {
                let value = needs.get(kind);
                prop_assert!((0.0..=100.0).contains(&value), "{:?} = {}", kind, value);
            }
        }
    }

    #[test]
    fn prop_importance_always_in_range(score in any::<i64>()) {
        let value = Importance::new(score).value();
        prop_assert!((1..=10).contains(&value));
    }

    #[test]
    fn prop_relationship_stays_in_range(
        deltas in prop::collection::vec((-50i32..50, -50i32..50), 1..30),
    ) {
        let mut rels = Relationships::new();
        for (day, (trust, respect)) in deltas.into_iter().enumerate() {
            let before = rels.view(&EntityRef::Player);
            rels.update(EntityRef::Player, trust, respect, day as u32);
            let after = rels.view(&EntityRef::Player);
            prop_assert!((0..=100).contains(&after.trust));
            prop_assert!((0..=100).contains(&after.respect));
            prop_assert!((after.trust - before.trust).abs() <= 10);
            prop_assert!((after.respect - before.respect).abs() <= 10);
        }
    }

    #[test]
    fn prop_retrieval_is_bounded_and_keeps_recent(
        importances in prop::collection::vec(1i64..=10, 6..30),
    ) {
        // One memory per day, so recency is unambiguous
        let mut log = MemoryLog::new();
        for (i, importance) in importances.iter().enumerate() {
            log.push(Memory::new(
                format!("memory {}", i),
                MemoryKind::Observation,
                i as u32 + 1,
                Importance::new(*importance),
            ));
        }
        let selected = log.retrieve(3, 3);
        prop_assert_eq!(selected.len(), 6);

        let newest = importances.len() as u32;
        for day in newest - 2..=newest {
            prop_assert!(selected.iter().any(|m| m.day == day));
        }
        prop_assert!(selected.windows(2).all(|w| w[0].day <= w[1].day));

        // The three non-recent picks are the most important of the rest
        let mut rest: Vec<u8> = log
            .iter()
            .filter(|m| m.day + 2 < newest)
            .map(|m| m.importance.value())
            .collect();
        rest.sort_unstable_by(|a, b| b.cmp(a));
        let mut picked: Vec<u8> = selected
            .iter()
            .filter(|m| m.day + 2 < newest)
            .map(|m| m.importance.value())
            .collect();
        picked.sort_unstable_by(|a, b| b.cmp(a));
        prop_assert_eq!(picked, rest[..3].to_vec());
    }

    #[test]
    fn prop_static_plan_targets_within_jitter(seed in any::<u64>(), role_index in 0usize..5) {
        let roles = ["Farmer", "Baker", "Guard", "Noble", "Merchant"];
        let role = roles[role_index];
        let config = SimulationConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let plan = static_plan(role, &mut rng, &config);
        let template = role_template(role);

        prop_assert_eq!(plan.len(), template.len() * 2);
        for (pair, (location, description, duration)) in plan.chunks(2).zip(template) {
            let base = location_of(location).unwrap();
            match (&pair[0], &pair[1]) {
                (Action::Move { target, .. }, Action::Wait { duration: wait, .. }) => {
                    prop_assert!((target.x - base.x).abs() <= config.plan_jitter);
                    prop_assert!((target.y - base.y).abs() <= config.plan_jitter);
                    prop_assert_eq!(*wait, *duration);
                }
                other => prop_assert!(false, "unexpected pair {:?}", other),
            }
            prop_assert_eq!(pair[0].description(), *description);
        }
    }
}
