//! Property tests over the built-in workflows: every table entry is honoured
//! and every action outside the table is rejected without a state change.

use proptest::prelude::*;
use std::collections::BTreeSet;
use tollgate::{Preset, TransitionExecutor};

fn preset_strategy() -> impl Strategy<Value = Preset> {
    prop_oneof![
        Just(Preset::Order),
        Just(Preset::Document),
        Just(Preset::VendingMachine),
    ]
}

/// Every action name used by any preset, plus a few that none of them know
fn action_pool() -> Vec<String> {
    let mut actions: BTreeSet<String> = Preset::all()
        .into_iter()
        .flat_map(|preset| {
            let registry = preset.registry().unwrap();
            let names: Vec<String> = registry
                .transitions()
                .map(|(_, action, _)| action.to_string())
                .collect();
            names
        })
        .collect();
    actions.extend(["teleport", "", "PAY"].map(String::from));
    actions.into_iter().collect()
}

proptest! {
    #[test]
    fn prop_execute_matches_table(
        preset in preset_strategy(),
        state_pick in any::<prop::sample::Index>(),
        action_pick in any::<prop::sample::Index>(),
    ) {
        let registry = preset.registry().unwrap();
        let states: Vec<_> = registry.states().cloned().collect();
        let state = state_pick.get(&states).clone();
        let actions = action_pool();
        let action = action_pick.get(&actions);

        let executor = TransitionExecutor::new(registry.clone());
        let mut ctx = executor.resume(state.as_str(), ()).unwrap();

        match registry.next_state(state.as_str(), action) {
            Ok(target) => {
                let target = target.clone();
                prop_assert!(executor.execute(&mut ctx, action).is_ok());
                prop_assert_eq!(ctx.current_state(), &target);
                prop_assert_eq!(ctx.history().len(), 1);
            }
            Err(_) => {
                let err = executor.execute(&mut ctx, action).unwrap_err();
                prop_assert!(err.is_invalid_action());
                prop_assert_eq!(ctx.current_state(), &state);
                prop_assert!(ctx.history().is_empty());
            }
        }
    }

    #[test]
    fn prop_random_walk_stays_inside_registry(
        preset in preset_strategy(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..40),
    ) {
        let registry = preset.registry().unwrap();
        let actions = action_pool();
        let executor = TransitionExecutor::new(registry.clone());
        let mut ctx = executor.start(0u32);
        let mut committed = 0usize;

        for pick in picks {
            let action = pick.get(&actions);
            let before = ctx.current_state().clone();
            let allowed = registry.is_valid_transition(before.as_str(), action);

            match executor.execute(&mut ctx, action) {
                Ok(()) => {
                    prop_assert!(allowed);
                    committed += 1;
                }
                Err(err) => {
                    prop_assert!(!allowed);
                    prop_assert!(err.is_invalid_action());
                    prop_assert_eq!(ctx.current_state(), &before);
                }
            }
            prop_assert!(registry.contains(ctx.current_state().as_str()));
        }

        prop_assert_eq!(ctx.history().len(), committed);
        prop_assert_eq!(executor.metrics().get_stats().transitions, committed as u64);
    }
}
