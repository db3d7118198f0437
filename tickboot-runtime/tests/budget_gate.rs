mod test_helpers;

use crate::test_helpers::{host, mock_supervisor, run_ticks, THRESHOLD};
use tickboot_runtime::{should_proceed, LoadStage, TickOutcome};

const BUDGETS: [u64; 8] = [0, 1, 250, 499, 500, 501, 800, 10_000];

#[test]
fn below_threshold_never_advances() {
    for &budget in BUDGETS.iter().filter(|&&b| b < THRESHOLD) {
        assert!(!should_proceed(budget, THRESHOLD));

        let mut sup = mock_supervisor(THRESHOLD);
        let mut host = host(budget);
        let outcomes = run_ticks(&mut sup, &mut host, 5);

        for outcome in outcomes {
            assert_eq!(
                outcome,
                TickOutcome::Deferred {
                    remaining: budget,
                    threshold: THRESHOLD
                }
            );
        }
        assert_eq!(sup.state().load_state().ordinal(), 0);
        assert_eq!(sup.provider().stage_calls(), 0);
        assert_eq!(sup.state().stats().ticks, 5);
    }
}

#[test]
fn at_or_above_threshold_advances_one_stage_per_tick() {
    for &budget in BUDGETS.iter().filter(|&&b| b >= THRESHOLD) {
        assert!(should_proceed(budget, THRESHOLD));

        let mut sup = mock_supervisor(THRESHOLD);
        let mut host = host(budget);
        for expected in 1..=2 {
            run_ticks(&mut sup, &mut host, 1);
            assert_eq!(sup.state().load_state().ordinal(), expected);
            assert_eq!(sup.provider().stage_calls(), expected as u64);
        }
    }
}

#[test]
fn deferral_is_the_only_effect() {
    let mut sup = mock_supervisor(THRESHOLD);
    let mut host = host(400);

    run_ticks(&mut sup, &mut host, 1);
    assert_eq!(
        sup.last_outcome(),
        &TickOutcome::Deferred {
            remaining: 400,
            threshold: 500
        }
    );
    assert!(host.notifications.is_empty());
    assert_eq!(host.reset_requests, 0);
    assert!(!sup.state().running().is_raised());
    assert!(sup.state().reset_state().is_healthy());
}

#[test]
fn budget_recovering_resumes_loading() {
    let mut sup = mock_supervisor(THRESHOLD);
    let mut host = host(800);

    run_ticks(&mut sup, &mut host, 1);
    host.budget = 100;
    run_ticks(&mut sup, &mut host, 3);
    assert_eq!(sup.state().load_state().ordinal(), 1);

    host.budget = 800;
    let outcomes = run_ticks(&mut sup, &mut host, 1);
    assert_eq!(outcomes, vec![TickOutcome::Advanced(LoadStage::Compile)]);
    assert_eq!(sup.provider().acquire_calls, 1, "acquired bytes are never refetched");
}

#[test]
fn zero_threshold_never_defers() {
    let mut sup = mock_supervisor(0);
    let mut host = host(0);
    let outcomes = run_ticks(&mut sup, &mut host, 3);
    assert_eq!(
        outcomes.last(),
        Some(&TickOutcome::Invoked {
            loaded_this_tick: true
        })
    );
}
