mod test_helpers;

use crate::test_helpers::{host, load_fully, mock_supervisor, run_ticks, THRESHOLD};
use tickboot_runtime::{LoadStage, LoadState, MockProvider, TickOutcome};

#[test]
fn loads_over_three_ticks_and_runs_on_the_third() {
    let mut sup = mock_supervisor(THRESHOLD);
    let mut host = host(800);

    let outcomes = run_ticks(&mut sup, &mut host, 3);
    assert_eq!(
        outcomes,
        vec![
            TickOutcome::Advanced(LoadStage::AcquireBytes),
            TickOutcome::Advanced(LoadStage::Compile),
            TickOutcome::Invoked {
                loaded_this_tick: true
            },
        ]
    );
    assert!(sup.state().load_state().is_instantiated());
    assert_eq!(sup.provider().invoke_calls, 1);

    let stats = sup.state().stats();
    assert_eq!(stats.load_started_at, Some(1));
    assert_eq!(stats.loaded_at, Some(3));
    assert_eq!(stats.invocations, 1);
}

#[test]
fn transitions_are_monotonic() {
    let mut sup = mock_supervisor(THRESHOLD);
    let mut host = host(800);

    let mut last = sup.state().load_state().ordinal();
    for budget in [800, 100, 900, 0, 500, 700, 1].iter() {
        host.budget = *budget;
        run_ticks(&mut sup, &mut host, 1);
        let now = sup.state().load_state().ordinal();
        assert!(now == last || now == last + 1, "{} -> {}", last, now);
        last = now;
    }
    assert_eq!(last, 3);
}

#[test]
fn raw_bytes_are_released_after_instantiation() {
    let mut sup = mock_supervisor(0);
    let mut host = host(0);

    run_ticks(&mut sup, &mut host, 1);
    assert!(sup.provider().holds_bytes());
    match sup.state().load_state() {
        LoadState::BytesAcquired(bytes) => assert_eq!(bytes.as_slice(), b"\0asm\x01\0\0\0"),
        other => panic!("unexpected state: {:?}", other),
    }

    load_fully(&mut sup, &mut host);
    assert!(!sup.provider().holds_bytes());
    assert_eq!(sup.provider().release_calls, 1);
}

#[test]
fn same_handle_used_every_tick() {
    let mut sup = mock_supervisor(0);
    let mut host = host(0);
    load_fully(&mut sup, &mut host);

    host.budget = 0;
    run_ticks(&mut sup, &mut host, 10);

    let handle = sup.state().load_state().handle().expect("instantiated");
    assert_eq!(handle.generation, 1);
    assert_eq!(handle.invocations, 11);
    assert_eq!(sup.provider().instantiate_calls, 1);
    assert_eq!(sup.provider().stage_calls(), 3);
}

#[test]
fn provider_can_be_driven_without_a_supervisor() {
    let mut provider = MockProvider::new();
    let mut state = LoadState::<MockProvider>::new();
    let mut stages = vec![];
    while let Some(stage) = state.next_stage() {
        stages.push(tickboot_runtime::Loader::advance(&mut state, &mut provider).unwrap());
        assert_eq!(stages.last(), Some(&stage));
    }
    assert_eq!(stages, LoadStage::ALL.to_vec());
}
