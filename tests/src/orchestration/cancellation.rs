use std::sync::Arc;

use burrow_core::flags::RawFlags;
use burrow_core::orchestrator::{Orchestrator, Outcome};

use crate::support::{Behaviour, Journal, LINUX, RecordingRunner, ScriptedSignals, SpyFactory, registry_with};

fn dns_flags() -> RawFlags {
    RawFlags::new()
        .with("domain", "example.com")
        .with("wordlist", "-")
        .with("quiet", "true")
}

async fn run_with_presses(presses: usize) -> (Outcome, RecordingRunner, Journal) {
    run_until_interrupted(Behaviour::WaitForCancel, presses).await
}

async fn run_until_interrupted(
    behaviour: Behaviour,
    presses: usize,
) -> (Outcome, RecordingRunner, Journal) {
    let registry = registry_with(SpyFactory::default());
    let journal = Journal::default();
    let runner = RecordingRunner::new(behaviour, journal.clone());
    let signals = ScriptedSignals {
        presses,
        trigger: Arc::clone(&runner.started),
        journal: journal.clone(),
    };

    let outcome = Orchestrator::new(&registry, &runner, &signals)
        .with_platform(LINUX)
        .execute("dns", &dns_flags())
        .await
        .expect("an interrupted run is not an error");

    (outcome, runner, journal)
}

#[tokio::test]
async fn interrupt_mid_run_yields_cancelled_outcome() {
    let (outcome, runner, _) = run_with_presses(1).await;

    assert!(outcome.is_cancelled());
    assert!(outcome.report().interrupted);
    assert_eq!(runner.calls(), 1);
}

#[tokio::test]
async fn repeated_interrupts_cancel_exactly_once() {
    for presses in [2, 7, 40] {
        let (outcome, runner, _) = run_with_presses(presses).await;
        assert!(matches!(outcome, Outcome::Cancelled(_)));

        let token = runner
            .observed_cancel
            .lock()
            .unwrap()
            .clone()
            .expect("runner saw the token");
        assert!(token.is_cancelled());
        // The single transition was already spent by the bridge.
        assert!(!token.cancel());
    }
}

#[tokio::test]
async fn bridge_is_armed_before_the_runner_starts() {
    let (_, _, journal) = run_with_presses(1).await;
    assert_eq!(journal.entries(), vec!["armed", "run"]);
}

#[tokio::test]
async fn runner_error_after_interrupt_is_still_a_cancellation() {
    let (outcome, runner, _) = run_until_interrupted(Behaviour::FailOnCancel, 1).await;

    assert!(matches!(outcome, Outcome::Cancelled(ref report) if report.interrupted));
    assert_eq!(runner.calls(), 1);
}
