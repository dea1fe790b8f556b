use std::io::Write;
use std::time::Duration;

use burrow_common::options::{DnsOptions, ModeOptions};
use burrow_core::bridge::CtrlC;
use burrow_core::error::{OptionError, RunError};
use burrow_core::flags::RawFlags;
use burrow_core::orchestrator::{Orchestrator, Outcome};
use burrow_core::runner::WordlistRunner;

use crate::support::{
    Behaviour, Journal, LINUX, RecordingRunner, ScriptedSignals, SpyFactory, WINDOWS, registry_with,
};

fn flags(pairs: &[(&str, &str)]) -> RawFlags {
    let mut flags: RawFlags = pairs.iter().copied().collect();
    if !flags.contains("wordlist") {
        flags.set("wordlist", "-");
    }
    flags
}

#[tokio::test]
async fn valid_input_constructs_once_and_runs_once() {
    let factory = SpyFactory::default();
    let registry = registry_with(factory.clone());
    let journal = Journal::default();
    let runner = RecordingRunner::new(Behaviour::Complete, journal.clone());
    let signals = ScriptedSignals::silent(journal.clone());

    let outcome = Orchestrator::new(&registry, &runner, &signals)
        .with_platform(LINUX)
        .execute("dns", &flags(&[("domain", "example.com"), ("timeout", "1s")]))
        .await
        .unwrap();

    let mut expected = DnsOptions::new("example.com");
    expected.timeout = Duration::from_secs(1);
    assert_eq!(*factory.options.lock().unwrap(), vec![ModeOptions::Dns(expected)]);
    assert_eq!(factory.calls(), 1);

    assert_eq!(runner.calls(), 1);
    assert_eq!(*runner.plugins.lock().unwrap(), vec!["dns".to_string()]);
    assert!(matches!(outcome, Outcome::Completed(ref report) if report.found == 1));
    assert!(!outcome.is_cancelled());
}

#[tokio::test]
async fn empty_domain_fails_before_construction() {
    let factory = SpyFactory::default();
    let registry = registry_with(factory.clone());
    let journal = Journal::default();
    let runner = RecordingRunner::new(Behaviour::Complete, journal.clone());
    let signals = ScriptedSignals::silent(journal.clone());

    let err = Orchestrator::new(&registry, &runner, &signals)
        .with_platform(LINUX)
        .execute("dns", &flags(&[("domain", ""), ("showips", "true")]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RunError::Options(OptionError::MissingRequiredOption { field: "domain" })
    ));
    assert_eq!(factory.calls(), 0);
    assert_eq!(runner.calls(), 0);
    assert!(journal.entries().is_empty(), "nothing may be armed");
}

#[tokio::test]
async fn every_input_without_domain_is_rejected() {
    let inputs: [&[(&str, &str)]; 4] = [
        &[],
        &[("domain", "   ")],
        &[("showips", "true"), ("timeout", "5s")],
        &[("resolver", "8.8.8.8"), ("wildcard", "true")],
    ];

    for input in inputs {
        let factory = SpyFactory::default();
        let registry = registry_with(factory.clone());
        let journal = Journal::default();
        let runner = RecordingRunner::new(Behaviour::Complete, journal.clone());
        let signals = ScriptedSignals::silent(journal);

        let err = Orchestrator::new(&registry, &runner, &signals)
            .with_platform(LINUX)
            .execute("dns", &flags(input))
            .await
            .unwrap_err();

        assert!(
            matches!(err, RunError::Options(OptionError::MissingRequiredOption { field: "domain" })),
            "{input:?} gave {err:?}"
        );
        assert_eq!(factory.calls(), 0);
        assert_eq!(runner.calls(), 0);
    }
}

#[tokio::test]
async fn resolver_on_unsupported_platform_never_runs() {
    let factory = SpyFactory::default();
    let registry = registry_with(factory.clone());
    let journal = Journal::default();
    let runner = RecordingRunner::new(Behaviour::Complete, journal.clone());
    let signals = ScriptedSignals::silent(journal);

    let err = Orchestrator::new(&registry, &runner, &signals)
        .with_platform(WINDOWS)
        .execute("dns", &flags(&[("domain", "example.com"), ("resolver", "8.8.8.8")]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RunError::Options(OptionError::UnsupportedOnPlatform { field: "resolver", .. })
    ));
    assert!(err.to_string().contains("--resolver"));
    assert_eq!(factory.calls(), 0);
    assert_eq!(runner.calls(), 0);
}

#[tokio::test]
async fn malformed_timeout_is_an_invalid_value() {
    let factory = SpyFactory::default();
    let registry = registry_with(factory.clone());
    let journal = Journal::default();
    let runner = RecordingRunner::new(Behaviour::Complete, journal.clone());
    let signals = ScriptedSignals::silent(journal);

    let err = Orchestrator::new(&registry, &runner, &signals)
        .with_platform(LINUX)
        .execute("dns", &flags(&[("domain", "example.com"), ("timeout", "a while")]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RunError::Options(OptionError::InvalidOptionValue { field: "timeout", .. })
    ));
    assert_eq!(factory.calls(), 0);
}

#[tokio::test]
async fn unknown_mode_is_reported() {
    let registry = registry_with(SpyFactory::default());
    let journal = Journal::default();
    let runner = RecordingRunner::new(Behaviour::Complete, journal.clone());
    let signals = ScriptedSignals::silent(journal);

    let err = Orchestrator::new(&registry, &runner, &signals)
        .execute("vhost", &flags(&[("domain", "example.com")]))
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::UnknownMode(ref mode) if mode == "vhost"));
}

#[tokio::test]
async fn construction_failure_skips_the_run() {
    let factory = SpyFactory {
        fail: true,
        ..SpyFactory::default()
    };
    let registry = registry_with(factory.clone());
    let journal = Journal::default();
    let runner = RecordingRunner::new(Behaviour::Complete, journal.clone());
    let signals = ScriptedSignals::silent(journal.clone());

    let err = Orchestrator::new(&registry, &runner, &signals)
        .with_platform(LINUX)
        .execute("dns", &flags(&[("domain", "example.com")]))
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::PluginConstruction { ref mode, .. } if mode == "dns"));
    assert!(err.to_string().contains("resolver socket could not be opened"));
    assert_eq!(factory.calls(), 1);
    assert_eq!(runner.calls(), 0);
    assert!(journal.entries().is_empty());
}

#[tokio::test]
async fn runner_errors_are_wrapped_with_the_mode() {
    let registry = registry_with(SpyFactory::default());
    let journal = Journal::default();
    let runner = RecordingRunner::new(Behaviour::Fail, journal.clone());
    let signals = ScriptedSignals::silent(journal);

    let err = Orchestrator::new(&registry, &runner, &signals)
        .with_platform(LINUX)
        .execute("dns", &flags(&[("domain", "example.com")]))
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Runner { ref mode, .. } if mode == "dns"));
    assert_eq!(err.to_string(), "error on running dns: wordlist vanished");
    assert_eq!(runner.calls(), 1);
}

#[tokio::test]
async fn wordlist_runner_completes_end_to_end() {
    let mut wordlist = tempfile::NamedTempFile::new().unwrap();
    writeln!(wordlist, "www\nmail\n# skipped\nftp").unwrap();
    let path = wordlist.path().to_string_lossy().to_string();

    let factory = SpyFactory {
        hits: vec!["www", "ftp"],
        ..SpyFactory::default()
    };
    let registry = registry_with(factory);
    let runner = WordlistRunner::new();

    let outcome = Orchestrator::new(&registry, &runner, &CtrlC)
        .with_platform(LINUX)
        .execute(
            "dns",
            &flags(&[("domain", "example.com"), ("wordlist", path.as_str()), ("threads", "2"), ("quiet", "true")]),
        )
        .await
        .unwrap();

    let report = match outcome {
        Outcome::Completed(report) => report,
        other => panic!("run should complete, got {other:?}"),
    };
    assert_eq!(report.attempted, 3);
    assert_eq!(report.found, 2);
    assert!(!report.interrupted);
}
