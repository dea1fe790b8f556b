mod commands;
mod terminal;

use std::process::ExitCode;

use burrow_common::config::GlobalOptions;
use burrow_common::success;
use burrow_core::bridge::CtrlC;
use burrow_core::orchestrator::{Orchestrator, Outcome, Prepared};
use burrow_core::registry::ModeRegistry;
use burrow_core::runner::{RunReport, WordlistRunner};
use colored::*;
use commands::CommandLine;
use terminal::{format, logging, print, spinner};
use tracing::{error, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let commands = CommandLine::parse_args();
    logging::init_logging(commands.globals.verbose);

    let quiet = commands.globals.quiet;
    print::banner(quiet);

    let registry = ModeRegistry::with_builtin_modes();
    let (mode, flags) = commands.into_invocation();

    let runner = WordlistRunner::new()
        .on_progress(spinner::report_progress)
        .on_finding(print::finding);
    let orchestrator = Orchestrator::new(&registry, &runner, &CtrlC);

    let prepared = match orchestrator.prepare(mode, &flags).await {
        Ok(prepared) => prepared,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let globals = prepared.globals.clone();
    print_configuration(&prepared);

    print::header("starting enumeration", globals.quiet);
    if !globals.quiet && !globals.no_progress {
        spinner::start();
    }
    let result = orchestrator.run(prepared).await;
    spinner::finish();

    match result {
        Ok(Outcome::Completed(report)) => {
            print_summary(&report, &globals);
            ExitCode::SUCCESS
        }
        Ok(Outcome::Cancelled(report)) => {
            if !globals.quiet {
                warn!(
                    "Stopped after {} probes, {} found",
                    report.attempted, report.found
                );
            }
            print::end_of_program(globals.quiet);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn print_configuration(prepared: &Prepared) {
    let globals = &prepared.globals;
    if globals.quiet {
        return;
    }

    print::header("configuration", false);
    let mut lines = prepared.plugin.summary();
    lines.push(("Threads", globals.threads.to_string()));
    lines.push(("Wordlist", globals.wordlist.to_string()));
    if let Some(output) = &globals.output {
        lines.push(("Output", output.display().to_string()));
    }
    if !globals.delay.is_zero() {
        lines.push(("Delay", format::elapsed(globals.delay)));
    }
    print::aligned_lines(lines);
}

fn print_summary(report: &RunReport, globals: &GlobalOptions) {
    if globals.quiet {
        return;
    }

    print::header("summary", false);
    if report.found == 0 {
        print::print_status("Nothing found".red().to_string());
    }
    if report.failed > 0 {
        warn!("{} probes failed, rerun with -v for details", report.failed);
    }
    success!(
        "{} probes in {}",
        report.attempted.to_string().bold(),
        format::elapsed(report.elapsed)
    );
    print::end_of_program(false);
}
