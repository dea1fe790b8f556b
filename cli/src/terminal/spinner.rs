use std::io::Write;
use std::sync::OnceLock;
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

const TICK_RATE: Duration = Duration::from_millis(100);
const STOP_HINT: &str = "Ctrl+C to stop";

static SPINNER: OnceLock<ProgressBar> = OnceLock::new();

/// Shows the spinner. Log lines are routed above it from now on.
pub fn start() {
    SPINNER.get_or_init(|| {
        let style = ProgressStyle::with_template("{spinner:.blue} {msg} {prefix:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&[
                "▁▁▁▁▁", "▁▂▂▂▁", "▁▄▂▄▁", "▂▄▆▄▂", "▄▆█▆▄", "▂▄▆▄▂", "▁▄▂▄▁", "▁▂▂▂▁",
            ]);

        let pb = ProgressBar::new_spinner().with_style(style);
        pb.set_message(format!("{}", "Waiting for the first probe...".italic().white()));
        pb.set_prefix(format!("({STOP_HINT})"));
        pb.enable_steady_tick(TICK_RATE);
        pb
    });
}

pub fn finish() {
    if let Some(pb) = SPINNER.get() {
        pb.finish_and_clear();
    }
}

/// Progress callback of the runner. Does nothing while no spinner is shown.
pub fn report_progress(count: usize) {
    if let Some(pb) = SPINNER.get() {
        pb.set_message(format!("Probed {} candidates", count.to_string().green().bold()));
    }
}

/// Log sink that prints above the spinner while one is running.
pub struct SpinnerWriter;

impl Write for SpinnerWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match SPINNER.get() {
            Some(pb) if !pb.is_finished() => {
                pb.println(String::from_utf8_lossy(buf).trim_end());
                Ok(buf.len())
            }
            _ => std::io::stdout().write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        std::io::stdout().flush()
    }
}
