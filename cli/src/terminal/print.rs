use std::time::Duration;

use colored::*;
use geopipe_common::config::OutputMode;
use geopipe_core::RunSummary;
use tracing::info;

pub const TOTAL_WIDTH: usize = 64;

const BANNER: &str = r#"
    ____ _____ ___  ____ ___ ____  _____
   / ___| ____/ _ \|  _ \_ _|  _ \| ____|
  | |  _|  _|| | | | |_) | || |_) |  _|
  | |_| | |__| |_| |  __/| ||  __/| |___
   \____|_____\___/|_|  |___|_|   |_____|
"#;

/// Prints the banner. Verbose mode only.
pub fn banner(mode: OutputMode) {
    if !mode.is_verbose() {
        return;
    }

    let text_content: String = format!("⟦ GEOPIPE v{} ⟧", env!("CARGO_PKG_VERSION"));
    let text_width: usize = console::measure_text_width(&text_content);
    let sep_width: usize = TOTAL_WIDTH.saturating_sub(text_width) / 2;
    let sep: ColoredString = "═".repeat(sep_width).bright_black();
    let text: ColoredString = text_content.bright_green().bold();

    println!("{}", BANNER.cyan());
    println!("{sep}{text}{sep}");
}

/// Points the user at `--help` after a startup error.
pub fn usage_hint(usage: &str) {
    eprintln!("\n{}\n\nFor more information, try '{}'.", usage.trim_end(), "--help".bold());
}

/// Logs the end-of-run statistics. Only visible when info is enabled, i.e. in verbose mode.
pub fn summary(summary: &RunSummary, country: &str, elapsed: Duration) {
    for line in summary_lines(summary, country, elapsed) {
        info!("{line}");
    }
}

fn summary_lines(summary: &RunSummary, country: &str, elapsed: Duration) -> Vec<String> {
    let mut lines: Vec<String> = vec![
        format!(
            "Read {} valid domains, skipped {} invalid lines",
            summary.valid_domains, summary.skipped_lines
        ),
        format!(
            "Resolved {} of {} domains to {} addresses ({} lookups failed)",
            summary.resolved_domains,
            summary.valid_domains,
            summary.addresses,
            summary.failed_lookups
        ),
        format!(
            "{} distinct domains matched {}",
            summary.matched_domains,
            country.bold()
        ),
    ];

    lines.push(match summary.match_percentage() {
        Some(percent) if summary.matched_domains > 0 => format!(
            "{} of the domains supplied have at least one DNS entry pointing to an IP in {}",
            format!("{percent}%").bold(),
            country.bold()
        ),
        _ => format!(
            "None of the domains supplied have a DNS entry pointing to an IP in {}",
            country.bold()
        ),
    });

    lines.push(format!(
        "Completed in {}",
        format!("{:.2}s", elapsed.as_secs_f64()).yellow().bold()
    ));
    lines
}
