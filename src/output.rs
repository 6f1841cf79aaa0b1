//! Operator-facing output.
//!
//! Everything the CLI prints goes through [`OutputFormatter`], so styling is
//! consistent. Audit detail goes to the log files, not here.

use crate::relocation::{Decision, PlannedEntry, ScanOutcome};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::time::Duration;

pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints the one-line run summary, `moved=<n>, others=<n>, skipped=<n>`.
    ///
    /// The line itself is never styled so scripts can parse it.
    pub fn summary(outcome: &ScanOutcome) {
        println!("{}", outcome);
        if outcome.failed > 0 {
            Self::warning(&format!(
                "{} file(s) could not be moved; see the debug log",
                outcome.failed
            ));
        }
    }

    /// Prints what a dry run would do with each entry.
    pub fn dry_run_plan(plan: &[PlannedEntry]) {
        Self::header("DRY RUN: planned moves");
        for entry in plan {
            match &entry.decision {
                Decision::Relocate { category, .. } => {
                    println!(" - {} {} {}/", entry.name, "→".cyan(), category);
                }
                Decision::Skip(reason) => {
                    println!(" - {} {}", entry.name, format!("(skip: {})", reason).yellow());
                }
                Decision::Directory => {
                    println!(" - {}/ {}", entry.name, "(directory, not descended)".dimmed());
                }
                Decision::CategoryFolder | Decision::Reserved => {}
            }
        }
    }

    /// Prints a per-category table of planned moves.
    pub fn category_table(plan: &[PlannedEntry]) {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for entry in plan {
            if let Decision::Relocate { category, .. } = &entry.decision {
                *counts.entry(category.as_str()).or_insert(0) += 1;
            }
        }
        if counts.is_empty() {
            Self::info("No files to organize.");
            return;
        }

        let width = counts.keys().map(|c| c.len()).max().unwrap_or(0).max(8);
        let total: usize = counts.values().sum();

        Self::header("SUMMARY");
        println!("{:<width$} | {}", "Category".bold(), "Files".bold(), width = width);
        println!("{}", "-".repeat(width + 10));
        for (category, count) in &counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                if *count == 1 { "file" } else { "files" },
                width = width
            );
        }
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            if total == 1 { "file" } else { "files" },
            width = width
        );
    }

    /// Blocks for `interval`, showing a countdown spinner.
    pub fn wait_with_spinner(interval: Duration) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(style);
        }

        let tick = Duration::from_millis(250);
        let mut remaining = interval;
        while !remaining.is_zero() {
            spinner.set_message(format!("next scan in {}s", remaining.as_secs()));
            spinner.tick();
            let step = remaining.min(tick);
            std::thread::sleep(step);
            remaining -= step;
        }
        spinner.finish_and_clear();
    }
}
