//! Run statistics
//!
//! Every page attempt made by a [`Scraper`](crate::crawler::Scraper) is counted
//! under its [`PageOutcome`], and the totals are printed once the job ends.

use crate::state::PageOutcome;
use std::collections::HashMap;

/// Per-outcome page counters for one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarvestStats {
    /// Count of page attempts by outcome
    pub pages_by_outcome: HashMap<PageOutcome, u64>,

    /// Number of records handed to the exporters
    pub records_written: u64,
}

impl HarvestStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one page attempt
    pub fn record(&mut self, outcome: PageOutcome) {
        *self.pages_by_outcome.entry(outcome).or_insert(0) += 1;
    }

    pub fn count(&self, outcome: PageOutcome) -> u64 {
        self.pages_by_outcome.get(&outcome).copied().unwrap_or(0)
    }

    /// Total page attempts across all outcomes
    pub fn total_pages(&self) -> u64 {
        self.pages_by_outcome.values().sum()
    }

    /// Pages that produced a record (scraped or served from cache)
    pub fn successful_pages(&self) -> u64 {
        PageOutcome::all()
            .iter()
            .filter(|outcome| outcome.is_success())
            .map(|outcome| self.count(*outcome))
            .sum()
    }

    /// Pages lost to network or HTTP failures
    pub fn failed_pages(&self) -> u64 {
        PageOutcome::all()
            .iter()
            .filter(|outcome| outcome.is_error())
            .map(|outcome| self.count(*outcome))
            .sum()
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStats) {
    println!("=== Harvest Statistics ===\n");

    let total = stats.total_pages();
    println!("Pages by Outcome:");
    for outcome in PageOutcome::all() {
        let count = stats.count(outcome);
        if count == 0 {
            continue;
        }
        let percentage = if total > 0 {
            (count as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", outcome, count, percentage);
    }
    println!();

    println!("Records written: {}", stats.records_written);

    let success_rate = if total > 0 {
        (stats.successful_pages() as f64 / total as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Success Rate: {:.1}% ({} / {} pages)",
        success_rate,
        stats.successful_pages(),
        total
    );
}
