//! Human-readable rendering of operation outcomes
//!
//! The text goes back to the caller next to the structured result, so it
//! stays plain (no ANSI styling) and line-oriented.

use std::fmt::Write;

use crate::memory::ops::{
    CategoryListing, CategoryPlan, DeleteOutcome, ListOutcome, PruneOutcome, ReadOutcome,
    SearchOutcome, WriteOutcome,
};
use crate::memory::{Category, Entry};

pub trait Render {
    fn render(&self) -> String;
}

fn entry_line(out: &mut String, entry: &Entry) {
    let _ = write!(out, "- {}: {}", entry.key, entry.value);
    if let (Some(wrong), Some(correct)) = (&entry.wrong, &entry.correct) {
        let _ = write!(out, " (wrong: {} / correct: {})", wrong, correct);
    }
    if let Some(frequency) = entry.frequency {
        let _ = write!(out, " [seen {}x]", frequency);
    }
    out.push('\n');
    if let Some(reason) = &entry.reason {
        let _ = writeln!(out, "  reason: {}", reason);
    }
    if let Some(alternatives) = entry.alternatives_considered.as_ref().filter(|a| !a.is_empty()) {
        let _ = writeln!(out, "  alternatives: {}", alternatives.join(", "));
    }
}

fn category_block(out: &mut String, category: Category, entries: &[Entry]) {
    let _ = writeln!(out, "## {} ({})", category, entries.len());
    if entries.is_empty() {
        out.push_str("(no entries)\n");
    }
    for entry in entries {
        entry_line(out, entry);
    }
}

fn plan_lines(out: &mut String, plan: &[CategoryPlan]) {
    for p in plan {
        let _ = writeln!(out, "## {} ({} to remove)", p.category, p.count);
        for key in &p.keys {
            let _ = writeln!(out, "- {}", key);
        }
        if p.keys.len() < p.count {
            let _ = writeln!(out, "... and {} more", p.count - p.keys.len());
        }
    }
}

fn listing_lines(out: &mut String, listing: &CategoryListing) {
    for item in &listing.items {
        match &item.timestamp {
            Some(ts) => {
                let _ = writeln!(out, "- {} [{}]: {}", item.key, ts, item.preview);
            }
            None => {
                let _ = writeln!(out, "- {}: {}", item.key, item.preview);
            }
        }
    }
}

impl Render for WriteOutcome {
    fn render(&self) -> String {
        let verb = if self.created { "Stored" } else { "Updated" };
        format!(
            "{} '{}' in {}: {}",
            verb, self.entry.key, self.category, self.entry.value
        )
    }
}

impl Render for ReadOutcome {
    fn render(&self) -> String {
        let mut out = String::new();
        match self {
            ReadOutcome::Category { category, entries } => category_block(&mut out, *category, entries),
            ReadOutcome::ProtocolState { state } => {
                out.push_str("## protocol-state\n");
                out.push_str(&pretty(state));
            }
            ReadOutcome::All {
                categories,
                protocol_state,
            } => {
                for (category, entries) in categories {
                    category_block(&mut out, *category, entries);
                    out.push('\n');
                }
                out.push_str("## protocol-state\n");
                out.push_str(&pretty(protocol_state));
            }
        }
        out.trim_end().to_string()
    }
}

fn pretty(state: &serde_json::Value) -> String {
    if state.is_null() {
        return "(none)\n".to_string();
    }
    serde_json::to_string_pretty(state).unwrap_or_else(|_| state.to_string()) + "\n"
}

impl Render for SearchOutcome {
    fn render(&self) -> String {
        if self.hits.is_empty() {
            return format!("No memories match '{}'.", self.query);
        }
        let mut out = format!(
            "{} result(s) for '{}' ({}):\n",
            self.hits.len(),
            self.query,
            if self.fuzzy { "fuzzy" } else { "exact" }
        );
        for hit in &self.hits {
            let _ = writeln!(
                out,
                "- [{}] {} ({:.2}): {}",
                hit.category, hit.entry.key, hit.score, hit.entry.value
            );
        }
        out.trim_end().to_string()
    }
}

impl Render for ListOutcome {
    fn render(&self) -> String {
        let mut out = String::new();
        match self {
            ListOutcome::Category { category, listing } => {
                let _ = writeln!(out, "## {} ({})", category, listing.count);
                listing_lines(&mut out, listing);
            }
            ListOutcome::All { categories, total } => {
                let _ = writeln!(out, "{} memories", total);
                for (category, listing) in categories {
                    let _ = writeln!(out, "\n## {} ({})", category, listing.count);
                    listing_lines(&mut out, listing);
                }
            }
        }
        out.trim_end().to_string()
    }
}

impl Render for DeleteOutcome {
    fn render(&self) -> String {
        match self {
            DeleteOutcome::PendingConfirmation { category, entry } => format!(
                "Confirmation required to delete '{}' from {}:\n  {}\nResend with confirm: true to delete.",
                entry.key, category, entry.value
            ),
            DeleteOutcome::Deleted {
                category,
                entry,
                remaining,
            } => format!(
                "Deleted '{}' from {} ({} remaining).",
                entry.key, category, remaining
            ),
        }
    }
}

impl Render for PruneOutcome {
    fn render(&self) -> String {
        let mut out = String::new();
        match self {
            PruneOutcome::NothingToPrune => out.push_str("Nothing to prune."),
            PruneOutcome::Preview { plan, total } => {
                let _ = writeln!(out, "Dry run: {} entries would be pruned.", total);
                plan_lines(&mut out, plan);
            }
            PruneOutcome::PendingConfirmation { plan, total } => {
                let _ = writeln!(out, "Confirmation required to prune {} entries.", total);
                plan_lines(&mut out, plan);
                out.push_str("Resend with confirm: true to prune.");
            }
            PruneOutcome::Pruned { categories, total } => {
                let _ = writeln!(out, "Pruned {} entries.", total);
                for c in categories {
                    let _ = writeln!(
                        out,
                        "- {}: removed {}, {} remaining",
                        c.category, c.removed, c.remaining
                    );
                }
            }
        }
        out.trim_end().to_string()
    }
}
