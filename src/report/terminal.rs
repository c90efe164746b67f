// file: src/report/terminal.rs
// description: terminal rendering of intake snapshots and the final summary
// reference: uses indicatif for per-file progress bars

use crate::config::DisplayLabels;
use crate::models::{FileRecordSnapshot, Lifecycle};
use crate::pipeline::IntakeSnapshot;
use crate::utils::logging::{format_error, format_info, format_success, format_warning};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeSummary {
    pub valid: usize,
    pub invalid: usize,
    pub validating: usize,
    pub total_pages: u32,
}

impl IntakeSummary {
    pub fn from_snapshot(snapshot: &IntakeSnapshot) -> Self {
        let mut summary = Self::default();
        for record in &snapshot.records {
            match record.lifecycle {
                Lifecycle::Valid => {
                    summary.valid += 1;
                    summary.total_pages += record.page_count;
                }
                Lifecycle::Invalid => summary.invalid += 1,
                Lifecycle::Pending | Lifecycle::Validating => summary.validating += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.valid + self.invalid + self.validating
    }

    pub fn success_rate(&self) -> f64 {
        let settled = self.valid + self.invalid;
        if settled == 0 {
            return 0.0;
        }
        (self.valid as f64 / settled as f64) * 100.0
    }
}

/// One progress bar per record, kept in record order.
pub struct IntakeProgressView {
    multi: MultiProgress,
    bars: Vec<ProgressBar>,
    labels: DisplayLabels,
    colored: bool,
}

impl IntakeProgressView {
    pub fn new(labels: DisplayLabels, colored: bool) -> Self {
        Self::with_target(labels, colored, ProgressDrawTarget::stderr())
    }

    pub fn hidden(labels: DisplayLabels) -> Self {
        Self::with_target(labels, false, ProgressDrawTarget::hidden())
    }

    fn with_target(labels: DisplayLabels, colored: bool, target: ProgressDrawTarget) -> Self {
        Self {
            multi: MultiProgress::with_draw_target(target),
            bars: Vec::new(),
            labels,
            colored,
        }
    }

    pub fn render(&mut self, snapshot: &IntakeSnapshot) {
        while self.bars.len() < snapshot.records.len() {
            let bar = self.multi.add(ProgressBar::new(100));
            bar.set_style(bar_style(self.colored));
            self.bars.push(bar);
        }
        while self.bars.len() > snapshot.records.len() {
            if let Some(bar) = self.bars.pop() {
                bar.finish_and_clear();
                self.multi.remove(&bar);
            }
        }

        for (bar, record) in self.bars.iter().zip(&snapshot.records) {
            bar.set_prefix(record.name().to_string());
            bar.set_position(record.progress.unwrap_or(0) as u64);
            bar.set_message(self.status_message(record));
        }
    }

    pub fn finish(&self) {
        for bar in &self.bars {
            bar.finish();
        }
    }

    fn status_message(&self, record: &FileRecordSnapshot) -> String {
        let label = record.status_label(&self.labels);
        match record.lifecycle {
            Lifecycle::Valid => format!("{} ({} page(s))", label, record.page_count),
            Lifecycle::Invalid => format!("{}: {}", self.labels.invalid, label),
            Lifecycle::Pending | Lifecycle::Validating => label.to_string(),
        }
    }

    #[cfg(test)]
    fn positions(&self) -> Vec<u64> {
        self.bars.iter().map(|b| b.position()).collect()
    }
}

impl Drop for IntakeProgressView {
    fn drop(&mut self) {
        self.finish();
    }
}

fn bar_style(colored: bool) -> ProgressStyle {
    let (template, chars) = if colored {
        ("{prefix:.bold} [{bar:30.cyan/blue}] {pos:>3}% {msg}", "█▓▒░")
    } else {
        ("{prefix} [{bar:30}] {pos:>3}% {msg}", "=>-")
    };

    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(chars)
}

/// Per-record lines followed by the gate verdict.
pub fn summary_lines(snapshot: &IntakeSnapshot, labels: &DisplayLabels) -> Vec<String> {
    let mut lines = Vec::with_capacity(snapshot.records.len() + 3);

    for (index, record) in snapshot.records.iter().enumerate() {
        let line = format!("{}. {}", index + 1, record.name());
        lines.push(match record.lifecycle {
            Lifecycle::Valid => format_success(&format!(
                "{} - {} ({} page(s))",
                line,
                record.status_label(labels),
                record.page_count
            )),
            Lifecycle::Invalid => {
                format_error(&format!("{} - {}", line, record.status_label(labels)))
            }
            Lifecycle::Pending | Lifecycle::Validating => {
                format_info(&format!("{} - {}", line, record.status_label(labels)))
            }
        });
    }

    if let Some(notice) = &snapshot.notice {
        lines.push(format_warning(&notice.message));
    }

    let summary = IntakeSummary::from_snapshot(snapshot);
    lines.push(format_info(&format!(
        "{} valid, {} invalid, {} page(s) total",
        summary.valid, summary.invalid, summary.total_pages
    )));

    match snapshot.verdict.reason_text() {
        None => lines.push(format_success("Ready to continue")),
        Some(reason) => lines.push(format_warning(&reason)),
    }

    lines
}

pub fn print_summary(snapshot: &IntakeSnapshot, labels: &DisplayLabels) {
    println!();
    for line in summary_lines(snapshot, labels) {
        println!("{}", line);
    }
}
