//! Ordered per-item results for runs that attempt every item and keep going.

use crate::error::ApiError;
use std::fmt;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The operation was attempted and failed.
    Failed,
    /// The operation was not attempted, or the failure was expected schema drift.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub kind: FailureKind,
    pub reason: String,
}

impl From<ApiError> for ItemFailure {
    fn from(err: ApiError) -> Self {
        let kind = if err.is_recoverable() {
            FailureKind::Skipped
        } else {
            FailureKind::Failed
        };
        Self {
            kind,
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ItemOutcome<T> {
    pub label: String,
    pub result: Result<T, ItemFailure>,
}

impl<T> ItemOutcome<T> {
    pub fn glyph(&self) -> &'static str {
        match &self.result {
            Ok(_) => "✅",
            Err(ItemFailure { kind: FailureKind::Skipped, .. }) => "⚠️",
            Err(ItemFailure { kind: FailureKind::Failed, .. }) => "❌",
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone)]
pub struct BatchReport<T> {
    name: String,
    outcomes: Vec<ItemOutcome<T>>,
}

impl<T> BatchReport<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcomes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn push(&mut self, label: impl Into<String>, result: Result<T, ItemFailure>) {
        let outcome = ItemOutcome {
            label: label.into(),
            result,
        };
        log_outcome(&self.name, &outcome);
        self.outcomes.push(outcome);
    }

    pub fn push_ok(&mut self, label: impl Into<String>, value: T) {
        self.push(label, Ok(value));
    }

    pub fn push_failed(&mut self, label: impl Into<String>, reason: impl Into<String>) {
        self.push(
            label,
            Err(ItemFailure {
                kind: FailureKind::Failed,
                reason: reason.into(),
            }),
        );
    }

    pub fn push_skipped(&mut self, label: impl Into<String>, reason: impl Into<String>) {
        self.push(
            label,
            Err(ItemFailure {
                kind: FailureKind::Skipped,
                reason: reason.into(),
            }),
        );
    }

    /// Records an API result, classifying recoverable errors as skipped.
    pub fn record(&mut self, label: impl Into<String>, result: Result<T, ApiError>) {
        self.push(label, result.map_err(ItemFailure::from));
    }

    pub fn outcomes(&self) -> &[ItemOutcome<T>] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.count_kind(FailureKind::Failed)
    }

    pub fn skipped(&self) -> usize {
        self.count_kind(FailureKind::Skipped)
    }

    /// No item failed outright. Skips are tolerated.
    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} succeeded, {} failed, {} skipped",
            self.succeeded(),
            self.failed(),
            self.skipped()
        )
    }

    /// Appends another report's outcomes, keeping their order. Not re-logged.
    pub fn merge(&mut self, other: BatchReport<T>) {
        self.outcomes.extend(other.outcomes);
    }

    pub fn log_summary(&self) {
        if self.is_clean() {
            info!("{}: {}", self.name, self.summary());
        } else {
            warn!("{}: {}", self.name, self.summary());
        }
    }

    fn count_kind(&self, kind: FailureKind) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(&o.result, Err(f) if f.kind == kind))
            .count()
    }
}

fn log_outcome<T>(batch: &str, outcome: &ItemOutcome<T>) {
    match &outcome.result {
        Ok(_) => info!("{} {}: {}", outcome.glyph(), batch, outcome.label),
        Err(failure) if failure.kind == FailureKind::Skipped => {
            warn!("{} {}: {} ({})", outcome.glyph(), batch, outcome.label, failure.reason)
        }
        Err(failure) => error!("{} {}: {} ({})", outcome.glyph(), batch, outcome.label, failure.reason),
    }
}

impl<T> fmt::Display for BatchReport<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        for outcome in &self.outcomes {
            match &outcome.result {
                Ok(_) => writeln!(f, "  {} {}", outcome.glyph(), outcome.label)?,
                Err(failure) => writeln!(f, "  {} {}: {}", outcome.glyph(), outcome.label, failure.reason)?,
            }
        }
        write!(f, "  {}", self.summary())
    }
}
