//! Out-of-band repair passes that restore list invariants after drift.
//!
//! Each pass is idempotent and runs in its own transaction, in this order:
//!
//! 1. [`orphans`]: delete items with no sub or main category.
//! 2. [`dangling`]: delete references whose target is gone or no longer
//!    lives in a sub category.
//! 3. [`range`]: move entries outside `1..=11` to the lowest free slot of
//!    their list (slot 11 when full).
//! 4. [`duplicates`]: keep the earliest-created entry of every shared slot
//!    and move the others to the next free slot after it.
//! 5. [`prune`]: delete empty sub categories, then empty main categories.
//!
//! A pass that fails is rolled back, logged, and recorded in the report; the
//! remaining passes still run. Nothing a pass finds on an individual row ever
//! fails the pass.

pub mod dangling;
pub mod duplicates;
pub mod orphans;
pub mod prune;
pub mod range;

use std::fmt;

use rusqlite::Connection;
use serde::Serialize;

use crate::db::{Store, now_us, query};
use crate::error::{Result, TopElevenError};
use crate::model::EntryHandle;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Tunables for one reconcile run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Run the empty-category pass.
    pub prune_empty_categories: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            prune_empty_categories: true,
        }
    }
}

/// The five repair passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pass {
    Orphans,
    DanglingReferences,
    RangeClamp,
    Duplicates,
    PruneCategories,
}

impl Pass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Orphans => "orphans",
            Self::DanglingReferences => "dangling_references",
            Self::RangeClamp => "range_clamp",
            Self::Duplicates => "duplicates",
            Self::PruneCategories => "prune_categories",
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pass that was rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedPass {
    pub pass: Pass,
    pub error: String,
}

/// Per-pass affected-row counts of one reconcile run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub orphans_deleted: usize,
    pub dangling_references_deleted: usize,
    pub positions_clamped: usize,
    pub duplicates_moved: usize,
    pub sub_categories_pruned: usize,
    pub main_categories_pruned: usize,
    /// Duplicate entries left in place because no later slot was free.
    pub unresolved: Vec<EntryHandle>,
    pub failed: Vec<FailedPass>,
    /// Passes turned off by [`ReconcileOptions`].
    pub skipped: Vec<Pass>,
    /// When the previous run finished; `None` before the first run.
    pub previous_run_at_us: Option<i64>,
    pub finished_at_us: i64,
}

impl ReconcileReport {
    /// Rows changed across all passes.
    #[must_use]
    pub const fn total_changes(&self) -> usize {
        self.orphans_deleted
            + self.dangling_references_deleted
            + self.positions_clamped
            + self.duplicates_moved
            + self.sub_categories_pruned
            + self.main_categories_pruned
    }

    /// `true` when every pass ran and nothing was left unresolved.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.unresolved.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Run every pass against `store` and report what changed.
///
/// Safe to re-run after interruption: each committed pass leaves the store
/// consistent for the passes after it.
///
/// # Errors
///
/// Pass failures are reported, not returned. Only a failure to record the
/// run timestamp is returned.
pub fn reconcile(store: &mut Store, options: &ReconcileOptions) -> Result<ReconcileReport> {
    let mut report = ReconcileReport {
        previous_run_at_us: Some(query::last_reconcile_at(store.conn())?).filter(|at| *at > 0),
        ..ReconcileReport::default()
    };

    report.orphans_deleted = run_pass(store, &mut report, Pass::Orphans, orphans::sweep);
    report.dangling_references_deleted =
        run_pass(store, &mut report, Pass::DanglingReferences, dangling::sweep);
    report.positions_clamped = run_pass(store, &mut report, Pass::RangeClamp, range::clamp);

    let resolution = run_pass(store, &mut report, Pass::Duplicates, duplicates::resolve);
    report.duplicates_moved = resolution.moved;
    report.unresolved = resolution.unresolved;

    if options.prune_empty_categories {
        let pruned = run_pass(store, &mut report, Pass::PruneCategories, prune::prune);
        report.sub_categories_pruned = pruned.sub_categories;
        report.main_categories_pruned = pruned.main_categories;
    } else {
        report.skipped.push(Pass::PruneCategories);
    }

    report.finished_at_us = now_us();
    store.write(|tx| {
        tx.execute(
            "UPDATE store_meta SET last_reconcile_at_us = ?1 WHERE id = 1",
            [report.finished_at_us],
        )?;
        Ok::<_, TopElevenError>(())
    })?;

    tracing::info!(
        changes = report.total_changes(),
        unresolved = report.unresolved.len(),
        failed = report.failed.len(),
        "reconcile finished"
    );
    Ok(report)
}

fn run_pass<T: Default>(
    store: &mut Store,
    report: &mut ReconcileReport,
    pass: Pass,
    f: impl FnOnce(&Connection) -> Result<T>,
) -> T {
    match store.write(|tx| f(tx)) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(%pass, error = %err, "reconcile pass failed, rolled back");
            report.failed.push(FailedPass {
                pass,
                error: err.to_string(),
            });
            T::default()
        }
    }
}
