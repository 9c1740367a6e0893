//! `t11 reconcile`: run the repair passes under the maintenance lock.

use anyhow::Result;
use clap::Args;
use std::io::Write;
use topeleven_core::TopElevenError;
use topeleven_core::lock::MaintenanceLock;
use topeleven_core::reconcile::{ReconcileOptions, ReconcileReport, reconcile};

use super::CmdContext;
use crate::output::{pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Skip the empty-category pass regardless of config.
    #[arg(long)]
    pub no_prune: bool,
}

/// Execute `t11 reconcile`.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, another run holds the
/// maintenance lock, or any pass failed.
pub fn run_reconcile(args: &ReconcileArgs, ctx: &CmdContext<'_>) -> Result<()> {
    let (config, mut store) = ctx.open()?;

    let lock_path = MaintenanceLock::path_for(&config.db_path);
    let lock = ctx.check(
        MaintenanceLock::acquire(&lock_path, config.project.maintenance.lock_timeout())
            .map_err(TopElevenError::from),
    )?;

    let options = ReconcileOptions {
        prune_empty_categories: config.project.maintenance.prune_empty_categories
            && !args.no_prune,
    };
    let report = ctx.check(reconcile(&mut store, &options))?;
    lock.release();

    render_mode(ctx.output, &report, render_text, render_pretty)?;

    if report.failed.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} reconcile pass(es) failed", report.failed.len())
    }
}

fn render_text(report: &ReconcileReport, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "orphans_deleted\t{}", report.orphans_deleted)?;
    writeln!(
        w,
        "dangling_references_deleted\t{}",
        report.dangling_references_deleted
    )?;
    writeln!(w, "positions_clamped\t{}", report.positions_clamped)?;
    writeln!(w, "duplicates_moved\t{}", report.duplicates_moved)?;
    writeln!(w, "sub_categories_pruned\t{}", report.sub_categories_pruned)?;
    writeln!(w, "main_categories_pruned\t{}", report.main_categories_pruned)?;
    writeln!(
        w,
        "previous_run_at_us\t{}",
        report.previous_run_at_us.map_or_else(|| "-".to_string(), |at| at.to_string())
    )?;
    for handle in &report.unresolved {
        writeln!(w, "unresolved\t{handle}")?;
    }
    for failed in &report.failed {
        writeln!(w, "failed\t{}\t{}", failed.pass, failed.error)?;
    }
    Ok(())
}

fn render_pretty(report: &ReconcileReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Reconcile")?;
    pretty_kv(w, "orphans", report.orphans_deleted.to_string())?;
    pretty_kv(w, "dangling", report.dangling_references_deleted.to_string())?;
    pretty_kv(w, "clamped", report.positions_clamped.to_string())?;
    pretty_kv(w, "duplicates", report.duplicates_moved.to_string())?;
    pretty_kv(
        w,
        "pruned",
        format!(
            "{} sub, {} main",
            report.sub_categories_pruned, report.main_categories_pruned
        ),
    )?;
    pretty_kv(
        w,
        "last run",
        report
            .previous_run_at_us
            .map_or_else(|| "never".to_string(), |at| format!("{at} us")),
    )?;
    for pass in &report.skipped {
        writeln!(w, "skipped {pass}")?;
    }
    for handle in &report.unresolved {
        writeln!(w, "unresolved: {handle} shares its slot and no later slot is free")?;
    }
    for failed in &report.failed {
        writeln!(w, "FAILED {}: {}", failed.pass, failed.error)?;
    }
    if report.total_changes() == 0 && report.is_clean() {
        writeln!(w, "store is consistent")?;
    }
    Ok(())
}
