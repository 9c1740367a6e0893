//! `t11 show`: print one list in rank order.

use anyhow::Result;
use clap::Args;
use std::io::Write;
use topeleven_core::catalog::list_entries;
use topeleven_core::model::{RankedList, SLOT_COUNT};
use topeleven_core::ListEntry;

use super::{CmdContext, ListTarget, slot_label};
use crate::output::{pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub target: ListTarget,
}

/// Execute `t11 show`.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the list does not exist.
pub fn run_show(args: &ShowArgs, ctx: &CmdContext<'_>) -> Result<()> {
    let (_config, store) = ctx.open()?;
    let list = args.target.list()?;
    let ranked = ctx.check(list_entries(store.conn(), list))?;
    render_mode(ctx.output, &ranked, render_text, render_pretty)
}

fn kind_label(entry: &ListEntry) -> String {
    match entry {
        ListEntry::DirectItem(item) => format!("item:{}", item.id),
        ListEntry::ReferenceEntry { reference, target } => {
            format!("ref:{}->item:{}", reference.id, target.id)
        }
    }
}

fn render_text(ranked: &RankedList, w: &mut dyn Write) -> std::io::Result<()> {
    for entry in &ranked.entries {
        writeln!(
            w,
            "{}\t{}\t{}",
            slot_label(entry.position()),
            kind_label(entry),
            entry.title()
        )?;
    }
    Ok(())
}

fn render_pretty(ranked: &RankedList, w: &mut dyn Write) -> std::io::Result<()> {
    let ranked_count = ranked.slots().len();
    pretty_section(
        w,
        &format!("{} ({ranked_count}/{SLOT_COUNT})", ranked.list),
    )?;
    if ranked.is_empty() {
        return writeln!(w, "  (empty)");
    }
    for entry in &ranked.entries {
        let marker = if entry.is_reference() { "↗" } else { " " };
        writeln!(
            w,
            "{:>3} {marker} {:<40} {}",
            slot_label(entry.position()),
            entry.title(),
            kind_label(entry)
        )?;
    }
    Ok(())
}
