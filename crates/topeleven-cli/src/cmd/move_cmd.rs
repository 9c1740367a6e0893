//! `t11 move`: swap an entry into a new slot of its list.

use anyhow::Result;
use clap::{Args, ValueEnum};
use topeleven_core::EntryHandle;
use topeleven_core::access::ensure_owner;
use topeleven_core::reposition::move_entry;

use super::{CmdContext, slot_label};
use crate::output::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntryKind {
    /// A directly placed item.
    Item,
    /// A reference in a main category.
    #[value(alias = "reference")]
    Ref,
}

#[derive(Args, Debug)]
pub struct MoveArgs {
    /// What to move.
    #[arg(value_enum)]
    pub kind: EntryKind,

    /// Item or reference id.
    pub id: i64,

    /// Target slot 1..=11.
    #[arg(allow_negative_numbers = true)]
    pub position: i64,
}

impl MoveArgs {
    pub const fn handle(&self) -> EntryHandle {
        match self.kind {
            EntryKind::Item => EntryHandle::Item(self.id),
            EntryKind::Ref => EntryHandle::Reference(self.id),
        }
    }
}

/// Execute `t11 move`.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, the owner check fails, or
/// the move is rejected.
pub fn run_move(args: &MoveArgs, ctx: &CmdContext<'_>) -> Result<()> {
    let (config, mut store) = ctx.open()?;
    let owner = ctx.require_owner(&config)?;
    let handle = args.handle();

    ctx.check(ensure_owner(store.conn(), handle.into(), &owner))?;
    let outcome = ctx.check(move_entry(&mut store, handle, args.position))?;

    render(ctx.output, &outcome, |o, w| {
        if o.is_noop() {
            return writeln!(w, "{} already at {}", o.handle, o.to);
        }
        writeln!(
            w,
            "moved {} in {} from {} to {}",
            o.handle,
            o.list,
            slot_label(o.from),
            o.to
        )?;
        if let Some(displaced) = o.displaced {
            writeln!(w, "  {displaced} now at {}", slot_label(o.vacated()))?;
        }
        Ok(())
    })
}
