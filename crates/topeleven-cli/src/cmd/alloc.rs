//! `t11 alloc`: report the next free slot of a list without writing.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use topeleven_core::ListId;
use topeleven_core::alloc::allocate;

use super::{CmdContext, ListTarget};
use crate::output::render_mode;

#[derive(Args, Debug)]
pub struct AllocArgs {
    #[command(flatten)]
    pub target: ListTarget,
}

#[derive(Debug, Serialize)]
struct AllocReport {
    list: ListId,
    position: u8,
    full: bool,
}

/// Execute `t11 alloc`.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the list does not exist.
pub fn run_alloc(args: &AllocArgs, ctx: &CmdContext<'_>) -> Result<()> {
    let (_config, store) = ctx.open()?;
    let list = args.target.list()?;
    let allocation = ctx.check(allocate(store.conn(), list))?;

    let report = AllocReport {
        list,
        position: allocation.position.get(),
        full: allocation.full,
    };
    render_mode(
        ctx.output,
        &report,
        |r, w| writeln!(w, "{}\t{}", r.position, if r.full { "full" } else { "free" }),
        |r, w| {
            if r.full {
                writeln!(w, "{} is full (slot {} would be replaced)", r.list, r.position)
            } else {
                writeln!(w, "next free slot in {}: {}", r.list, r.position)
            }
        },
    )
}
