//! `t11 ref`: project sub-category items into their parent main category.

use anyhow::Result;
use clap::Subcommand;
use topeleven_core::access::{Owned, ensure_owner};
use topeleven_core::catalog;

use super::{CmdContext, slot_label};
use crate::output::render;

#[derive(Subcommand, Debug)]
pub enum RefCommand {
    #[command(
        about = "Reference a sub category item into its main category",
        long_about = "Rank an item from a sub category inside the parent main category as well, \
                      at a position independent of its own.",
        after_help = "EXAMPLES:\n    # Lowest free slot of main category 1\n    t11 ref add 7 --main 1\n\n    # Explicit slot\n    t11 ref add 7 --main 1 --position 2"
    )]
    Add {
        /// Item id (must live in a sub category of --main).
        item: i64,

        /// Main category id.
        #[arg(long, value_name = "ID")]
        main: i64,

        /// Slot 1..=11. Omit to take the lowest free slot.
        #[arg(long, allow_negative_numbers = true)]
        position: Option<i64>,
    },

    #[command(
        about = "Remove a reference",
        after_help = "EXAMPLES:\n    t11 ref rm 3"
    )]
    Rm {
        /// Reference id.
        id: i64,
    },
}

/// Execute one `t11 ref` subcommand.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, the owner check fails, or
/// the core operation is rejected.
pub fn run_ref(command: &RefCommand, ctx: &CmdContext<'_>) -> Result<()> {
    let (config, mut store) = ctx.open()?;
    let owner = ctx.require_owner(&config)?;

    match command {
        RefCommand::Add {
            item,
            main,
            position,
        } => {
            ctx.check(ensure_owner(store.conn(), Owned::MainCategory(*main), &owner))?;
            let reference = ctx.check(catalog::create_reference(&mut store, *main, *item, *position))?;
            render(ctx.output, &reference, |r, w| {
                writeln!(
                    w,
                    "referenced item {} into main category {} at {} (reference {})",
                    r.rank_item_id,
                    r.main_category_id,
                    slot_label(r.position),
                    r.id
                )
            })
        }
        RefCommand::Rm { id } => {
            ctx.check(ensure_owner(store.conn(), Owned::Reference(*id), &owner))?;
            let reference = ctx.check(catalog::delete_reference(&mut store, *id))?;
            render(ctx.output, &reference, |r, w| {
                writeln!(w, "removed reference {} to item {}", r.id, r.rank_item_id)
            })
        }
    }
}
