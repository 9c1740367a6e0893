//! `t11 item`: add, edit and delete ranked items.

use anyhow::Result;
use clap::{Args, Subcommand};
use topeleven_core::access::{Owned, ensure_owner};
use topeleven_core::catalog;
use topeleven_core::convert::delete_item;
use topeleven_core::error::ErrorCode;
use topeleven_core::model::{ItemContent, ItemPatch};

use super::{CmdContext, ListTarget, slot_label};
use crate::output::{CliError, pretty_kv, render, render_mode};

#[derive(Subcommand, Debug)]
pub enum ItemCommand {
    #[command(
        about = "Add an item to a list",
        long_about = "Add an item directly to a sub or main category list. Without --position \
                      the lowest free slot is used.",
        after_help = "EXAMPLES:\n    # Auto-place in a sub category\n    t11 item add --sub 2 \"Rio Bravo\"\n\n    # Explicit slot in a main category\n    t11 item add --main 1 \"Heat\" --position 3"
    )]
    Add(AddArgs),

    #[command(
        about = "Edit an item's content",
        after_help = "EXAMPLES:\n    t11 item edit 7 --title \"Rio Bravo (1959)\" --clear-url"
    )]
    Edit(EditArgs),

    #[command(
        about = "Delete an item",
        long_about = "Delete an item. Every reference to it becomes a standalone item in the \
                      referencing main category at the reference's position.",
        after_help = "EXAMPLES:\n    t11 item rm 7"
    )]
    Rm {
        /// Item id.
        id: i64,
    },
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[command(flatten)]
    pub target: ListTarget,

    /// Item title.
    pub title: String,

    /// Longer description.
    #[arg(long)]
    pub description: Option<String>,

    /// Link for the item.
    #[arg(long)]
    pub url: Option<String>,

    /// Image locator; repeat for several.
    #[arg(long = "image", value_name = "LOCATOR")]
    pub images: Vec<String>,

    /// Slot 1..=11. Omit to take the lowest free slot.
    #[arg(long, allow_negative_numbers = true)]
    pub position: Option<i64>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Item id.
    pub id: i64,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, conflicts_with = "clear_description")]
    pub description: Option<String>,

    #[arg(long)]
    pub clear_description: bool,

    #[arg(long, conflicts_with = "clear_url")]
    pub url: Option<String>,

    #[arg(long)]
    pub clear_url: bool,

    /// Replace the image list; repeat for several.
    #[arg(long = "image", value_name = "LOCATOR", conflicts_with = "clear_images")]
    pub images: Vec<String>,

    #[arg(long)]
    pub clear_images: bool,
}

impl EditArgs {
    fn patch(&self) -> ItemPatch {
        let optional = |value: &Option<String>, clear: bool| {
            if clear {
                Some(None)
            } else {
                value.clone().map(Some)
            }
        };
        ItemPatch {
            title: self.title.clone(),
            description: optional(&self.description, self.clear_description),
            url: optional(&self.url, self.clear_url),
            images: if self.clear_images {
                Some(Vec::new())
            } else if self.images.is_empty() {
                None
            } else {
                Some(self.images.clone())
            },
        }
    }
}

/// Execute one `t11 item` subcommand.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, the owner check fails, or
/// the core operation is rejected.
pub fn run_item(command: &ItemCommand, ctx: &CmdContext<'_>) -> Result<()> {
    let (config, mut store) = ctx.open()?;
    let owner = ctx.require_owner(&config)?;

    match command {
        ItemCommand::Add(args) => {
            let list = args.target.list()?;
            ctx.check(ensure_owner(store.conn(), Owned::from(list), &owner))?;
            let content = ItemContent {
                title: args.title.clone(),
                description: args.description.clone(),
                url: args.url.clone(),
                images: args.images.clone(),
            };
            let item = ctx.check(catalog::create_item(
                &mut store,
                list,
                &content,
                &owner,
                args.position,
            ))?;
            render_mode(
                ctx.output,
                &item,
                |i, w| writeln!(w, "{}\t{}\t{}", i.id, slot_label(i.position), i.title),
                |i, w| {
                    writeln!(w, "Added item {} to {list}", i.id)?;
                    pretty_kv(w, "title", &i.title)?;
                    pretty_kv(w, "position", slot_label(i.position))
                },
            )
        }
        ItemCommand::Edit(args) => {
            let patch = args.patch();
            if patch.is_empty() {
                return Err(ctx.fail(&CliError::with_details(
                    "nothing to edit",
                    "Pass at least one of --title, --description, --url, --image or a --clear-* flag",
                    ErrorCode::InvalidField.code(),
                )));
            }
            ctx.check(ensure_owner(store.conn(), Owned::Item(args.id), &owner))?;
            let item = ctx.check(catalog::update_item(&mut store, args.id, &patch))?;
            render(ctx.output, &item, |i, w| {
                writeln!(w, "updated item {} \"{}\"", i.id, i.title)
            })
        }
        ItemCommand::Rm { id } => {
            ctx.check(ensure_owner(store.conn(), Owned::Item(*id), &owner))?;
            let outcome = ctx.check(delete_item(&mut store, *id))?;
            render(ctx.output, &outcome, |o, w| {
                writeln!(w, "deleted item {} \"{}\"", o.deleted.id, o.deleted.title)?;
                for converted in &o.converted {
                    writeln!(
                        w,
                        "  reference {} -> item {} in main category {} at {}",
                        converted.reference_id,
                        converted.new_item_id,
                        converted.main_category_id,
                        slot_label(converted.position)
                    )?;
                }
                Ok(())
            })
        }
    }
}
