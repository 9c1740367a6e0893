//! `t11 category`: create, delete and list main and sub categories.

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use std::io::Write;
use topeleven_core::access::{Owned, ensure_owner};
use topeleven_core::catalog;
use topeleven_core::db::query;
use topeleven_core::model::{MainCategory, SubCategory};

use super::CmdContext;
use crate::output::{pretty_kv, pretty_section, render, render_mode};

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    #[command(
        about = "Create a main category",
        after_help = "EXAMPLES:\n    t11 category add-main \"Movies\""
    )]
    AddMain {
        /// Display name.
        name: String,
    },

    #[command(
        about = "Create a sub category under a main category",
        after_help = "EXAMPLES:\n    t11 category add-sub --main 1 \"Westerns\""
    )]
    AddSub {
        /// Parent main category id.
        #[arg(long, value_name = "ID")]
        main: i64,

        /// Display name.
        name: String,
    },

    #[command(
        about = "Delete a main category and everything under it",
        after_help = "EXAMPLES:\n    t11 category rm-main 1"
    )]
    RmMain {
        /// Main category id.
        id: i64,
    },

    #[command(
        about = "Delete a sub category and its items",
        after_help = "EXAMPLES:\n    t11 category rm-sub 4"
    )]
    RmSub {
        /// Sub category id.
        id: i64,
    },

    #[command(
        about = "List categories",
        after_help = "EXAMPLES:\n    # Every main category with its sub categories\n    t11 category list\n\n    # Only categories you own\n    t11 category list --mine"
    )]
    List {
        /// Only this main category.
        #[arg(long, value_name = "ID")]
        main: Option<i64>,

        /// Only categories owned by the acting owner.
        #[arg(long)]
        mine: bool,
    },
}

#[derive(Debug, Serialize)]
struct CategoryTree {
    #[serde(flatten)]
    main: MainCategory,
    sub_categories: Vec<SubCategory>,
}

/// Execute one `t11 category` subcommand.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, the owner check fails, or
/// the core operation is rejected.
pub fn run_category(command: &CategoryCommand, ctx: &CmdContext<'_>) -> Result<()> {
    let (config, mut store) = ctx.open()?;

    match command {
        CategoryCommand::AddMain { name } => {
            let owner = ctx.require_owner(&config)?;
            let created = ctx.check(catalog::create_main_category(&mut store, name, &owner))?;
            render(ctx.output, &created, |c, w| {
                writeln!(w, "created main category {} \"{}\"", c.id, c.name)
            })
        }
        CategoryCommand::AddSub { main, name } => {
            let owner = ctx.require_owner(&config)?;
            ctx.check(ensure_owner(store.conn(), Owned::MainCategory(*main), &owner))?;
            let created =
                ctx.check(catalog::create_sub_category(&mut store, *main, name, &owner))?;
            render(ctx.output, &created, |c, w| {
                writeln!(
                    w,
                    "created sub category {} \"{}\" in main category {}",
                    c.id, c.name, c.main_category_id
                )
            })
        }
        CategoryCommand::RmMain { id } => {
            let owner = ctx.require_owner(&config)?;
            ctx.check(ensure_owner(store.conn(), Owned::MainCategory(*id), &owner))?;
            let deleted = ctx.check(catalog::delete_main_category(&mut store, *id))?;
            render(ctx.output, &deleted, |c, w| {
                writeln!(w, "deleted main category {} \"{}\"", c.id, c.name)
            })
        }
        CategoryCommand::RmSub { id } => {
            let owner = ctx.require_owner(&config)?;
            ctx.check(ensure_owner(store.conn(), Owned::SubCategory(*id), &owner))?;
            let deleted = ctx.check(catalog::delete_sub_category(&mut store, *id))?;
            render(ctx.output, &deleted, |c, w| {
                writeln!(w, "deleted sub category {} \"{}\"", c.id, c.name)
            })
        }
        CategoryCommand::List { main, mine } => {
            let owner = if *mine {
                Some(ctx.require_owner(&config)?)
            } else {
                None
            };
            let mains = match main {
                Some(id) => vec![ctx.check(query::require_main_category(store.conn(), *id))?],
                None => ctx.check(query::list_main_categories(store.conn(), owner.as_deref()))?,
            };

            let mut trees = Vec::with_capacity(mains.len());
            for main in mains {
                let sub_categories = ctx.check(query::list_sub_categories(store.conn(), main.id))?;
                trees.push(CategoryTree {
                    main,
                    sub_categories,
                });
            }

            render_mode(ctx.output, &trees, render_text, render_pretty)
        }
    }
}

fn render_text(trees: &Vec<CategoryTree>, w: &mut dyn Write) -> std::io::Result<()> {
    for tree in trees {
        writeln!(w, "main\t{}\t{}\t{}", tree.main.id, tree.main.owner, tree.main.name)?;
        for sub in &tree.sub_categories {
            writeln!(w, "sub\t{}\t{}\t{}", sub.id, sub.owner, sub.name)?;
        }
    }
    Ok(())
}

fn render_pretty(trees: &Vec<CategoryTree>, w: &mut dyn Write) -> std::io::Result<()> {
    if trees.is_empty() {
        return writeln!(w, "No categories. Create one with `t11 category add-main`.");
    }
    for tree in trees {
        pretty_section(w, &format!("[{}] {}", tree.main.id, tree.main.name))?;
        pretty_kv(w, "owner", &tree.main.owner)?;
        if tree.sub_categories.is_empty() {
            writeln!(w, "  (no sub categories)")?;
        }
        for sub in &tree.sub_categories {
            writeln!(w, "  [{}] {}", sub.id, sub.name)?;
        }
        writeln!(w)?;
    }
    Ok(())
}
