//! `sift filter`: author, edit, and manage saved filters.

use crate::cmd::{SelectionArgs, open_project_store, require_requester};
use crate::output::{
    OutputMode, Renderable, pretty_kv, pretty_section, render_item, render_list, render_success,
};
use anyhow::{Context as _, Result};
use chrono::{DateTime, Local, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use sift_core::config::EffectiveConfig;
use sift_core::db::filters;
use sift_core::db::items::Requester;
use sift_core::{Filter, FilterError, FilterSelection, SqliteDialect};
use std::io::{self, Write};
use std::path::Path;

#[derive(Subcommand, Debug)]
pub enum FilterCommand {
    #[command(
        about = "Create and save a filter",
        after_help = "EXAMPLES:\n    # Open or blocked bugs\n    sift filter create triage --state open,blocked --type Bug\n\n    # Everything not assigned to alice\n    sift filter create others --responsible alice --not-responsible"
    )]
    Create(FilterEditArgs),

    #[command(
        about = "Recompile a saved filter",
        long_about = "Replace every criterion of a saved filter with the given flags.\n\
                      Axes not mentioned become unconstrained.",
        after_help = "EXAMPLES:\n    # Narrow to closed items\n    sift filter edit triage --state closed"
    )]
    Edit(FilterEditArgs),

    #[command(about = "Show one saved filter")]
    Show(FilterNameArgs),

    #[command(about = "List saved filters")]
    List(FilterListArgs),

    #[command(about = "Delete a saved filter")]
    Delete(FilterNameArgs),

    #[command(about = "Flag a saved filter as favorite")]
    Favorite(FilterFavoriteArgs),
}

#[derive(Args, Debug)]
pub struct FilterEditArgs {
    /// Filter name (unique per user).
    pub name: String,

    #[command(flatten)]
    pub selection: SelectionArgs,
}

#[derive(Args, Debug)]
pub struct FilterNameArgs {
    /// Filter name.
    pub name: String,
}

#[derive(Args, Debug)]
pub struct FilterListArgs {
    /// Only list favorites.
    #[arg(long)]
    pub favorites: bool,
}

#[derive(Args, Debug)]
pub struct FilterFavoriteArgs {
    /// Filter name.
    pub name: String,

    /// Remove the favorite flag instead.
    #[arg(long)]
    pub off: bool,
}

/// A saved filter as shown to users.
#[derive(Debug, Serialize)]
pub struct FilterView {
    pub id: String,
    pub name: String,
    pub owner: Option<String>,
    pub favorite: bool,
    pub compiled_query: String,
    pub selection: FilterSelection,
    pub created_at_us: i64,
    pub updated_at_us: i64,
}

impl FilterView {
    fn from_filter(filter: &Filter) -> Result<Self, FilterError> {
        Ok(Self {
            id: filter.id.clone(),
            name: filter.name.clone(),
            owner: filter.owner.clone(),
            favorite: filter.favorite,
            compiled_query: filter.compiled_query.to_string(),
            selection: filter.selection()?,
            created_at_us: filter.created_at_us,
            updated_at_us: filter.updated_at_us,
        })
    }
}

impl Renderable for FilterView {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let star = if self.favorite { " ★" } else { "" };
        pretty_section(w, &format!("Filter {}{star}", self.name))?;
        pretty_kv(w, "id", &self.id)?;
        let s = &self.selection;
        pretty_kv(w, "project", describe(&s.projects, s.negate_projects))?;
        let states: Vec<String> = s.states.iter().map(ToString::to_string).collect();
        pretty_kv(w, "state", describe(&states, s.negate_states))?;
        pretty_kv(w, "id match", s.item_id.as_deref().unwrap_or("any"))?;
        pretty_kv(w, "responsible", describe(&s.responsibles, s.negate_responsibles))?;
        pretty_kv(w, "type", describe(&s.item_types, s.negate_item_types))?;
        pretty_kv(w, "node", describe(&s.nodes, s.negate_nodes))?;
        pretty_kv(w, "text", s.text.as_deref().unwrap_or("any"))?;
        pretty_kv(w, "updated", micros_to_local_datetime(self.updated_at_us))?;
        writeln!(w)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}  {}",
            self.id,
            self.name,
            if self.favorite { "yes" } else { "no" },
            self.compiled_query.trim_start()
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["id", "name", "favorite", "query"]
    }
}

fn describe(values: &[String], negate: bool) -> String {
    if values.is_empty() {
        "any".to_string()
    } else if negate {
        format!("not {}", values.join(", "))
    } else {
        values.join(", ")
    }
}

fn micros_to_local_datetime(us: i64) -> String {
    DateTime::<Utc>::from_timestamp_micros(us).map_or_else(
        || us.to_string(),
        |ts| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// Execute `sift filter <subcommand>`.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, the requester is unknown,
/// or the underlying filter operation fails.
pub fn run_filter(
    command: &FilterCommand,
    config: &EffectiveConfig,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let conn = open_project_store(project_root, config)?;

    match command {
        FilterCommand::Create(args) => {
            let owner = require_requester(config)?;
            let selection = args.selection.to_selection();
            Requester::load(&conn, owner)?.check_selected_projects(&conn, &selection.projects)?;

            let filter = Filter::create(Some(owner), &args.name, &selection, &SqliteDialect)?;
            filters::insert_filter(&conn, &filter)?;
            render_item(&FilterView::from_filter(&filter)?, output)
        }
        FilterCommand::Edit(args) => {
            let owner = require_requester(config)?;
            let selection = args.selection.to_selection();
            Requester::load(&conn, owner)?.check_selected_projects(&conn, &selection.projects)?;

            let mut filter = filters::find_filter_by_name(&conn, owner, &args.name)?;
            filter
                .apply(&selection, &SqliteDialect)
                .with_context(|| format!("recompile filter '{}'", filter.name))?;
            filters::update_filter(&conn, &filter)?;
            render_item(&FilterView::from_filter(&filter)?, output)
        }
        FilterCommand::Show(args) => {
            let owner = require_requester(config)?;
            let filter = filters::find_filter_by_name(&conn, owner, &args.name)?;
            render_item(&FilterView::from_filter(&filter)?, output)
        }
        FilterCommand::List(args) => {
            let owner = require_requester(config)?;
            let found = if args.favorites {
                filters::list_favorite_filters(&conn, owner)?
            } else {
                filters::list_filters(&conn, owner)?
            };
            let views = found
                .iter()
                .map(FilterView::from_filter)
                .collect::<Result<Vec<_>, _>>()?;
            render_list(&views, output)
        }
        FilterCommand::Delete(args) => {
            let owner = require_requester(config)?;
            let filter = filters::find_filter_by_name(&conn, owner, &args.name)?;
            filters::delete_filter(&conn, &filter.id)?;
            render_success(output, &format!("deleted filter '{}'", filter.name))
        }
        FilterCommand::Favorite(args) => {
            let owner = require_requester(config)?;
            let filter = filters::find_filter_by_name(&conn, owner, &args.name)?;
            filters::set_favorite(&conn, &filter.id, !args.off)?;
            let verb = if args.off { "unfavorited" } else { "favorited" };
            render_success(output, &format!("{verb} filter '{}'", filter.name))
        }
    }
}
