//! `sift items`, `sift count`, `sift query`: run filters against the store.

use crate::cmd::{SelectionArgs, open_project_store, require_requester};
use crate::output::{OutputMode, Renderable, pretty_kv, pretty_section, render_list, render_mode};
use anyhow::Result;
use clap::Args;
use rusqlite::Connection;
use serde::Serialize;
use sift_core::config::EffectiveConfig;
use sift_core::db::filters;
use sift_core::db::items::{self, Page, QueryItem, Requester};
use sift_core::model::{Direction, OrderBy};
use sift_core::{CompiledQuery, Filter, SqliteDialect};
use std::io::{self, Write};
use std::path::Path;

#[derive(Args, Debug, Clone, Default)]
pub struct PageArgs {
    /// Skip this many matching items.
    #[arg(long, default_value_t = 0)]
    pub offset: u32,

    /// Return at most this many items (defaults to `query.page_size`).
    #[arg(long)]
    pub limit: Option<u32>,

    /// Order by id, title, state, type, node, created, or updated.
    #[arg(long, value_name = "PROPERTY")]
    pub order_by: Option<OrderBy>,

    /// ascending or descending.
    #[arg(long, value_name = "DIRECTION")]
    pub direction: Option<Direction>,

    /// Only show items of the project currently being browsed.
    #[arg(long = "in-project", value_name = "ID")]
    pub in_project: Option<String>,
}

impl PageArgs {
    fn page(&self, config: &EffectiveConfig) -> Page {
        let query = &config.project.query;
        Page {
            offset: self.offset,
            limit: Some(query.effective_limit(self.limit)),
            order_by: self.order_by.unwrap_or(query.order_by),
            direction: self.direction.unwrap_or(query.direction),
        }
    }
}

#[derive(Args, Debug)]
pub struct ItemsArgs {
    /// Saved filter name.
    pub name: String,

    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Args, Debug)]
pub struct CountArgs {
    /// Saved filter name.
    pub name: String,

    /// Only count items of the project currently being browsed.
    #[arg(long = "in-project", value_name = "ID")]
    pub in_project: Option<String>,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    #[command(flatten)]
    pub page: PageArgs,
}

impl Renderable for QueryItem {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_section(w, &format!("{}  {}", self.item_id, self.title))?;
        pretty_kv(w, "project", &self.project_id)?;
        pretty_kv(w, "state", self.state.as_str())?;
        pretty_kv(w, "type", &self.item_type)?;
        pretty_kv(w, "node", &self.workflow_node)?;
        pretty_kv(w, "responsible", self.responsible_id.as_deref().unwrap_or("-"))?;
        writeln!(w)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}  {}  {}  {}",
            self.item_id,
            self.state,
            self.item_type,
            self.workflow_node,
            self.responsible_id.as_deref().unwrap_or("-"),
            self.title
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["id", "state", "type", "node", "responsible", "title"]
    }
}

#[derive(Debug, Serialize)]
struct ItemCount<'a> {
    filter: &'a str,
    count: u64,
}

/// Execute `sift items <name>`.
///
/// # Errors
///
/// Returns an error if the filter is unknown or execution fails.
pub fn run_items(
    args: &ItemsArgs,
    config: &EffectiveConfig,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let conn = open_project_store(project_root, config)?;
    let (filter, requester) = saved_filter(&conn, config, &args.name)?;

    let found = run_compiled(&conn, &requester, &filter.compiled_query, &args.page, config)?;
    render_list(&found, output)
}

/// Execute `sift count <name>`.
///
/// # Errors
///
/// Returns an error if the filter is unknown or execution fails.
pub fn run_count(
    args: &CountArgs,
    config: &EffectiveConfig,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let conn = open_project_store(project_root, config)?;
    let (filter, requester) = saved_filter(&conn, config, &args.name)?;

    let count = items::count_items(
        &conn,
        &requester,
        args.in_project.as_deref(),
        &filter.compiled_query,
    )?;
    render_mode(
        output,
        &ItemCount {
            filter: &filter.name,
            count,
        },
        |value, w| writeln!(w, "{}", value.count),
        |value, w| writeln!(w, "{} item(s) match '{}'", value.count, value.filter),
    )
}

/// Execute `sift query`: compile an ad-hoc filter and run it without saving.
///
/// Without a requesting user the filter is compiled for an anonymous viewer
/// and only public projects are searched.
///
/// # Errors
///
/// Returns an error if the selection is invalid or execution fails.
pub fn run_query(
    args: &QueryArgs,
    config: &EffectiveConfig,
    output: OutputMode,
    project_root: &Path,
) -> Result<()> {
    let conn = open_project_store(project_root, config)?;
    let requester = match config.requester.as_deref() {
        Some(user_id) => Requester::load(&conn, user_id)?,
        None => Requester::anonymous(),
    };

    let selection = args.selection.to_selection();
    requester.check_selected_projects(&conn, &selection.projects)?;

    let filter = Filter::create(
        requester.user_id.as_deref(),
        "ad hoc",
        &selection,
        &SqliteDialect,
    )?;
    let found = run_compiled(&conn, &requester, &filter.compiled_query, &args.page, config)?;
    render_list(&found, output)
}

fn saved_filter(
    conn: &Connection,
    config: &EffectiveConfig,
    name: &str,
) -> Result<(Filter, Requester)> {
    let owner = require_requester(config)?;
    let filter = filters::find_filter_by_name(conn, owner, name)?;
    let requester = Requester::load(conn, owner)?;
    Ok((filter, requester))
}

fn run_compiled(
    conn: &Connection,
    requester: &Requester,
    compiled: &CompiledQuery,
    page: &PageArgs,
    config: &EffectiveConfig,
) -> Result<Vec<QueryItem>> {
    Ok(items::find_items(
        conn,
        requester,
        page.in_project.as_deref(),
        compiled,
        &page.page(config),
    )?)
}
