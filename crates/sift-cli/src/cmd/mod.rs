pub mod completions;
pub mod filter;
pub mod init;
pub mod items;

use anyhow::Result;
use clap::Args;
use rusqlite::Connection;
use sift_core::config::{EffectiveConfig, SIFT_DIR};
use sift_core::model::ItemState;
use sift_core::{ErrorCode, FilterSelection};
use std::path::Path;

use crate::output::CodedError;

/// Per-axis criteria shared by every command that builds a filter.
///
/// List flags accept repeated use or comma-separated values. Each `--not-*`
/// switch negates its axis; it has no effect when the axis is unconstrained.
#[derive(Args, Debug, Default, Clone)]
pub struct SelectionArgs {
    /// Restrict to these project ids.
    #[arg(long = "project", value_name = "ID", value_delimiter = ',')]
    pub projects: Vec<String>,

    /// Exclude the --project ids instead.
    #[arg(long)]
    pub not_project: bool,

    /// Restrict to these states (created, open, closed, blocked).
    #[arg(long = "state", value_name = "STATE", value_delimiter = ',')]
    pub states: Vec<ItemState>,

    /// Exclude the --state values instead.
    #[arg(long)]
    pub not_state: bool,

    /// Match a single item id exactly.
    #[arg(long = "id", value_name = "ITEM_ID")]
    pub item_id: Option<String>,

    /// Restrict to items assigned to these users.
    #[arg(long = "responsible", value_name = "USER", value_delimiter = ',')]
    pub responsibles: Vec<String>,

    /// Exclude the --responsible users instead (unassigned items match).
    #[arg(long)]
    pub not_responsible: bool,

    /// Restrict to these item types.
    #[arg(long = "type", value_name = "TYPE", value_delimiter = ',')]
    pub item_types: Vec<String>,

    /// Exclude the --type values instead.
    #[arg(long)]
    pub not_type: bool,

    /// Restrict to these workflow nodes.
    #[arg(long = "node", value_name = "NODE", value_delimiter = ',')]
    pub nodes: Vec<String>,

    /// Exclude the --node values instead.
    #[arg(long)]
    pub not_node: bool,

    /// Match text in title or description.
    #[arg(long)]
    pub text: Option<String>,
}

impl SelectionArgs {
    pub fn to_selection(&self) -> FilterSelection {
        FilterSelection {
            projects: self.projects.clone(),
            negate_projects: self.not_project,
            states: self.states.clone(),
            negate_states: self.not_state,
            item_id: self.item_id.clone(),
            responsibles: self.responsibles.clone(),
            negate_responsibles: self.not_responsible,
            item_types: self.item_types.clone(),
            negate_item_types: self.not_type,
            nodes: self.nodes.clone(),
            negate_nodes: self.not_node,
            text: self.text.clone(),
        }
    }
}

/// Open the project's store, failing with `E1001` if `sift init` never ran.
pub fn open_project_store(project_root: &Path, config: &EffectiveConfig) -> Result<Connection> {
    if !project_root.join(SIFT_DIR).is_dir() {
        return Err(CodedError::new(
            ErrorCode::NotInitialized,
            format!("no {SIFT_DIR}/ directory in {}", project_root.display()),
        )
        .into());
    }
    sift_core::db::open_store(&config.project.store_path(project_root))
}

/// The requesting user, failing with `E1003` when none is configured.
pub fn require_requester(config: &EffectiveConfig) -> Result<&str> {
    config.requester.as_deref().ok_or_else(|| {
        CodedError::new(ErrorCode::MissingRequester, "no requesting user configured").into()
    })
}
