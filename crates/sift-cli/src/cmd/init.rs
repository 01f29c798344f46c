use crate::output::{OutputMode, render_success};
use anyhow::{Context as _, Result};
use clap::Args;
use sift_core::config::{self, SIFT_DIR};
use std::path::Path;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Rewrite the config template even if `.sift/` already exists.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "[store]\n\
    path = \".sift/sift.sqlite3\"\n\
    \n\
    [query]\n\
    page_size = 50\n\
    max_page_size = 500\n\
    order_by = \"updated\"\n\
    direction = \"descending\"\n";

const GITIGNORE: &str = "sift.sqlite3\nsift.sqlite3-wal\nsift.sqlite3-shm\n";

/// Execute `sift init`. Creates:
///
/// ```text
/// .sift/
///   config.toml    (default project config template)
///   .gitignore     (store files)
///   sift.sqlite3   (migrated store)
/// ```
///
/// # Errors
///
/// Returns an error if `.sift/` already exists and `--force` is not set, or if
/// any filesystem or store operation fails.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let sift_dir = project_root.join(SIFT_DIR);

    if sift_dir.exists() && !args.force {
        anyhow::bail!("{SIFT_DIR}/ already exists. Use `sift init --force` to reinitialize.");
    }

    std::fs::create_dir_all(&sift_dir)
        .with_context(|| format!("Failed to create {}", sift_dir.display()))?;
    std::fs::write(sift_dir.join("config.toml"), CONFIG_TOML)
        .context("Failed to write config.toml")?;
    std::fs::write(sift_dir.join(".gitignore"), GITIGNORE).context("Failed to write .gitignore")?;

    let project = config::load_project_config(project_root)?;
    let store_path = project.store_path(project_root);
    sift_core::db::open_store(&store_path)?;

    tracing::info!(path = %store_path.display(), "initialized sift project");
    render_success(
        output,
        &format!("initialized {} in {}", SIFT_DIR, project_root.display()),
    )
}
