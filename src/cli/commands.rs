//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use generational_arena::Index;
use tracing::{debug, instrument};

use crate::arena::TreeArena;
use crate::builder::{BuildReport, TreeBuilder};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{self, OutputFormat, Settings};
use crate::record::{Record, RecordSet};
use crate::tree_traits::TreeNodeConvert;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let project_dir = cli
        .project_dir
        .clone()
        .or_else(|| std::env::current_dir().ok());
    let settings = Settings::load(project_dir.as_deref())?;
    debug!("settings: {:?}", settings);

    match &cli.command {
        Some(Commands::Show {
            file,
            root,
            format,
            keep_order,
        }) => show(
            &settings,
            file,
            root.as_deref(),
            format.unwrap_or(settings.format),
            *keep_order,
        ),
        Some(Commands::Move {
            file,
            node,
            parent,
            root,
            write,
        }) => move_node(&settings, file, node, parent, root.as_deref(), *write),
        Some(Commands::Config { command }) => config_cmd(&settings, command, project_dir),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Ok(()),
    }
}

/// Tree assembled from a record file.
struct Assembly {
    records: RecordSet,
    arena: TreeArena<Record>,
    root: Index,
    report: BuildReport,
}

#[instrument(level = "debug", skip(settings))]
fn assemble(
    settings: &Settings,
    file: &Path,
    root_id: Option<&str>,
    keep_order: bool,
) -> CliResult<Assembly> {
    let records = RecordSet::load(file)?;
    let codec = settings.codec();
    let root_record = records.root(root_id, &codec)?.clone();
    let candidates = records.descendants(&root_record, &codec, keep_order);

    let mut arena = TreeArena::with_codec(codec);
    let root = arena.insert_node(root_record);
    let report =
        TreeBuilder::with_orphan_policy(settings.orphans).build_tree(&mut arena, root, candidates)?;

    for &orphan in &report.orphans {
        let path = arena.path(orphan)?;
        output::warning(&format!(
            "{} ({}) has no parent in the input, attached to root",
            arena.get_node(orphan).map(|n| n.data.to_string()).unwrap_or_default(),
            path
        ));
    }

    Ok(Assembly {
        records,
        arena,
        root,
        report,
    })
}

#[instrument(level = "debug", skip(settings))]
fn show(
    settings: &Settings,
    file: &Path,
    root_id: Option<&str>,
    format: OutputFormat,
    keep_order: bool,
) -> CliResult<()> {
    let Assembly {
        arena,
        root,
        report,
        ..
    } = assemble(settings, file, root_id, keep_order)?;
    debug!("assembled {} nodes", report.linked.len() + 1);

    match format {
        OutputFormat::Tree => output::info(&arena.to_tree_string(root)),
        OutputFormat::Flat => {
            for (id, label) in arena.to_flat_array(root)?.iter() {
                output::info(&format!("{}\t{}", id, label));
            }
        }
        OutputFormat::Json => output::info(&arena.to_json(root)?),
    }
    Ok(())
}

#[instrument(level = "debug", skip(settings))]
fn move_node(
    settings: &Settings,
    file: &Path,
    node_id: &str,
    parent_id: &str,
    root_id: Option<&str>,
    write: bool,
) -> CliResult<()> {
    let Assembly {
        mut records,
        mut arena,
        ..
    } = assemble(settings, file, root_id, false)?;

    let node = arena
        .find_by_id(node_id)
        .ok_or_else(|| CliError::InvalidArgs(format!("node not in tree: {}", node_id)))?;
    let parent = arena
        .find_by_id(parent_id)
        .ok_or_else(|| CliError::InvalidArgs(format!("parent not in tree: {}", parent_id)))?;

    arena.set_child_of(node, parent)?;
    let changed = records.sync_paths(&arena);

    if write {
        records.save(file)?;
        output::success(&format!(
            "moved {} under {}: {} paths updated in {}",
            node_id,
            parent_id,
            changed,
            file.display()
        ));
    } else {
        let content = records.to_toml().map_err(|message| crate::errors::LoadError::Parse {
            path: file.to_path_buf(),
            message,
        })?;
        output::info(&content);
    }
    Ok(())
}

fn config_cmd(
    settings: &Settings,
    command: &ConfigCommands,
    project_dir: Option<PathBuf>,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            output::header("Config files");
            let describe = |path: PathBuf| {
                let state = if path.exists() { "found" } else { "missing" };
                format!("{} ({})", path.display(), state)
            };
            match config::global_config_path() {
                Some(path) => output::detail(&format!("global: {}", describe(path))),
                None => output::detail("global: <no config directory>"),
            }
            if let Some(dir) = project_dir {
                output::detail(&format!(
                    "local:  {}",
                    describe(config::local_config_path(&dir))
                ));
            }
        }
    }
    Ok(())
}
