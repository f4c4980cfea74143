//! Command dispatch and handlers

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, info, instrument};

use crate::application::services::{BuildRequest, FindRequest, FlattenRequest, ForestService};
use crate::cli::args::{Cli, Commands, ConfigCommands, KeyArgs};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings, CONFIG_TEMPLATE};
use crate::domain::Node;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::{InfraError, InfraResult};

/// Marker for reading input from stdin.
const STDIN_MARKER: &str = "-";

/// Execute the CLI command.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let config_dir = resolve_config_dir(cli)?;
    let container = create_container(cli, &config_dir)?;

    if let Commands::Config { command } = command {
        return execute_config(command, &container, &config_dir);
    }

    let mut stdin = io::stdin().lock();
    if let Some(rendered) = render_command(command, &container, &mut stdin)? {
        output::info(&rendered);
    }
    Ok(())
}

fn resolve_config_dir(cli: &Cli) -> InfraResult<PathBuf> {
    match &cli.config_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir()
            .map_err(|e| InfraError::io("determine current directory", e)),
    }
}

/// Load settings and apply global output flags.
fn create_container(cli: &Cli, config_dir: &Path) -> CliResult<ServiceContainer> {
    let mut settings = Settings::load(Some(config_dir))?;
    if cli.compact {
        settings.output.pretty = false;
    }
    debug!("settings: {:?}", settings);
    Ok(ServiceContainer::new(settings))
}

/// Run a data command and return what it prints.
///
/// `stdin` is consumed when the input file is `-`. Returns `None` for
/// commands without data output.
#[instrument(level = "debug", skip(container, stdin))]
pub fn render_command(
    command: &Commands,
    container: &ServiceContainer,
    stdin: &mut dyn Read,
) -> CliResult<Option<String>> {
    let service = container.forest_service();
    match command {
        Commands::Build {
            file,
            root,
            keys,
            leaf_flag,
            forward,
            max_depth,
        } => {
            let records = read_input(&service, file, stdin)?;
            let request = build_request(root, keys, leaf_flag, *forward, *max_depth);
            let forest = service.build(&records, &request)?;
            info!("built {} root(s) from {} record(s)", forest.len(), records.len());
            Ok(Some(service.to_json(&forest)?))
        }
        Commands::Flatten {
            file,
            children_key,
            forward,
        } => {
            let forest = read_input(&service, file, stdin)?;
            let request = FlattenRequest {
                children_key: children_key.clone(),
                forward: *forward,
            };
            let flat = service.flatten(&forest, &request);
            info!("flattened into {} record(s)", flat.len());
            Ok(Some(service.to_json(&flat)?))
        }
        Commands::Find {
            file,
            value,
            key,
            children_key,
        } => {
            let forest = read_input(&service, file, stdin)?;
            let request = FindRequest {
                key: key.clone(),
                value: value.clone(),
                children_key: children_key.clone(),
            };
            match service.find(&forest, &request) {
                Some(node) => Ok(Some(service.to_json(node)?)),
                None => {
                    let key = key
                        .as_deref()
                        .unwrap_or(&container.settings.keys.current_key);
                    Err(CliError::NotFound(format!("{}={}", key, value)))
                }
            }
        }
        Commands::Show {
            file,
            label,
            children_key,
        } => {
            let forest = read_input(&service, file, stdin)?;
            let rendered = service.render(&forest, label.as_deref(), children_key.as_deref());
            Ok(Some(rendered.trim_end().to_string()))
        }
        Commands::Config { .. } | Commands::Completion { .. } => Ok(None),
    }
}

fn build_request(
    root: &Option<String>,
    keys: &KeyArgs,
    leaf_flag: &Option<String>,
    forward: bool,
    max_depth: Option<usize>,
) -> BuildRequest {
    BuildRequest {
        root: root.clone(),
        parent_key: keys.parent_key.clone(),
        children_key: keys.children_key.clone(),
        current_key: keys.current_key.clone(),
        leaf_flag: leaf_flag.clone(),
        forward,
        max_depth,
    }
}

fn read_input(service: &ForestService, file: &Path, stdin: &mut dyn Read) -> CliResult<Vec<Node>> {
    if file.as_os_str() == STDIN_MARKER {
        let content = read_stdin(stdin)?;
        return Ok(service.parse_records(&content, "<stdin>")?);
    }
    Ok(service.load_records(file)?)
}

fn read_stdin(stdin: &mut dyn Read) -> InfraResult<String> {
    let mut content = String::new();
    stdin
        .read_to_string(&mut content)
        .map_err(|e| InfraError::io("read stdin", e))?;
    Ok(content)
}

// ============================================================
// Config commands
// ============================================================

fn execute_config(
    command: &ConfigCommands,
    container: &ServiceContainer,
    config_dir: &Path,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            output::header("Config paths");
            match global_config_path() {
                Some(path) => {
                    let exists = container.fs.exists(&path);
                    output::path_status("global", &path, exists);
                }
                None => output::warning("no home directory, global config disabled"),
            }
            let local = local_config_path(config_dir);
            output::path_status("local", &local, container.fs.exists(&local));
            Ok(())
        }
        ConfigCommands::Init { global, force } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".into())
                })?
            } else {
                local_config_path(config_dir)
            };
            let created = init_config(container, &path, *force)?;
            output::success(&format!("Created {}", created.display()));
            Ok(())
        }
    }
}

/// Write the config template to `path`; existing files need `force`.
pub fn init_config(container: &ServiceContainer, path: &Path, force: bool) -> CliResult<PathBuf> {
    let fs = &container.fs;
    if fs.exists(path) && !force {
        return Err(CliError::Usage(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    write_template(container, path)?;
    debug!("init_config: wrote {}", path.display());
    Ok(path.to_path_buf())
}

fn write_template(container: &ServiceContainer, path: &Path) -> InfraResult<()> {
    let fs = &container.fs;
    fs.ensure_parent(path)
        .map_err(|e| InfraError::io(format!("create parent of {}", path.display()), e))?;
    fs.write(path, CONFIG_TEMPLATE)
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))
}
