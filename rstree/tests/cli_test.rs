//! Tests for argument parsing, command output and exit codes

use std::io::Cursor;

use clap::Parser;
use serde_json::{json, Value};
use tempfile::TempDir;

use rstree::application::ApplicationError;
use rstree::cli::args::{Cli, Commands, ConfigCommands};
use rstree::cli::commands::{init_config, render_command};
use rstree::cli::CliError;
use rstree::config::{local_config_path, Settings, CONFIG_TEMPLATE};
use rstree::domain::DomainError;
use rstree::exitcode;
use rstree::infrastructure::di::ServiceContainer;
use rstree::infrastructure::InfraError;

const FLAT: &str = r#"[
  {"id": 1, "parentId": 0},
  {"id": 2, "parentId": 1},
  {"id": 3, "parentId": 1},
  {"id": 4, "parentId": 2}
]"#;

fn parse(args: &[&str]) -> Commands {
    let cli = Cli::try_parse_from(args).expect("valid arguments");
    cli.command.expect("subcommand")
}

fn compact_container() -> ServiceContainer {
    let mut settings = Settings::default();
    settings.output.pretty = false;
    ServiceContainer::new(settings)
}

fn run_stdin(args: &[&str], input: &str) -> Result<Option<String>, CliError> {
    let command = parse(args);
    render_command(&command, &compact_container(), &mut Cursor::new(input.to_string()))
}

#[test]
fn given_build_args_when_parsing_then_fields_populated() {
    let command = parse(&[
        "rstree",
        "build",
        "data.json",
        "--root",
        "-1",
        "--parent-key",
        "pid",
        "--leaf-flag",
        "isLeaf",
        "--forward",
        "--max-depth",
        "8",
    ]);

    match command {
        Commands::Build {
            root,
            keys,
            leaf_flag,
            forward,
            max_depth,
            ..
        } => {
            assert_eq!(root.as_deref(), Some("-1"));
            assert_eq!(keys.parent_key.as_deref(), Some("pid"));
            assert_eq!(keys.children_key, None);
            assert_eq!(leaf_flag.as_deref(), Some("isLeaf"));
            assert!(forward);
            assert_eq!(max_depth, Some(8));
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn given_global_flags_after_subcommand_when_parsing_then_accepted() {
    let cli = Cli::try_parse_from(["rstree", "show", "-", "-vv", "--compact"]).unwrap();

    assert_eq!(cli.verbose, 2);
    assert!(cli.compact);
}

#[test]
fn given_find_without_value_when_parsing_then_error() {
    assert!(Cli::try_parse_from(["rstree", "find", "tree.json"]).is_err());
}

#[test]
fn given_config_init_when_parsing_then_flags_populated() {
    match parse(&["rstree", "config", "init", "--force"]) {
        Commands::Config {
            command: ConfigCommands::Init { global, force },
        } => {
            assert!(!global);
            assert!(force);
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn given_flat_stdin_when_building_then_prints_forest() {
    // Act
    let out = run_stdin(&["rstree", "build", "-", "--root", "0"], FLAT)
        .unwrap()
        .unwrap();

    // Assert
    let forest: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(forest[0]["id"], json!(1));
    assert_eq!(forest[0]["checked"], json!(false));
    assert_eq!(forest[0]["children"][0]["children"][0]["id"], json!(4));
}

#[test]
fn given_forest_stdin_when_flattening_then_pre_order() {
    let forest = run_stdin(&["rstree", "build", "-", "--root", "0"], FLAT)
        .unwrap()
        .unwrap();

    let out = run_stdin(&["rstree", "flatten", "-"], &forest).unwrap().unwrap();

    let flat: Vec<Value> = serde_json::from_str(&out).unwrap();
    let ids: Vec<_> = flat.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(2), json!(4), json!(3)]);
    assert_eq!(flat[0]["children"], Value::Null);
}

#[test]
fn given_forest_stdin_when_finding_existing_id_then_prints_node() {
    let forest = run_stdin(&["rstree", "build", "-", "--root", "0"], FLAT)
        .unwrap()
        .unwrap();

    let out = run_stdin(&["rstree", "find", "-", "--value", "4"], &forest)
        .unwrap()
        .unwrap();

    assert_eq!(out, r#"{"id":4,"parentId":2}"#);
}

#[test]
fn given_forest_stdin_when_finding_unknown_id_then_not_found_exit_code() {
    let forest = run_stdin(&["rstree", "build", "-", "--root", "0"], FLAT)
        .unwrap()
        .unwrap();

    let err = run_stdin(&["rstree", "find", "-", "--value", "99"], &forest).unwrap_err();

    assert!(matches!(err, CliError::NotFound(_)));
    assert_eq!(err.to_string(), "no node with id=99");
    assert_eq!(err.exit_code(), exitcode::NOTFOUND);
}

#[test]
fn given_build_without_root_when_running_then_usage_exit_code() {
    let err = run_stdin(&["rstree", "build", "-"], FLAT).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::USAGE);
}

#[test]
fn given_invalid_json_when_running_then_data_error_exit_code() {
    let err = run_stdin(&["rstree", "flatten", "-"], "not json").unwrap_err();

    assert_eq!(err.exit_code(), exitcode::DATAERR);
}

#[test]
fn given_missing_file_when_running_then_no_input_exit_code() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.json");
    let command = parse(&["rstree", "show", missing.to_str().unwrap()]);

    let err = render_command(&command, &compact_container(), &mut Cursor::new(String::new()))
        .unwrap_err();

    assert_eq!(err.exit_code(), exitcode::NOINPUT);
}

#[test]
fn given_errors_of_each_layer_then_mapped_to_sysexits() {
    let depth: CliError = ApplicationError::Domain(DomainError::DepthExceeded { limit: 3 }).into();
    let config: CliError = ApplicationError::Config {
        message: "bad".into(),
    }
    .into();
    let io = CliError::Infra(InfraError::io(
        "read stdin",
        std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"),
    ));

    assert_eq!(depth.exit_code(), exitcode::SOFTWARE);
    assert_eq!(config.exit_code(), exitcode::CONFIG);
    assert_eq!(io.exit_code(), exitcode::IOERR);
}

#[test]
fn given_no_local_config_when_init_then_template_written() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = local_config_path(dir.path());
    let container = ServiceContainer::new(Settings::default());

    // Act
    let created = init_config(&container, &path, false).unwrap();

    // Assert
    assert_eq!(created, path);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);
}

#[test]
fn given_existing_config_when_init_without_force_then_refuses() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = local_config_path(dir.path());
    std::fs::write(&path, "[keys]\n").unwrap();
    let container = ServiceContainer::new(Settings::default());

    // Act
    let err = init_config(&container, &path, false).unwrap_err();

    // Assert
    assert_eq!(err.exit_code(), exitcode::USAGE);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[keys]\n");

    // force overwrites
    init_config(&container, &path, true).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);
}

#[test]
fn given_failed_read_when_mapping_then_only_missing_file_is_no_input() {
    let failed = |kind| -> CliError {
        ApplicationError::OperationFailed {
            context: "read records: data.json".into(),
            source: Box::new(std::io::Error::new(kind, "read failed")),
        }
        .into()
    };

    assert_eq!(
        failed(std::io::ErrorKind::NotFound).exit_code(),
        exitcode::NOINPUT
    );
    assert_eq!(
        failed(std::io::ErrorKind::PermissionDenied).exit_code(),
        exitcode::IOERR
    );
}

/// Reader that fails like a closed pipe.
struct BrokenStdin;

impl std::io::Read for BrokenStdin {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
    }
}

#[test]
fn given_unreadable_stdin_when_running_then_io_error_exit_code() {
    let command = parse(&["rstree", "flatten", "-"]);

    let err = render_command(&command, &compact_container(), &mut BrokenStdin).unwrap_err();

    assert!(matches!(err, CliError::Infra(InfraError::Io { .. })));
    assert_eq!(err.exit_code(), exitcode::IOERR);
}
