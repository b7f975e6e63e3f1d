//! `KEY=VALUE` command-line arguments.

use odbx_post::ExportConfig;
use thiserror::Error;
use tracing::warn;

pub const USAGE: &str = "\
usage: odbx-cli <database.json> [KEY=VALUE ...]

keys:
  STEP_NAME=<name>     step to export (default: equ)
  FRAME=<int>          frame index, negative for the last frame (default: -1)
  NODESET=<name>       node set added to the boundary nodes
  OUTDIR=<dir>         output directory (default: .)
  SUFFIX=<bool>        append _<step>_<frame> to file names (default: 0)
  ACTIVE_ONLY=<bool>   write only the active sub-mesh (default: 0)
  VTK=<bool>           also write mesh<suffix>.vtk (default: 0)

booleans accept 1/0, true/false, yes/no, on/off
log level is read from RUST_LOG (default: info)";

const OPTION_KEYS: [&str; 7] = [
    "STEP_NAME",
    "FRAME",
    "NODESET",
    "OUTDIR",
    "SUFFIX",
    "ACTIVE_ONLY",
    "VTK",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("missing result database path")]
    MissingDatabase,
    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),
    #[error("FRAME must be an integer, got '{0}'")]
    InvalidFrame(String),
    #[error("{key} must be a boolean, got '{value}'")]
    InvalidBool { key: String, value: String },
    #[error("{0} needs a value")]
    EmptyValue(String),
}

/// What the command line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Export(ExportConfig),
    Help,
}

/// Parse the arguments after the program name.
pub fn parse_args<I, S>(args: I) -> Result<Command, UsageError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut database = None;
    let mut config = ExportConfig::default();

    for arg in args.into_iter().map(Into::into) {
        if arg == "-h" || arg == "--help" {
            return Ok(Command::Help);
        }

        // Until the database is seen, only known keys count as options, so a
        // path containing '=' is still taken as the positional.
        let option = arg
            .split_once('=')
            .map(|(key, value)| (key.trim().to_ascii_uppercase(), value.trim()))
            .filter(|(key, _)| database.is_some() || OPTION_KEYS.contains(&key.as_str()));
        let Some((key, value)) = option else {
            if database.is_some() {
                return Err(UsageError::UnexpectedArgument(arg));
            }
            database = Some(arg);
            continue;
        };

        match key.as_str() {
            "STEP_NAME" => config.step_name = non_empty(&key, value)?.to_string(),
            "FRAME" => {
                config.frame = value
                    .parse()
                    .map_err(|_| UsageError::InvalidFrame(value.to_string()))?
            }
            "NODESET" => {
                config.node_set = (!value.is_empty()).then(|| value.to_string());
            }
            "OUTDIR" => config.output_dir = non_empty(&key, value)?.into(),
            "SUFFIX" => config.suffix = parse_bool(&key, value)?,
            "ACTIVE_ONLY" => config.active_only = parse_bool(&key, value)?,
            "VTK" => config.vtk = parse_bool(&key, value)?,
            _ => warn!("ignoring unknown option {key}"),
        }
    }

    let database = database.ok_or(UsageError::MissingDatabase)?;
    config.database = database.into();
    Ok(Command::Export(config))
}

fn non_empty<'a>(key: &str, value: &'a str) -> Result<&'a str, UsageError> {
    if value.is_empty() {
        Err(UsageError::EmptyValue(key.to_string()))
    } else {
        Ok(value)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, UsageError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(UsageError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn export(args: &[&str]) -> ExportConfig {
        match parse_args(args.iter().copied()) {
            Ok(Command::Export(config)) => config,
            other => panic!("expected export config, got {other:?}"),
        }
    }

    #[test]
    fn defaults_apply_when_only_the_database_is_given() {
        let config = export(&["job.odb.json"]);
        assert_eq!(config, ExportConfig::new("job.odb.json"));
        assert_eq!(config.step_name, "equ");
        assert_eq!(config.frame, -1);
        assert!(!config.suffix);
    }

    #[test]
    fn options_may_precede_the_database() {
        let config = export(&[
            "STEP_NAME=CUT",
            "frame=3",
            "job.odb.json",
            "NODESET=BASE",
            "OUTDIR=out/csv",
            "SUFFIX=on",
            "ACTIVE_ONLY=yes",
            "VTK=1",
        ]);
        assert_eq!(config.database, PathBuf::from("job.odb.json"));
        assert_eq!(config.step_name, "CUT");
        assert_eq!(config.frame, 3);
        assert_eq!(config.node_set.as_deref(), Some("BASE"));
        assert_eq!(config.output_dir, PathBuf::from("out/csv"));
        assert!(config.suffix);
        assert!(config.active_only);
        assert!(config.vtk);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config = export(&["job.odb.json", "COLOR=blue"]);
        assert_eq!(config, ExportConfig::new("job.odb.json"));
    }

    #[test]
    fn malformed_values_are_usage_errors() {
        assert_eq!(
            parse_args(["job.json", "FRAME=last"]),
            Err(UsageError::InvalidFrame("last".to_string()))
        );
        assert_eq!(
            parse_args(["job.json", "VTK=maybe"]),
            Err(UsageError::InvalidBool {
                key: "VTK".to_string(),
                value: "maybe".to_string()
            })
        );
        assert_eq!(
            parse_args(["job.json", "STEP_NAME="]),
            Err(UsageError::EmptyValue("STEP_NAME".to_string()))
        );
    }

    #[test]
    fn database_path_is_required_and_unique() {
        assert_eq!(
            parse_args(Vec::<String>::new()),
            Err(UsageError::MissingDatabase)
        );
        assert_eq!(
            parse_args(["FRAME=1"]),
            Err(UsageError::MissingDatabase)
        );
        assert_eq!(
            parse_args(["a.json", "b.json"]),
            Err(UsageError::UnexpectedArgument("b.json".to_string()))
        );
    }

    #[test]
    fn database_path_may_contain_equals_sign() {
        let config = export(&["/data/run=1/job.odb.json", "FRAME=2"]);
        assert_eq!(config.database, PathBuf::from("/data/run=1/job.odb.json"));
        assert_eq!(config.frame, 2);

        let config = export(&["VTK=1", "case=a.json"]);
        assert_eq!(config.database, PathBuf::from("case=a.json"));
        assert!(config.vtk);

        assert_eq!(
            parse_args(["a.json", "/data/run=1/job.odb.json"]),
            Ok(Command::Export(ExportConfig::new("a.json")))
        );
    }

    #[test]
    fn help_flag_wins() {
        assert_eq!(parse_args(["job.json", "--help"]), Ok(Command::Help));
    }
}
