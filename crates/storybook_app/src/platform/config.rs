//! Command line and RON config file handling.
//!
//! The config file supplies defaults; anything given on the command line wins.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use storybook_core::{FormField, FormSubmission, Url};
use storybook_engine::{EngineConfig, SubmitSettings};
use thiserror::Error;

use super::logging::LogDestination;

pub const DEFAULT_ACTION: &str = "http://127.0.0.1:8000/create_kids_book/";
const DEFAULT_LOG_FILE: &str = "storybook.log";
const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

#[derive(Parser, Debug)]
#[command(
    name = "storybook",
    about = "Submit a story to the kids-book generator and show the result"
)]
pub struct Cli {
    /// RON config file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Form action URL the story is posted to.
    #[arg(long)]
    pub action: Option<String>,

    /// Text field, repeatable.
    #[arg(long = "field", value_name = "NAME=VALUE")]
    pub fields: Vec<String>,

    /// File field read from disk, repeatable.
    #[arg(long = "file", value_name = "NAME=PATH")]
    pub files: Vec<String>,

    /// Mark the request as script-initiated (X-Requested-With).
    #[arg(long)]
    pub ajax: bool,

    /// Click "Download Story" once a page result is shown.
    #[arg(long)]
    pub download: bool,

    #[arg(long)]
    pub download_dir: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub log: Option<LogDestination>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub action: Option<String>,
    pub as_ajax: bool,
    pub download_dir: Option<PathBuf>,
    pub connect_timeout_secs: u64,
    /// `None` waits for the backend indefinitely.
    pub request_timeout_secs: Option<u64>,
    pub max_response_bytes: u64,
    pub log: LogDestination,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let submit = SubmitSettings::default();
        Self {
            action: None,
            as_ajax: submit.as_ajax,
            download_dir: None,
            connect_timeout_secs: submit.connect_timeout.as_secs(),
            request_timeout_secs: submit.request_timeout.map(|timeout| timeout.as_secs()),
            max_response_bytes: submit.max_bytes,
            log: LogDestination::default(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid action url {url:?}: {source}")]
    InvalidAction {
        url: String,
        source: url::ParseError,
    },
    #[error("expected NAME=VALUE, got {0:?}")]
    MalformedPair(String),
    #[error("failed to read form file {path:?}: {source}")]
    ReadField {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Everything the app needs to run one submission.
#[derive(Debug, Clone)]
pub struct Settings {
    pub submission: FormSubmission,
    pub engine: EngineConfig,
    pub download: bool,
    pub log: LogDestination,
    pub log_file: PathBuf,
}

pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&text).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

pub fn resolve(cli: Cli) -> Result<Settings, ConfigError> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    let action_text = cli
        .action
        .or(config.action)
        .unwrap_or_else(|| DEFAULT_ACTION.to_string());
    let action = Url::parse(&action_text).map_err(|source| ConfigError::InvalidAction {
        url: action_text.clone(),
        source,
    })?;

    let mut submission = FormSubmission::new(action);
    for pair in &cli.fields {
        let (name, value) = split_pair(pair)?;
        submission = submission.with_field(FormField::text(name, value));
    }
    for pair in &cli.files {
        let (name, path) = split_pair(pair)?;
        submission = submission.with_field(read_file_field(name, Path::new(path))?);
    }

    let download_dir = cli
        .download_dir
        .or(config.download_dir)
        .unwrap_or_else(default_download_dir);
    let submit = SubmitSettings {
        connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        request_timeout: config.request_timeout_secs.map(Duration::from_secs),
        max_bytes: config.max_response_bytes,
        as_ajax: cli.ajax || config.as_ajax,
    };

    Ok(Settings {
        submission,
        engine: EngineConfig {
            submit,
            download_dir,
        },
        download: cli.download,
        log: cli.log.unwrap_or(config.log),
        log_file: config.log_file,
    })
}

fn split_pair(pair: &str) -> Result<(&str, &str), ConfigError> {
    match pair.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value)),
        _ => Err(ConfigError::MalformedPair(pair.to_string())),
    }
}

fn read_file_field(name: &str, path: &Path) -> Result<FormField, ConfigError> {
    let bytes = fs::read(path).map_err(|source| ConfigError::ReadField {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    Ok(FormField::File {
        name: name.to_string(),
        file_name,
        content_type: None,
        bytes,
    })
}

fn default_download_dir() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(DEFAULT_DOWNLOAD_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["storybook"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn defaults_post_to_local_backend() {
        let settings = resolve(cli(&["--field", "story=Once upon a time"])).unwrap();

        assert_eq!(settings.submission.action.as_str(), DEFAULT_ACTION);
        assert_eq!(
            settings.submission.fields,
            vec![FormField::text("story", "Once upon a time")]
        );
        assert!(!settings.engine.submit.as_ajax);
        assert_eq!(
            settings.engine.submit.request_timeout,
            SubmitSettings::default().request_timeout
        );
        assert_eq!(settings.log, LogDestination::File);
        assert!(!settings.download);
    }

    #[test]
    fn field_values_may_contain_equals_signs() {
        let settings = resolve(cli(&["--field", "story=a=b"])).unwrap();
        assert_eq!(
            settings.submission.fields,
            vec![FormField::text("story", "a=b")]
        );
    }

    #[test]
    fn malformed_field_is_rejected() {
        let err = resolve(cli(&["--field", "no-separator"])).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedPair(_)));
    }

    #[test]
    fn invalid_action_is_rejected() {
        let err = resolve(cli(&["--action", "not a url"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAction { .. }));
    }

    #[test]
    fn config_file_values_apply_and_cli_overrides_them() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storybook.ron");
        fs::write(
            &path,
            r#"(
                action: Some("http://stories.example.com/create_kids_book/"),
                as_ajax: true,
                request_timeout_secs: None,
                max_response_bytes: 1024,
                log: both,
            )"#,
        )
        .unwrap();

        let settings = resolve(cli(&[
            "--config",
            path.to_str().unwrap(),
            "--log",
            "terminal",
        ]))
        .unwrap();

        assert_eq!(
            settings.submission.action.as_str(),
            "http://stories.example.com/create_kids_book/"
        );
        assert!(settings.engine.submit.as_ajax);
        assert_eq!(settings.engine.submit.request_timeout, None);
        assert_eq!(settings.engine.submit.max_bytes, 1024);
        assert_eq!(settings.log, LogDestination::Terminal);

        let overridden = resolve(cli(&[
            "--config",
            path.to_str().unwrap(),
            "--action",
            "http://other.example.com/",
        ]))
        .unwrap();
        assert_eq!(overridden.submission.action.as_str(), "http://other.example.com/");
        assert_eq!(overridden.log, LogDestination::Both);
    }

    #[test]
    fn broken_config_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.ron");
        fs::write(&path, "(action: ").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { path: p, .. } if p == path));
    }

    #[test]
    fn file_fields_are_read_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("draft.txt");
        fs::write(&path, "a story in a file").unwrap();

        let arg = format!("draft={}", path.display());
        let settings = resolve(cli(&["--file", &arg])).unwrap();

        assert_eq!(
            settings.submission.fields,
            vec![FormField::File {
                name: "draft".to_string(),
                file_name: "draft.txt".to_string(),
                content_type: None,
                bytes: b"a story in a file".to_vec(),
            }]
        );
    }
}
