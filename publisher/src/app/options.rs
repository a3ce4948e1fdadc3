//! Command line options

use std::collections::HashMap;
use std::path::PathBuf;

use crate::authn::credential::Credential;
use crate::errors::PublishError;

/// Command selected on the command line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Print version information
    Version,

    /// Register a project for a user
    CreateProject {
        user_id: String,
        name: String,
        template_key: Option<String>,
    },

    /// Publish the request stored in a JSON file
    Deploy { request_file: PathBuf },

    /// Show the deployment status of a project
    Status {
        user_id: String,
        project_id: String,
        hosting_token: Option<Credential>,
    },

    /// Cancel a running deployment
    Cancel {
        user_id: String,
        deployment_id: String,
        hosting_token: Option<Credential>,
    },

    /// Show the shared-credential quota of a user
    Quota { user_id: String },

    /// Validate and save a personal hosting token
    ConnectToken { user_id: String, token: Credential },
}

/// Parsed command line
#[derive(Debug, Clone)]
pub struct CliOptions {
    /// Settings file overriding the storage layout default
    pub config: Option<PathBuf>,

    pub command: Command,
}

/// Split `--key=value` and `--flag` arguments into a map
pub fn parse_args<I>(args: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = String>,
{
    let mut cli_args = HashMap::new();

    for arg in args {
        if let Some((key, value)) = arg.split_once('=') {
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    cli_args
}

impl CliOptions {
    /// Build options from parsed arguments
    pub fn from_args(cli_args: &HashMap<String, String>) -> Result<Self, PublishError> {
        let config = cli_args.get("config").map(PathBuf::from);
        let hosting_token = cli_args
            .get("hosting-token")
            .map(|t| Credential::new(t.as_str()));

        let command = if cli_args.contains_key("version") {
            Command::Version
        } else if let Some(name) = cli_args.get("create-project") {
            Command::CreateProject {
                user_id: required(cli_args, "user")?,
                name: name.clone(),
                template_key: cli_args.get("template").cloned(),
            }
        } else if let Some(file) = cli_args.get("deploy") {
            Command::Deploy {
                request_file: PathBuf::from(file),
            }
        } else if let Some(project_id) = cli_args.get("status") {
            Command::Status {
                user_id: required(cli_args, "user")?,
                project_id: project_id.clone(),
                hosting_token,
            }
        } else if let Some(deployment_id) = cli_args.get("cancel") {
            Command::Cancel {
                user_id: required(cli_args, "user")?,
                deployment_id: deployment_id.clone(),
                hosting_token,
            }
        } else if cli_args.contains_key("quota") {
            Command::Quota {
                user_id: required(cli_args, "user")?,
            }
        } else if let Some(token) = cli_args.get("connect-token") {
            Command::ConnectToken {
                user_id: required(cli_args, "user")?,
                token: Credential::new(token.as_str()),
            }
        } else {
            return Err(PublishError::ValidationError(format!(
                "No command given\n{}",
                USAGE
            )));
        };

        Ok(Self { config, command })
    }
}

fn required(cli_args: &HashMap<String, String>, key: &str) -> Result<String, PublishError> {
    cli_args
        .get(key)
        .filter(|v| !v.trim().is_empty() && v.as_str() != "true")
        .cloned()
        .ok_or_else(|| PublishError::ValidationError(format!("Missing --{}=<value>", key)))
}

/// Usage text
pub const USAGE: &str = "\
Usage:
  publisher --create-project=<name> --user=<id> [--template=<key>]
  publisher --deploy=<request.json>
  publisher --status=<project_id> --user=<id> [--hosting-token=<token>]
  publisher --cancel=<deployment_id> --user=<id> [--hosting-token=<token>]
  publisher --quota --user=<id>
  publisher --connect-token=<token> --user=<id>
  publisher --version

Options:
  --config=<settings.json>  Settings file (default: <storage dir>/settings.json)";
