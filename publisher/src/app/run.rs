//! Command dispatch

use colored::Colorize;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::app::options::Command;
use crate::app::state::AppState;
use crate::errors::PublishError;
use crate::filesys::file::File;
use crate::models::deployment::{DeploymentRequest, StepRecord, StepStatus};
use crate::utils::version_info;

/// Output of one command
#[derive(Debug)]
pub struct CommandOutput {
    /// JSON document printed on stdout
    pub value: Value,

    /// Step trail of a deployment run
    pub steps: Vec<StepRecord>,

    /// Exit successfully
    pub success: bool,
}

impl CommandOutput {
    fn ok<T: Serialize>(value: &T) -> Result<Self, PublishError> {
        Ok(Self {
            value: serde_json::to_value(value)?,
            steps: Vec::new(),
            success: true,
        })
    }
}

/// Run a command against the application state
pub async fn run(command: Command, state: &AppState) -> Result<CommandOutput, PublishError> {
    let service = &state.service;

    match command {
        Command::Version => CommandOutput::ok(&version_info()),
        Command::CreateProject {
            user_id,
            name,
            template_key,
        } => {
            let project = service
                .create_project(&user_id, &name, template_key.as_deref())
                .await?;
            CommandOutput::ok(&project)
        }
        Command::Deploy { request_file } => {
            let request: DeploymentRequest = File::new(request_file).read_json().await?;
            info!(
                "Publishing project {} for user {}",
                request.project_id, request.user_id
            );
            let result = service.publish(&request).await?;
            if let Some(step) = result.failed_step() {
                warn!("Run {} stopped at step {:?}", result.run_id, step);
            }
            Ok(CommandOutput {
                value: serde_json::to_value(&result)?,
                steps: result.steps.clone(),
                success: result.success,
            })
        }
        Command::Status {
            user_id,
            project_id,
            hosting_token,
        } => {
            let status = service
                .status(&user_id, &project_id, hosting_token.as_ref())
                .await?;
            CommandOutput::ok(&status)
        }
        Command::Cancel {
            user_id,
            deployment_id,
            hosting_token,
        } => {
            let cancelled = service
                .cancel(&user_id, &deployment_id, hosting_token.as_ref())
                .await?;
            CommandOutput::ok(&json!({
                "deployment_id": deployment_id,
                "cancelled": cancelled,
            }))
        }
        Command::Quota { user_id } => {
            let prompt = service.quota(&user_id).await?;
            CommandOutput::ok(&prompt)
        }
        Command::ConnectToken { user_id, token } => {
            service.connect_credential(&user_id, &token).await?;
            CommandOutput::ok(&json!({ "user_id": user_id, "connected": true }))
        }
    }
}

/// Error document printed on stdout when a command fails
pub fn error_output(error: &PublishError) -> Value {
    json!({
        "success": false,
        "kind": error.kind(),
        "error": error.to_string(),
    })
}

/// One line per step record, colored by status
pub fn step_summary(steps: &[StepRecord]) -> Vec<String> {
    steps
        .iter()
        .map(|record| {
            let marker = match record.status {
                StepStatus::Completed => "✓".green(),
                StepStatus::InProgress => "…".yellow(),
                StepStatus::Failed => "✗".red(),
            };
            match &record.error {
                Some(error) => format!("{} {} ({})", marker, record.message, error.red()),
                None => format!("{} {}", marker, record.message),
            }
        })
        .collect()
}
