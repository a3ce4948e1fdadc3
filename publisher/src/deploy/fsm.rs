//! Step state machine for the deployment pipeline

use chrono::Utc;

use crate::models::deployment::{Step, StepRecord, StepStatus};

/// Step event
#[derive(Debug, Clone)]
pub enum StepEvent {
    /// Start a step (pending -> in_progress)
    Start(Step),

    /// Current step finished (in_progress -> completed)
    Succeed,

    /// Current step raised an error (in_progress -> failed)
    Fail(String),
}

/// Human readable message for a step in a given status
pub fn step_message(step: Step, status: StepStatus) -> &'static str {
    use Step::*;
    use StepStatus::*;

    match (step, status) {
        (Validate, InProgress) => "Validating deployment request",
        (Validate, Completed) => "Deployment request is valid",
        (Validate, Failed) => "Deployment request is invalid",

        (CreateRepository, InProgress) => "Creating repository",
        (CreateRepository, Completed) => "Repository created",
        (CreateRepository, Failed) => "Failed to create repository",

        (PushFiles, InProgress) => "Pushing application files",
        (PushFiles, Completed) => "Application files committed",
        (PushFiles, Failed) => "Failed to push application files",

        (CreateHostingProject, InProgress) => "Creating hosting project",
        (CreateHostingProject, Completed) => "Hosting project created",
        (CreateHostingProject, Failed) => "Failed to create hosting project",

        (LinkRepository, InProgress) => "Linking repository to hosting project",
        (LinkRepository, Completed) => "Repository linked",
        (LinkRepository, Failed) => "Failed to link repository",

        (TriggerDeployment, InProgress) => "Triggering deployment",
        (TriggerDeployment, Completed) => "Deployment triggered",
        (TriggerDeployment, Failed) => "Failed to trigger deployment",

        (MonitorDeployment, InProgress) => "Checking deployment status",
        (MonitorDeployment, Completed) => "Deployment status received",
        (MonitorDeployment, Failed) => "Failed to check deployment status",
    }
}

/// Ordered step trail of a single run
///
/// Records are only ever appended; the last one is the only one that
/// changes status. Once a step fails the trail is sealed.
#[derive(Debug, Clone, Default)]
pub struct StepTrail {
    records: Vec<StepRecord>,
}

impl StepTrail {
    /// Create an empty trail
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent record
    pub fn current(&self) -> Option<&StepRecord> {
        self.records.last()
    }

    /// Whether every step has completed
    pub fn is_complete(&self) -> bool {
        self.records.len() == Step::ALL.len()
            && self
                .records
                .iter()
                .all(|r| r.status == StepStatus::Completed)
    }

    /// Process an event and transition the current step
    pub fn process(&mut self, event: StepEvent) -> Result<(), String> {
        let current = self.records.last().map(|r| (r.step, r.status));

        match (current, &event) {
            // First step
            (None, StepEvent::Start(Step::Validate)) => {
                self.push(Step::Validate);
            }

            // Next step after a completed one
            (Some((prev, StepStatus::Completed)), StepEvent::Start(step))
                if prev.next() == Some(*step) =>
            {
                self.push(*step);
            }

            (Some((step, StepStatus::InProgress)), StepEvent::Succeed) => {
                self.finish(step, StepStatus::Completed, None);
            }

            (Some((step, StepStatus::InProgress)), StepEvent::Fail(detail)) => {
                let detail = if detail.trim().is_empty() {
                    "Unknown error".to_string()
                } else {
                    detail.clone()
                };
                self.finish(step, StepStatus::Failed, Some(detail));
            }

            // Invalid transitions
            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        }

        Ok(())
    }

    /// Start a step
    pub fn begin(&mut self, step: Step) -> Result<(), String> {
        self.process(StepEvent::Start(step))
    }

    /// Complete the current step
    pub fn complete(&mut self) -> Result<(), String> {
        self.process(StepEvent::Succeed)
    }

    /// Fail the current step
    pub fn fail(&mut self, detail: impl Into<String>) -> Result<(), String> {
        self.process(StepEvent::Fail(detail.into()))
    }

    /// Consume the trail
    pub fn into_records(self) -> Vec<StepRecord> {
        self.records
    }

    fn push(&mut self, step: Step) {
        self.records.push(StepRecord {
            step,
            status: StepStatus::InProgress,
            message: step_message(step, StepStatus::InProgress).to_string(),
            timestamp: Utc::now(),
            error: None,
        });
    }

    fn finish(&mut self, step: Step, status: StepStatus, error: Option<String>) {
        if let Some(record) = self.records.last_mut() {
            record.status = status;
            record.message = step_message(step, status).to_string();
            record.timestamp = Utc::now();
            record.error = error;
        }
    }
}
