//! Shared test fixtures: a recording in-memory orchestration service and a
//! template pipeline declaration.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use prpipe::domain::{Action, ActionCategory, ActionTypeId, ArtifactStore, PipelineDeclaration, Stage};
use prpipe::OrchestrationService;

/// A remote call as the service saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetPipeline(String),
    CreatePipeline(String),
    DeletePipeline(String),
    DeleteStack(String),
}

/// Which call should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailOn {
    GetPipeline,
    CreatePipeline,
    DeletePipeline,
    DeleteStack,
}

#[derive(Default)]
struct State {
    pipelines: BTreeMap<String, PipelineDeclaration>,
    calls: Vec<Call>,
    failures: BTreeMap<FailOn, String>,
}

/// In-memory orchestration service that records every call
#[derive(Default)]
pub struct RecordingService {
    state: Mutex<State>,
}

impl RecordingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pipeline(self, declaration: PipelineDeclaration) -> Self {
        self.state
            .lock()
            .unwrap()
            .pipelines
            .insert(declaration.name.clone(), declaration);
        self
    }

    pub fn fail_on(&self, call: FailOn, message: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(call, message.to_string());
    }

    pub fn clear_failures(&self) {
        self.state.lock().unwrap().failures.clear();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls other than existence lookups
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::GetPipeline(_)))
            .collect()
    }

    pub fn pipeline(&self, name: &str) -> Option<PipelineDeclaration> {
        self.state.lock().unwrap().pipelines.get(name).cloned()
    }

    fn record(&self, call: Call, fail: FailOn) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if let Some(message) = state.failures.get(&fail) {
            anyhow::bail!("{}", message);
        }
        Ok(())
    }
}

#[async_trait]
impl OrchestrationService for RecordingService {
    fn name(&self) -> &str {
        "recording"
    }

    async fn get_pipeline(&self, name: &str) -> Result<Option<PipelineDeclaration>> {
        self.record(Call::GetPipeline(name.to_string()), FailOn::GetPipeline)?;
        Ok(self.pipeline(name))
    }

    async fn create_pipeline(&self, declaration: &PipelineDeclaration) -> Result<()> {
        self.record(
            Call::CreatePipeline(declaration.name.clone()),
            FailOn::CreatePipeline,
        )?;

        let mut state = self.state.lock().unwrap();
        if state.pipelines.contains_key(&declaration.name) {
            anyhow::bail!("PipelineNameInUseException: {}", declaration.name);
        }
        state
            .pipelines
            .insert(declaration.name.clone(), declaration.clone());
        Ok(())
    }

    async fn delete_pipeline(&self, name: &str) -> Result<()> {
        self.record(Call::DeletePipeline(name.to_string()), FailOn::DeletePipeline)?;
        self.state.lock().unwrap().pipelines.remove(name);
        Ok(())
    }

    async fn delete_stack(&self, stack_name: &str) -> Result<()> {
        self.record(Call::DeleteStack(stack_name.to_string()), FailOn::DeleteStack)
    }
}

/// Template with a GitHub Source stage and a CloudFormation Deploy stage
pub fn template_pipeline(name: &str) -> PipelineDeclaration {
    PipelineDeclaration {
        name: name.to_string(),
        role_arn: "arn:aws:iam::123456789012:role/pipeline-role".to_string(),
        artifact_store: Some(ArtifactStore {
            store_type: "S3".to_string(),
            location: "pipeline-artifacts".to_string(),
            encryption_key: None,
        }),
        stages: vec![
            Stage {
                name: "Source".to_string(),
                actions: vec![Action::new(
                    "GitHub",
                    ActionTypeId::new(ActionCategory::Source, "ThirdParty", "GitHub", "1"),
                )
                .with_config("Owner", "acme")
                .with_config("Repo", "app")
                .with_config("Branch", "main")
                .with_config("OAuthToken", "****")],
            },
            Stage {
                name: "Deploy".to_string(),
                actions: vec![Action::new(
                    "CreateChangeSet",
                    ActionTypeId::new(ActionCategory::Deploy, "AWS", "CloudFormation", "1"),
                )
                .with_config("ActionMode", "CHANGE_SET_REPLACE")
                .with_config("ChangeSetName", "CHANGESETFORmain")
                .with_config("StackName", "STACKFORmain")
                .with_config("TemplatePath", "SourceOutput::template.yaml")],
            },
        ],
    }
}
