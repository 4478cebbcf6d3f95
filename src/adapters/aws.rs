//! AWS adapter: CodePipeline for pipelines, CloudFormation for stacks.
//!
//! Converts between the SDK's generated types and the crate's own
//! declaration model so that the lifecycle logic never touches SDK types.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_codepipeline::types as cp;
use tracing::debug;

use super::OrchestrationService;
use crate::domain::{
    Action, ActionCategory, ActionTypeId, ArtifactStore, EncryptionKey, PipelineDeclaration,
    Stage,
};

/// Orchestration service backed by the AWS SDK
pub struct AwsOrchestrator {
    pipelines: aws_sdk_codepipeline::Client,
    stacks: aws_sdk_cloudformation::Client,
}

impl AwsOrchestrator {
    /// Create clients from an already-loaded SDK configuration
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            pipelines: aws_sdk_codepipeline::Client::new(config),
            stacks: aws_sdk_cloudformation::Client::new(config),
        }
    }

    /// Load region and credentials from the standard AWS provider chain
    ///
    /// `call_timeout` bounds each remote operation, retries included.
    pub async fn from_env(call_timeout: Option<Duration>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(timeout) = call_timeout {
            loader = loader.timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(timeout)
                    .build(),
            );
        }
        let config = loader.load().await;
        Self::new(&config)
    }
}

#[async_trait]
impl OrchestrationService for AwsOrchestrator {
    fn name(&self) -> &str {
        "aws"
    }

    async fn get_pipeline(&self, name: &str) -> Result<Option<PipelineDeclaration>> {
        match self.pipelines.get_pipeline().name(name).send().await {
            Ok(output) => output
                .pipeline
                .as_ref()
                .map(declaration_from_sdk)
                .transpose(),
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_pipeline_not_found_exception())
                {
                    debug!(pipeline = name, "Pipeline not found");
                    return Ok(None);
                }
                Err(anyhow!(
                    "GetPipeline '{}' failed: {}",
                    name,
                    aws_sdk_codepipeline::error::DisplayErrorContext(&err)
                ))
            }
        }
    }

    async fn create_pipeline(&self, declaration: &PipelineDeclaration) -> Result<()> {
        let pipeline = declaration_to_sdk(declaration)?;

        self.pipelines
            .create_pipeline()
            .pipeline(pipeline)
            .send()
            .await
            .map_err(|err| {
                anyhow!(
                    "CreatePipeline '{}' failed: {}",
                    declaration.name,
                    aws_sdk_codepipeline::error::DisplayErrorContext(&err)
                )
            })?;

        Ok(())
    }

    async fn delete_pipeline(&self, name: &str) -> Result<()> {
        self.pipelines
            .delete_pipeline()
            .name(name)
            .send()
            .await
            .map_err(|err| {
                anyhow!(
                    "DeletePipeline '{}' failed: {}",
                    name,
                    aws_sdk_codepipeline::error::DisplayErrorContext(&err)
                )
            })?;

        Ok(())
    }

    async fn delete_stack(&self, stack_name: &str) -> Result<()> {
        self.stacks
            .delete_stack()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|err| {
                anyhow!(
                    "DeleteStack '{}' failed: {}",
                    stack_name,
                    aws_sdk_cloudformation::error::DisplayErrorContext(&err)
                )
            })?;

        Ok(())
    }
}

// ============================================================================
// SDK -> domain
// ============================================================================

fn declaration_from_sdk(pipeline: &cp::PipelineDeclaration) -> Result<PipelineDeclaration> {
    let stages = pipeline
        .stages
        .iter()
        .map(stage_from_sdk)
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Unsupported declaration for pipeline '{}'", pipeline.name))?;

    Ok(PipelineDeclaration {
        name: pipeline.name.clone(),
        role_arn: pipeline.role_arn.clone(),
        artifact_store: pipeline.artifact_store.as_ref().map(|store| ArtifactStore {
            store_type: store.r#type.as_str().to_string(),
            location: store.location.clone(),
            encryption_key: store.encryption_key.as_ref().map(|key| EncryptionKey {
                id: key.id.clone(),
                key_type: key.r#type.as_str().to_string(),
            }),
        }),
        stages,
    })
}

fn stage_from_sdk(stage: &cp::StageDeclaration) -> Result<Stage> {
    let actions = stage
        .actions
        .iter()
        .map(action_from_sdk)
        .collect::<Result<Vec<_>>>()?;

    Ok(Stage {
        name: stage.name.clone(),
        actions,
    })
}

fn action_from_sdk(action: &cp::ActionDeclaration) -> Result<Action> {
    let type_id = action
        .action_type_id
        .as_ref()
        .with_context(|| format!("Action '{}' has no action type", action.name))?;

    Ok(Action {
        name: action.name.clone(),
        action_type: ActionTypeId {
            category: ActionCategory::from(type_id.category.as_str()),
            owner: type_id.owner.as_str().to_string(),
            provider: type_id.provider.clone(),
            version: type_id.version.clone(),
        },
        run_order: action.run_order,
        configuration: action
            .configuration
            .clone()
            .unwrap_or_default()
            .into_iter()
            .collect(),
        input_artifacts: action
            .input_artifacts
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|a| a.name.clone())
            .collect(),
        output_artifacts: action
            .output_artifacts
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|a| a.name.clone())
            .collect(),
        role_arn: action.role_arn.clone(),
        region: action.region.clone(),
        namespace: action.namespace.clone(),
    })
}

// ============================================================================
// domain -> SDK
// ============================================================================

fn declaration_to_sdk(declaration: &PipelineDeclaration) -> Result<cp::PipelineDeclaration> {
    let artifact_store = declaration
        .artifact_store
        .as_ref()
        .map(artifact_store_to_sdk)
        .transpose()?;

    let stages = declaration
        .stages
        .iter()
        .map(stage_to_sdk)
        .collect::<Result<Vec<_>>>()?;

    cp::PipelineDeclaration::builder()
        .name(&declaration.name)
        .role_arn(&declaration.role_arn)
        .set_artifact_store(artifact_store)
        .set_stages(Some(stages))
        .build()
        .with_context(|| format!("Invalid declaration for pipeline '{}'", declaration.name))
}

fn artifact_store_to_sdk(store: &ArtifactStore) -> Result<cp::ArtifactStore> {
    let encryption_key = store
        .encryption_key
        .as_ref()
        .map(|key| {
            cp::EncryptionKey::builder()
                .id(&key.id)
                .r#type(cp::EncryptionKeyType::from(key.key_type.as_str()))
                .build()
                .context("Invalid artifact store encryption key")
        })
        .transpose()?;

    cp::ArtifactStore::builder()
        .r#type(cp::ArtifactStoreType::from(store.store_type.as_str()))
        .location(&store.location)
        .set_encryption_key(encryption_key)
        .build()
        .context("Invalid artifact store")
}

fn stage_to_sdk(stage: &Stage) -> Result<cp::StageDeclaration> {
    let actions = stage
        .actions
        .iter()
        .map(action_to_sdk)
        .collect::<Result<Vec<_>>>()?;

    cp::StageDeclaration::builder()
        .name(&stage.name)
        .set_actions(Some(actions))
        .build()
        .with_context(|| format!("Invalid stage '{}'", stage.name))
}

fn action_to_sdk(action: &Action) -> Result<cp::ActionDeclaration> {
    let type_id = cp::ActionTypeId::builder()
        .category(cp::ActionCategory::from(action.action_type.category.as_str()))
        .owner(cp::ActionOwner::from(action.action_type.owner.as_str()))
        .provider(&action.action_type.provider)
        .version(&action.action_type.version)
        .build()
        .with_context(|| format!("Invalid action type for action '{}'", action.name))?;

    let configuration: Option<HashMap<String, String>> = if action.configuration.is_empty() {
        None
    } else {
        Some(action.configuration.clone().into_iter().collect())
    };

    let input_artifacts = action
        .input_artifacts
        .iter()
        .map(|name| cp::InputArtifact::builder().name(name).build())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid input artifact on action '{}'", action.name))?;

    let output_artifacts = action
        .output_artifacts
        .iter()
        .map(|name| cp::OutputArtifact::builder().name(name).build())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid output artifact on action '{}'", action.name))?;

    cp::ActionDeclaration::builder()
        .name(&action.name)
        .action_type_id(type_id)
        .set_run_order(action.run_order)
        .set_configuration(configuration)
        .set_input_artifacts(Some(input_artifacts))
        .set_output_artifacts(Some(output_artifacts))
        .set_role_arn(action.role_arn.clone())
        .set_region(action.region.clone())
        .set_namespace(action.namespace.clone())
        .build()
        .with_context(|| format!("Invalid action '{}'", action.name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_declaration() -> PipelineDeclaration {
        PipelineDeclaration {
            name: "base-pipeline".to_string(),
            role_arn: "arn:aws:iam::123456789012:role/pipeline".to_string(),
            artifact_store: Some(ArtifactStore {
                store_type: "S3".to_string(),
                location: "artifacts-bucket".to_string(),
                encryption_key: None,
            }),
            stages: vec![
                Stage {
                    name: "Source".to_string(),
                    actions: vec![{
                        let mut action = Action::new(
                            "Checkout",
                            ActionTypeId::new(ActionCategory::Source, "ThirdParty", "GitHub", "1"),
                        )
                        .with_config("Owner", "acme")
                        .with_config("Branch", "main");
                        action.output_artifacts = vec!["SourceOutput".to_string()];
                        action
                    }],
                },
                Stage {
                    name: "Deploy".to_string(),
                    actions: vec![{
                        let mut action = Action::new(
                            "CreateChangeSet",
                            ActionTypeId::new(ActionCategory::Deploy, "AWS", "CloudFormation", "1"),
                        )
                        .with_config("ActionMode", "CHANGE_SET_REPLACE");
                        action.input_artifacts = vec!["SourceOutput".to_string()];
                        action.run_order = Some(1);
                        action
                    }],
                },
            ],
        }
    }

    #[test]
    fn test_sdk_conversion_preserves_declaration() {
        let declaration = sample_declaration();

        let sdk = declaration_to_sdk(&declaration).unwrap();
        assert_eq!(sdk.stages.len(), 2);
        assert_eq!(sdk.stages[1].actions[0].name, "CreateChangeSet");

        let back = declaration_from_sdk(&sdk).unwrap();
        assert_eq!(back, declaration);
    }

    #[test]
    fn test_unknown_category_survives_conversion() {
        let mut declaration = sample_declaration();
        declaration.stages[0].actions[0].action_type.category =
            ActionCategory::Other("Custom".to_string());

        let back = declaration_from_sdk(&declaration_to_sdk(&declaration).unwrap()).unwrap();
        assert_eq!(
            back.stages[0].actions[0].action_type.category,
            ActionCategory::Other("Custom".to_string())
        );
    }
}
