//! Pipeline cloner.
//!
//! Derives a PR-scoped declaration from the template and submits it as a
//! new, independent pipeline. The template itself is never modified: the
//! service hands back an owned copy and only that copy is rewritten.

use serde_json::json;
use tracing::{debug, info, instrument};

use crate::adapters::OrchestrationService;
use crate::config::LifecycleConfig;
use crate::domain::declaration::{
    ACTION_MODE_CHANGE_SET_REPLACE, CONFIG_ACTION_MODE, CONFIG_BRANCH, CONFIG_CHANGE_SET_NAME,
    CONFIG_OAUTH_TOKEN, CONFIG_PARAMETER_OVERRIDES, CONFIG_STACK_NAME,
};
use crate::domain::{ActionCategory, Operation, PipelineDeclaration};

use super::directory::PipelineDirectory;
use super::error::LifecycleError;

/// Parameter-override key that tells the deployed stack which PR it serves
pub const PULL_REQUEST_PARAMETER: &str = "PullRequest";

/// Clones the template pipeline for a pull request
pub struct PipelineCloner<'a> {
    config: &'a LifecycleConfig,
    service: &'a dyn OrchestrationService,
}

impl<'a> PipelineCloner<'a> {
    pub fn new(config: &'a LifecycleConfig, service: &'a dyn OrchestrationService) -> Self {
        Self { config, service }
    }

    /// Clone `template` into a new pipeline `target` tracking `branch`
    ///
    /// Returns the declaration that was submitted.
    #[instrument(skip(self), fields(backend = self.service.name()))]
    pub async fn clone_pipeline(
        &self,
        template: &str,
        target: &str,
        branch: &str,
    ) -> Result<PipelineDeclaration, LifecycleError> {
        info!("Creating new pipeline for branch");

        let template_declaration = PipelineDirectory::new(self.service)
            .fetch(template)
            .await
            .map_err(|e| LifecycleError::service_call(Operation::GetPipeline, target, &e))?
            .ok_or_else(|| LifecycleError::TemplateNotFound {
                template: template.to_string(),
            })?;

        let declaration = self.derive_declaration(template_declaration, target, branch)?;

        self.service
            .create_pipeline(&declaration)
            .await
            .map_err(|e| LifecycleError::service_call(Operation::CreatePipeline, target, &e))?;

        info!(stages = declaration.stages.len(), "Pipeline created");
        Ok(declaration)
    }

    /// Build the target declaration from the template's declaration
    pub fn derive_declaration(
        &self,
        template: PipelineDeclaration,
        target: &str,
        branch: &str,
    ) -> Result<PipelineDeclaration, LifecycleError> {
        let template_name = template.name;
        let mut stages = template.stages;

        let change_set_name = self.config.change_set_name(target);
        let stack_name = self.config.stack_name(target);

        for action in stages.iter_mut().flat_map(|s| s.actions.iter_mut()) {
            if !action.is_category(&ActionCategory::Deploy) {
                continue;
            }

            action.set_config(CONFIG_CHANGE_SET_NAME, change_set_name.as_str());
            action.set_config(CONFIG_STACK_NAME, stack_name.as_str());

            if action.config(CONFIG_ACTION_MODE) == Some(ACTION_MODE_CHANGE_SET_REPLACE) {
                let overrides = json!({ PULL_REQUEST_PARAMETER: target });
                action.set_config(CONFIG_PARAMETER_OVERRIDES, overrides.to_string());
            }

            debug!(action = %action.name, stack = %stack_name, "Rewrote deploy action");
        }

        let mut declaration = PipelineDeclaration {
            name: target.to_string(),
            role_arn: template.role_arn,
            artifact_store: template.artifact_store,
            stages,
        };

        let source = declaration
            .first_action_mut(&ActionCategory::Source)
            .ok_or(LifecycleError::SourceActionMissing {
                template: template_name,
            })?;
        source.set_config(CONFIG_OAUTH_TOKEN, self.config.source_token.as_str());
        source.set_config(CONFIG_BRANCH, branch);

        Ok(declaration)
    }
}
