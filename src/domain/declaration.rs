//! Pipeline declarations as the orchestration service stores them.
//!
//! A declaration is an ordered list of stages, each an ordered list of
//! actions. Order is significant at both levels and is never rearranged.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Deploy-action option holding the change-set name
pub const CONFIG_CHANGE_SET_NAME: &str = "ChangeSetName";
/// Deploy-action option holding the stack name
pub const CONFIG_STACK_NAME: &str = "StackName";
/// Deploy-action option selecting the CloudFormation action mode
pub const CONFIG_ACTION_MODE: &str = "ActionMode";
/// Deploy-action option holding the JSON parameter overrides
pub const CONFIG_PARAMETER_OVERRIDES: &str = "ParameterOverrides";
/// Source-action option holding the GitHub OAuth token
pub const CONFIG_OAUTH_TOKEN: &str = "OAuthToken";
/// Source-action option holding the tracked branch
pub const CONFIG_BRANCH: &str = "Branch";

/// Action mode that replaces (or creates) a change set
pub const ACTION_MODE_CHANGE_SET_REPLACE: &str = "CHANGE_SET_REPLACE";

/// A complete pipeline declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDeclaration {
    /// Pipeline name (unique within the account/region)
    pub name: String,

    /// Service role the pipeline runs as
    pub role_arn: String,

    /// Where stage artifacts are stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_store: Option<ArtifactStore>,

    /// Ordered stages
    pub stages: Vec<Stage>,
}

impl PipelineDeclaration {
    /// Iterate over every action in stage-then-action order
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.stages.iter().flat_map(|s| s.actions.iter())
    }

    /// Mutable counterpart of [`PipelineDeclaration::actions`]
    pub fn actions_mut(&mut self) -> impl Iterator<Item = &mut Action> {
        self.stages.iter_mut().flat_map(|s| s.actions.iter_mut())
    }

    /// First action of the given category, in declaration order
    pub fn first_action_mut(&mut self, category: &ActionCategory) -> Option<&mut Action> {
        self.actions_mut()
            .find(|a| &a.action_type.category == category)
    }
}

/// Artifact store reference, carried through clones untouched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactStore {
    /// Store type (e.g. "S3")
    pub store_type: String,

    /// Bucket or equivalent location
    pub location: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_key: Option<EncryptionKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionKey {
    pub id: String,
    pub key_type: String,
}

/// A pipeline stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,

    /// Ordered actions; later tooling resolves dependencies positionally
    pub actions: Vec<Action>,
}

/// A single step within a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,

    pub action_type: ActionTypeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_order: Option<i32>,

    /// Provider-specific options (option name -> value)
    #[serde(default)]
    pub configuration: BTreeMap<String, String>,

    #[serde(default)]
    pub input_artifacts: Vec<String>,

    #[serde(default)]
    pub output_artifacts: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Action {
    /// Create an action with an empty configuration
    pub fn new(name: impl Into<String>, action_type: ActionTypeId) -> Self {
        Self {
            name: name.into(),
            action_type,
            run_order: None,
            configuration: BTreeMap::new(),
            input_artifacts: Vec::new(),
            output_artifacts: Vec::new(),
            role_arn: None,
            region: None,
            namespace: None,
        }
    }

    /// Builder-style configuration setter
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.configuration.insert(key.into(), value.into());
        self
    }

    /// Look up a configuration option
    pub fn config(&self, key: &str) -> Option<&str> {
        self.configuration.get(key).map(String::as_str)
    }

    /// Overwrite a configuration option
    pub fn set_config(&mut self, key: &str, value: impl Into<String>) {
        self.configuration.insert(key.to_string(), value.into());
    }

    pub fn is_category(&self, category: &ActionCategory) -> bool {
        &self.action_type.category == category
    }
}

/// Identifies which provider executes an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTypeId {
    pub category: ActionCategory,
    pub owner: String,
    pub provider: String,
    pub version: String,
}

impl ActionTypeId {
    pub fn new(
        category: ActionCategory,
        owner: impl Into<String>,
        provider: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            category,
            owner: owner.into(),
            provider: provider.into(),
            version: version.into(),
        }
    }
}

/// Action category as named by the orchestration service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionCategory {
    Source,
    Build,
    Deploy,
    Test,
    Invoke,
    Approval,
    Compute,
    /// Categories this crate does not act on
    Other(String),
}

impl ActionCategory {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Source => "Source",
            Self::Build => "Build",
            Self::Deploy => "Deploy",
            Self::Test => "Test",
            Self::Invoke => "Invoke",
            Self::Approval => "Approval",
            Self::Compute => "Compute",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for ActionCategory {
    fn from(s: &str) -> Self {
        match s {
            "Source" => Self::Source,
            "Build" => Self::Build,
            "Deploy" => Self::Deploy,
            "Test" => Self::Test,
            "Invoke" => Self::Invoke,
            "Approval" => Self::Approval,
            "Compute" => Self::Compute,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ActionCategory {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<ActionCategory> for String {
    fn from(c: ActionCategory) -> Self {
        c.as_str().to_string()
    }
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> Action {
        Action::new(
            "Checkout",
            ActionTypeId::new(ActionCategory::Source, "ThirdParty", "GitHub", "1"),
        )
    }

    fn deploy(name: &str) -> Action {
        Action::new(
            name,
            ActionTypeId::new(ActionCategory::Deploy, "AWS", "CloudFormation", "1"),
        )
    }

    #[test]
    fn test_category_round_trip_through_strings() {
        assert_eq!(ActionCategory::from("Deploy"), ActionCategory::Deploy);
        assert_eq!(
            ActionCategory::from("Custom"),
            ActionCategory::Other("Custom".to_string())
        );
        assert_eq!(ActionCategory::Other("Custom".to_string()).as_str(), "Custom");
    }

    #[test]
    fn test_actions_iterate_in_declaration_order() {
        let decl = PipelineDeclaration {
            name: "p".to_string(),
            role_arn: "arn:role".to_string(),
            artifact_store: None,
            stages: vec![
                Stage {
                    name: "Source".to_string(),
                    actions: vec![source()],
                },
                Stage {
                    name: "Deploy".to_string(),
                    actions: vec![deploy("CreateChangeSet"), deploy("ExecuteChangeSet")],
                },
            ],
        };

        let names: Vec<&str> = decl.actions().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Checkout", "CreateChangeSet", "ExecuteChangeSet"]);
    }

    #[test]
    fn test_first_action_mut_selects_by_category() {
        let mut decl = PipelineDeclaration {
            name: "p".to_string(),
            role_arn: "arn:role".to_string(),
            artifact_store: None,
            stages: vec![
                Stage {
                    name: "Approve".to_string(),
                    actions: vec![Action::new(
                        "Gate",
                        ActionTypeId::new(ActionCategory::Approval, "AWS", "Manual", "1"),
                    )],
                },
                Stage {
                    name: "Source".to_string(),
                    actions: vec![source()],
                },
            ],
        };

        let action = decl.first_action_mut(&ActionCategory::Source).unwrap();
        assert_eq!(action.name, "Checkout");
        assert!(decl.first_action_mut(&ActionCategory::Build).is_none());
    }

    #[test]
    fn test_declaration_yaml_parsing() {
        let yaml = r#"
name: base-pipeline
role_arn: arn:aws:iam::123456789012:role/pipeline
artifact_store:
  store_type: S3
  location: artifacts-bucket
stages:
  - name: Source
    actions:
      - name: Checkout
        action_type:
          category: Source
          owner: ThirdParty
          provider: GitHub
          version: "1"
        configuration:
          Owner: acme
          Repo: app
"#;
        let decl: PipelineDeclaration = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(decl.stages.len(), 1);
        let action = &decl.stages[0].actions[0];
        assert!(action.is_category(&ActionCategory::Source));
        assert_eq!(action.config("Repo"), Some("app"));
        assert_eq!(decl.artifact_store.unwrap().location, "artifacts-bucket");
    }
}
