use serde::{Deserialize, Serialize};

use crate::terraform::{DataSource, Handle, Provider, Resource};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AwsProvider {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Provider for AwsProvider {
    const NAME: &'static str = "aws";
    const SOURCE: &'static str = "hashicorp/aws";
    const VERSION: &'static str = "~> 5.59.0";
}

/*
 * IAM
 */

/// `data "aws_iam_policy_document"`
#[derive(Debug, Serialize, Deserialize)]
pub struct IamPolicyDocument {
    pub statement: Vec<PolicyStatement>,
}

impl DataSource for IamPolicyDocument {
    const TYPE: &'static str = "aws_iam_policy_document";
}

impl Handle<IamPolicyDocument> {
    /// Rendered policy JSON.
    pub fn json(&self) -> String {
        self.get("json")
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PolicyStatement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,

    pub effect: String,

    pub actions: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub principals: Vec<Principal>,
}

impl PolicyStatement {
    pub fn allow<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        return Self {
            effect: String::from("Allow"),
            actions: actions.into_iter().map(Into::into).collect(),
            ..Default::default()
        };
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Principal {
    #[serde(rename = "type")]
    pub principal_type: String,

    pub identifiers: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IamRole {
    pub name: String,

    pub assume_role_policy: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inline_policy: Vec<InlinePolicy>,
}

impl Resource for IamRole {
    const TYPE: &'static str = "aws_iam_role";
}

impl Handle<IamRole> {
    pub fn arn(&self) -> String {
        self.get("arn")
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InlinePolicy {
    pub name: String,
    pub policy: String,
}

/*
 * CODEBUILD
 */

#[derive(Debug, Serialize, Deserialize)]
pub struct CodebuildSourceCredential {
    pub auth_type: String,

    pub server_type: String,

    pub token: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

impl Resource for CodebuildSourceCredential {
    const TYPE: &'static str = "aws_codebuild_source_credential";
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CodebuildProject {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub service_role: String,

    pub source: ProjectSource,

    pub environment: ProjectEnvironment,

    pub artifacts: ProjectArtifacts,
}

impl Resource for CodebuildProject {
    const TYPE: &'static str = "aws_codebuild_project";
}

impl Handle<CodebuildProject> {
    pub fn name(&self) -> String {
        self.get("name")
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectSource {
    #[serde(rename = "type")]
    pub source_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectEnvironment {
    #[serde(rename = "type")]
    pub environment_type: String,

    pub compute_type: String,

    pub image: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectArtifacts {
    #[serde(rename = "type")]
    pub artifacts_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CodebuildWebhook {
    pub project_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope_configuration: Option<ScopeConfiguration>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter_group: Vec<FilterGroup>,
}

impl Resource for CodebuildWebhook {
    const TYPE: &'static str = "aws_codebuild_webhook";
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScopeConfiguration {
    pub scope: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterGroup {
    pub filter: Vec<WebhookFilter>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookFilter {
    #[serde(rename = "type")]
    pub filter_type: String,

    pub pattern: String,
}
