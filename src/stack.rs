//! CodeBuild-hosted GitHub Actions runners.
//!
//! A CodeBuild project listens for `WORKFLOW_JOB_QUEUED` events across the
//! GitHub organization and runs any job whose `runs-on` label names it. The
//! stack also creates a sample repository with a workflow using that label.

use crate::config::Credentials;
use crate::providers::aws::{
    AwsProvider, CodebuildProject, CodebuildSourceCredential, CodebuildWebhook, FilterGroup,
    IamPolicyDocument, IamRole, InlinePolicy, PolicyStatement, Principal, ProjectArtifacts,
    ProjectEnvironment, ProjectSource, ScopeConfiguration, WebhookFilter,
};
use crate::providers::github::{GithubProvider, Repository, RepositoryFile};
use crate::terraform::{self, raw_string, Stack};
use crate::workflow;

pub const DEFAULT_STACK_NAME: &str = "cdktf-aws-codebuild-github-runners-dev";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Terraform(#[from] terraform::Error),

    #[error(transparent)]
    Workflow(#[from] workflow::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackProps {
    pub stack_name: String,
    /// Pinned into the AWS provider block when set.
    pub region: Option<String>,
    pub repository_name: String,
    pub project_name: String,
    pub role_name: String,
    pub build_image: String,
    pub compute_type: String,
    pub workflow_path: String,
    pub commit_message: String,
}

impl Default for StackProps {
    fn default() -> Self {
        return Self {
            stack_name: String::from(DEFAULT_STACK_NAME),
            region: None,
            repository_name: String::from("sample-repo"),
            project_name: String::from("sample-project"),
            role_name: String::from("codebuild-project-role"),
            build_image: String::from("aws/codebuild/standard:7.0"),
            compute_type: String::from("BUILD_GENERAL1_SMALL"),
            workflow_path: String::from(".github/workflows/hello-world.yml"),
            commit_message: String::from("Add GHA workflow file"),
        };
    }
}

pub fn build(props: &StackProps, credentials: &Credentials) -> Result<Stack, Error> {
    let mut stack = Stack::new(props.stack_name.as_str());

    stack.provider(&AwsProvider {
        region: props.region.clone(),
    })?;
    stack.provider(&GithubProvider::default())?;

    // Lets CodeBuild register the webhook and clone from GitHub.
    stack.resource(
        "GitHubSourceCredential",
        &CodebuildSourceCredential {
            auth_type: String::from("PERSONAL_ACCESS_TOKEN"),
            server_type: String::from("GITHUB"),
            token: credentials.github_token.clone(),
            user_name: None,
        },
    )?;

    let sample_repo = stack.resource(
        "SampleRepo",
        &Repository {
            name: props.repository_name.clone(),
            description: None,
            visibility: None,
            auto_init: Some(true),
        },
    )?;

    /*
     * IAM POLICIES
     */

    let assume_role_policy = stack.data(
        "CodebuildAssumeRolePolicy",
        &IamPolicyDocument {
            statement: vec![PolicyStatement {
                principals: vec![Principal {
                    principal_type: String::from("Service"),
                    identifiers: vec![String::from("codebuild.amazonaws.com")],
                }],
                ..PolicyStatement::allow(["sts:AssumeRole"])
            }],
        },
    )?;

    let cw_logs_policy = stack.data(
        "CWLogsPolicy",
        &IamPolicyDocument {
            statement: vec![PolicyStatement {
                resources: vec![String::from("*")],
                ..PolicyStatement::allow([
                    "logs:CreateLogGroup",
                    "logs:CreateLogStream",
                    "logs:PutLogEvents",
                ])
            }],
        },
    )?;

    /*
     * IAM ROLES
     */

    let project_role = stack.resource(
        "CodebuildProjectRole",
        &IamRole {
            name: props.role_name.clone(),
            assume_role_policy: assume_role_policy.json(),
            inline_policy: vec![InlinePolicy {
                name: String::from("cw-logs-policy"),
                policy: cw_logs_policy.json(),
            }],
        },
    )?;

    /*
     * CODEBUILD
     */

    let sample_project = stack.resource(
        "SampleProject",
        &CodebuildProject {
            name: props.project_name.clone(),
            description: None,
            service_role: project_role.arn(),
            source: ProjectSource {
                source_type: String::from("GITHUB"),
                location: Some(String::from("CODEBUILD_DEFAULT_WEBHOOK_SOURCE_LOCATION")),
            },
            environment: ProjectEnvironment {
                environment_type: String::from("LINUX_CONTAINER"),
                compute_type: props.compute_type.clone(),
                image: props.build_image.clone(),
            },
            artifacts: ProjectArtifacts {
                artifacts_type: String::from("NO_ARTIFACTS"),
            },
        },
    )?;

    stack.resource(
        "CodebuildWebhook",
        &CodebuildWebhook {
            project_name: sample_project.name(),
            scope_configuration: Some(ScopeConfiguration {
                scope: String::from("GITHUB_ORGANIZATION"),
                name: credentials.github_owner.clone(),
            }),
            filter_group: vec![FilterGroup {
                filter: vec![WebhookFilter {
                    filter_type: String::from("EVENT"),
                    pattern: String::from("WORKFLOW_JOB_QUEUED"),
                }],
            }],
        },
    )?;

    /*
     * GITHUB
     */

    let content = workflow::render(&workflow::hello_world(&sample_project.name()))?;
    stack.resource(
        "GhaWorkflowFile",
        &RepositoryFile {
            repository: sample_repo.name(),
            file: raw_string(&props.workflow_path),
            content,
            branch: None,
            commit_message: Some(props.commit_message.clone()),
            overwrite_on_create: None,
        },
    )?;

    tracing::info!(
        stack = %stack.name(),
        blocks = stack.block_count(),
        owner = %credentials.github_owner,
        "Built stack"
    );
    return Ok(stack);
}
