use serde::{Deserialize, Serialize};

use crate::terraform::{Handle, Provider, Resource};

/// Reads `GITHUB_TOKEN` and `GITHUB_OWNER` itself at apply time when the
/// fields are left unset.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GithubProvider {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Provider for GithubProvider {
    const NAME: &'static str = "github";
    const SOURCE: &'static str = "integrations/github";
    const VERSION: &'static str = "~> 6.2.3";
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_init: Option<bool>,
}

impl Resource for Repository {
    const TYPE: &'static str = "github_repository";
}

impl Handle<Repository> {
    pub fn name(&self) -> String {
        self.get("name")
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RepositoryFile {
    pub repository: String,

    pub file: String,

    pub content: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite_on_create: Option<bool>,
}

impl Resource for RepositoryFile {
    const TYPE: &'static str = "github_repository_file";
}
