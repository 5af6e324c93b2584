use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::{fmt, fs, io, path::Path};
use validator::{Validate, ValidationError};

use crate::stack::StackProps;
use crate::terraform::is_valid_id;

pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const GITHUB_OWNER: &str = "GITHUB_OWNER";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("File {0} not found")]
    FileNotFound(String),

    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("Validation errors: {0}")]
    ValidationError(String),

    #[error("Required environment variables {0} are missing or undefined")]
    MissingEnvironment(String),

    #[error("Unknown error occurred: {0}")]
    Unknown(String),
}

/// One stack to synthesize. Unset fields keep the `StackProps` defaults.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ConfigEntry {
    #[validate(required, custom = "validate_stack_name")]
    pub stack_name: Option<String>,

    pub region: Option<String>,

    pub repository_name: Option<String>,

    pub project_name: Option<String>,

    pub role_name: Option<String>,

    #[validate(length(min = 1))]
    pub build_image: Option<String>,

    pub compute_type: Option<String>,

    #[validate(custom = "validate_workflow_path")]
    pub workflow_path: Option<String>,

    pub commit_message: Option<String>,
}

impl ConfigEntry {
    pub fn props(&self) -> StackProps {
        let mut props = StackProps::default();

        if let Some(stack_name) = &self.stack_name {
            props.stack_name = stack_name.clone();
        }
        if let Some(region) = &self.region {
            props.region = Some(region.clone());
        }
        if let Some(repository_name) = &self.repository_name {
            props.repository_name = repository_name.clone();
        }
        if let Some(project_name) = &self.project_name {
            props.project_name = project_name.clone();
        }
        if let Some(role_name) = &self.role_name {
            props.role_name = role_name.clone();
        }
        if let Some(build_image) = &self.build_image {
            props.build_image = build_image.clone();
        }
        if let Some(compute_type) = &self.compute_type {
            props.compute_type = compute_type.clone();
        }
        if let Some(workflow_path) = &self.workflow_path {
            props.workflow_path = workflow_path.clone();
        }
        if let Some(commit_message) = &self.commit_message {
            props.commit_message = commit_message.clone();
        }

        return props;
    }
}

pub type Config = Vec<ConfigEntry>;

pub fn parse(path: &Path) -> Result<Config, Error> {
    let contents = match fs::read_to_string(path) {
        Ok(raw_contents) => Ok(raw_contents),
        Err(error) => match error.kind() {
            io::ErrorKind::NotFound => Err(Error::FileNotFound(path.display().to_string())),
            _ => Err(Error::Unknown(error.to_string())),
        },
    }?;

    let config: Config = match serde_yaml::from_str(&contents) {
        Ok(data) => Ok(data),
        Err(error) => Err(Error::ParsingError(error.to_string())),
    }?;

    let mut stack_names = HashSet::new();
    for config_entry in &config {
        match config_entry.validate() {
            Ok(_) => (),
            Err(error) => return Err(Error::ValidationError(error.to_string())),
        }

        if let Some(stack_name) = &config_entry.stack_name {
            if !stack_names.insert(stack_name.as_str()) {
                return Err(Error::ValidationError(format!(
                    "stack_name: `{}` is declared more than once",
                    stack_name
                )));
            }
        }
    }

    tracing::debug!(path = %path.display(), stacks = config.len(), "Parsed config file");
    return Ok(config);
}

/// Renames the single stack being synthesized.
pub fn override_stack_name(all_props: &mut [StackProps], stack_name: &str) -> Result<(), Error> {
    if all_props.len() != 1 {
        return Err(Error::ValidationError(String::from(
            "stack_name: can only be overridden when synthesizing a single stack",
        )));
    }
    match validate_stack_name(stack_name) {
        Ok(_) => (),
        Err(error) => {
            return Err(Error::ValidationError(format!("stack_name: {}", error.code)))
        }
    }

    all_props[0].stack_name = stack_name.to_string();
    return Ok(());
}

fn validate_stack_name(stack_name: &str) -> Result<(), ValidationError> {
    if !is_valid_id(stack_name) {
        return Err(ValidationError::new(
            "The stack name may only contain ASCII letters, digits, `_` and `-`",
        ));
    }

    return Ok(());
}

fn validate_workflow_path(workflow_path: &str) -> Result<(), ValidationError> {
    if !workflow_path.starts_with(".github/workflows/") {
        return Err(ValidationError::new(
            "The workflow file has to live under `.github/workflows/`",
        ));
    }

    let file_extension = match Path::new(workflow_path).extension() {
        Some(extension) => extension,
        None => {
            return Err(ValidationError::new(
                "Unable to parse the extension of the workflow file location",
            ))
        }
    };
    if file_extension != "yml" && file_extension != "yaml" {
        return Err(ValidationError::new(
            "The workflow file location has to end with `.yml` or `.yaml`",
        ));
    }

    return Ok(());
}

/// GitHub credentials the stack is built with.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub github_token: String,
    pub github_owner: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self, Error> {
        return Self::from_lookup(|key| std::env::var(key).ok());
    }

    /// Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let github_token = read(GITHUB_TOKEN);
        let github_owner = read(GITHUB_OWNER);

        return match (github_token, github_owner) {
            (Some(github_token), Some(github_owner)) => Ok(Self {
                github_token,
                github_owner,
            }),
            (token, owner) => {
                let missing: Vec<String> = [(GITHUB_TOKEN, token.is_none()), (GITHUB_OWNER, owner.is_none())]
                    .into_iter()
                    .filter(|(_, is_missing)| *is_missing)
                    .map(|(key, _)| format!("'{}'", key))
                    .collect();
                Err(Error::MissingEnvironment(missing.join(", ")))
            }
        };
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("github_token", &"<redacted>")
            .field("github_owner", &self.github_owner)
            .finish()
    }
}
