//! GitHub Actions workflow documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::terraform::raw_string;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Unable to render workflow: {0}")]
    RenderError(String),
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    pub on: Triggers,
    pub jobs: BTreeMap<String, Job>,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Triggers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_dispatch: Option<WorkflowDispatch>,
}

/// Manual trigger. Serializes as `{}`.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDispatch {}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "runs-on")]
    pub runs_on: String,
    pub steps: Vec<Step>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub run: String,
}

/// Runner label CodeBuild matches against a queued workflow job.
///
/// `project_name` is usually an interpolation token; the GitHub expressions
/// are escaped so Terraform passes them through to the workflow file.
pub fn runner_label(project_name: &str) -> String {
    return format!(
        "codebuild-{}-{}",
        project_name,
        raw_string("${{ github.run_id }}-${{ github.run_attempt }}")
    );
}

pub fn hello_world(project_name: &str) -> Workflow {
    let job = Job {
        runs_on: runner_label(project_name),
        steps: vec![Step {
            name: None,
            run: String::from(r#"echo "Hello World!""#),
        }],
    };

    return Workflow {
        name: String::from("Hello World"),
        on: Triggers {
            workflow_dispatch: Some(WorkflowDispatch {}),
        },
        jobs: BTreeMap::from([(String::from("hello_world"), job)]),
    };
}

pub fn render(workflow: &Workflow) -> Result<String, Error> {
    return match serde_yaml::to_string(workflow) {
        Ok(contents) => Ok(contents),
        Err(error) => Err(Error::RenderError(error.to_string())),
    };
}

#[cfg(test)]
mod tests {
    use super::{hello_world, render, runner_label, Workflow};

    const PROJECT: &str = "${aws_codebuild_project.SampleProject.name}";

    #[test]
    fn runner_label_keeps_github_expressions_literal() {
        assert_eq!(
            "codebuild-${aws_codebuild_project.SampleProject.name}-$${{ github.run_id }}-$${{ github.run_attempt }}",
            runner_label(PROJECT)
        );
    }

    #[test]
    fn renders_hello_world() {
        let contents = render(&hello_world(PROJECT)).unwrap();

        let value: serde_yaml::Value = serde_yaml::from_str(&contents).unwrap();
        assert_eq!("Hello World", value["name"].as_str().unwrap());
        assert_eq!(true, value["on"]["workflow_dispatch"].is_mapping());
        assert_eq!(
            runner_label(PROJECT),
            value["jobs"]["hello_world"]["runs-on"].as_str().unwrap()
        );
        assert_eq!(
            r#"echo "Hello World!""#,
            value["jobs"]["hello_world"]["steps"][0]["run"].as_str().unwrap()
        );
        assert_eq!(true, value["jobs"]["hello_world"]["steps"][0].get("name").is_none());
    }

    #[test]
    fn renders_hello_world_text() {
        let expected = concat!(
            "name: Hello World\n",
            "on:\n",
            "  workflow_dispatch: {}\n",
            "jobs:\n",
            "  hello_world:\n",
            "    runs-on: codebuild-${aws_codebuild_project.SampleProject.name}-$${{ github.run_id }}-$${{ github.run_attempt }}\n",
            "    steps:\n",
            "    - run: echo \"Hello World!\"\n",
        );

        assert_eq!(expected, render(&hello_world(PROJECT)).unwrap());
    }

    #[test]
    fn rendered_workflow_parses_back() {
        let workflow = hello_world("sample-project");
        let contents = render(&workflow).unwrap();

        let parsed: Workflow = serde_yaml::from_str(&contents).unwrap();
        assert_eq!(workflow, parsed);
    }
}
