use std::collections::BTreeMap;
use std::fs::{self};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::terraform::{self, is_valid_id, Stack, SYNTH_VERSION};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const STACK_FILE: &str = "cdk.tf.json";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Unable to write {path}: {message}")]
    Io { path: String, message: String },

    #[error(transparent)]
    Synth(#[from] terraform::Error),
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub stacks: BTreeMap<String, ManifestStack>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestStack {
    pub name: String,
    pub construct_path: String,
    pub working_directory: String,
    pub synthesized_stack_path: String,
    pub annotations: Vec<String>,
    pub dependencies: Vec<String>,
}

/// Writes `<outdir>/stacks/<name>/cdk.tf.json` for every stack, then the
/// manifest listing them. Returns the manifest path.
pub fn write(outdir: &Path, stacks: &[Stack]) -> Result<PathBuf, Error> {
    let mut manifest = Manifest {
        version: String::from(SYNTH_VERSION),
        stacks: BTreeMap::new(),
    };

    for stack in stacks {
        if !is_valid_id(stack.name()) {
            return Err(terraform::Error::InvalidId(stack.name().to_string()).into());
        }
    }

    for stack in stacks {
        let working_directory = format!("stacks/{}", stack.name());
        let synthesized_stack_path = format!("{}/{}", working_directory, STACK_FILE);

        create_dir(&outdir.join(&working_directory))?;
        write_file(&outdir.join(&synthesized_stack_path), &stack.synth()?)?;

        manifest.stacks.insert(
            stack.name().to_string(),
            ManifestStack {
                name: stack.name().to_string(),
                construct_path: stack.name().to_string(),
                working_directory,
                synthesized_stack_path,
                annotations: vec![],
                dependencies: vec![],
            },
        );
    }

    let manifest_path = outdir.join(MANIFEST_FILE);
    let file_contents = match serde_json::to_string_pretty(&manifest) {
        Ok(contents) => contents,
        Err(error) => return Err(terraform::Error::SerializationError(error.to_string()).into()),
    };
    write_file(&manifest_path, &file_contents)?;

    return Ok(manifest_path);
}

fn create_dir(path: &Path) -> Result<(), Error> {
    return fs::create_dir_all(path).map_err(|error| Error::Io {
        path: path.display().to_string(),
        message: error.to_string(),
    });
}

fn write_file(path: &Path, contents: &str) -> Result<(), Error> {
    match fs::write(path, contents) {
        Ok(_) => (),
        Err(error) => {
            return Err(Error::Io {
                path: path.display().to_string(),
                message: error.to_string(),
            })
        }
    }

    tracing::info!(path = %path.display(), bytes = contents.len(), "Wrote file");
    return Ok(());
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::tempdir;

    use super::{write, Error, Manifest};
    use crate::terraform::{self, Stack};

    #[test]
    fn writes_stacks_and_manifest() {
        let dir = tempdir().unwrap();
        let outdir = dir.path().join("cdktf.out");

        let stacks = vec![Stack::new("dev"), Stack::new("prod")];
        let manifest_path = write(&outdir, &stacks).unwrap();

        assert_eq!(outdir.join("manifest.json"), manifest_path);

        let manifest: Manifest =
            serde_json::from_str(&fs::read_to_string(&manifest_path).unwrap()).unwrap();
        assert_eq!("0.20.8", manifest.version);
        assert_eq!(2, manifest.stacks.len());
        assert_eq!("stacks/dev/cdk.tf.json", manifest.stacks["dev"].synthesized_stack_path);
        assert_eq!("stacks/prod", manifest.stacks["prod"].working_directory);

        let synthesized: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(outdir.join("stacks/dev/cdk.tf.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(json!("dev"), synthesized["//"]["metadata"]["stackName"]);
    }

    #[test]
    fn manifest_uses_camel_case_keys() {
        let dir = tempdir().unwrap();

        let manifest_path = write(dir.path(), &[Stack::new("dev")]).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(manifest_path).unwrap()).unwrap();

        assert_eq!(
            json!({
                "name": "dev",
                "constructPath": "dev",
                "workingDirectory": "stacks/dev",
                "synthesizedStackPath": "stacks/dev/cdk.tf.json",
                "annotations": [],
                "dependencies": []
            }),
            raw["stacks"]["dev"]
        );
    }

    #[test]
    fn rejects_stack_names_outside_outdir() {
        let dir = tempdir().unwrap();
        let outdir = dir.path().join("nested").join("cdktf.out");

        for name in ["../../escaped", "..", "a/b", ""] {
            let result = write(&outdir, &[Stack::new("dev"), Stack::new(name)]);
            assert_eq!(
                Error::Synth(terraform::Error::InvalidId(String::from(name))),
                result.unwrap_err()
            );
        }

        assert_eq!(false, outdir.exists());
        assert_eq!(false, dir.path().join("escaped").exists());
        assert_eq!(false, dir.path().join("nested").join("escaped").exists());
    }

    #[test]
    fn outdir_is_a_file() {
        let dir = tempdir().unwrap();
        let outdir = dir.path().join("taken");
        fs::write(&outdir, "not a directory").unwrap();

        let result = write(&outdir, &[Stack::new("dev")]);
        match result.err().unwrap() {
            Error::Io { .. } => {}
            _ => panic!("Expected `Io` error"),
        }
    }
}
