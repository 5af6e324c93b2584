//! In-memory Terraform stack and its JSON synthesis.
//!
//! Blocks are stored as `serde_json::Value` keyed by Terraform type and
//! logical id. Every map is a `BTreeMap` so the synthesized document is
//! byte-stable between runs.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde_json::{json, Value};

/// Version stamped into the stack metadata and the synth manifest.
pub const SYNTH_VERSION: &str = "0.20.8";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Construct id `{0}` is already used in this stack")]
    DuplicateId(String),

    #[error("Invalid construct id `{0}`")]
    InvalidId(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// A provider configuration block, e.g. `provider "aws" {}`.
pub trait Provider: Serialize {
    /// Local name used in `provider` and `required_providers`.
    const NAME: &'static str;
    /// Registry source address.
    const SOURCE: &'static str;
    /// Version constraint.
    const VERSION: &'static str;
}

/// A managed resource, e.g. `resource "aws_iam_role" "x" {}`.
pub trait Resource: Serialize {
    const TYPE: &'static str;
}

/// A data source, e.g. `data "aws_iam_policy_document" "x" {}`.
pub trait DataSource: Serialize {
    const TYPE: &'static str;
}

/// Typed reference to a declared block.
///
/// Attribute accessors return interpolation tokens that the provisioning
/// engine resolves at apply time.
pub struct Handle<T> {
    address: String,
    kind: PhantomData<T>,
}

impl<T> Handle<T> {
    fn new(address: String) -> Self {
        return Self {
            address,
            kind: PhantomData,
        };
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// `${<address>.<attribute>}`
    pub fn get(&self, attribute: &str) -> String {
        return format!("${{{}.{}}}", self.address, attribute);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.address).finish()
    }
}

/// Escapes template sequences so Terraform emits them literally.
pub fn raw_string(value: &str) -> String {
    return value.replace("${", "$${").replace("%{", "%%{");
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct RequiredProvider {
    source: &'static str,
    version: &'static str,
}

type Blocks = BTreeMap<&'static str, BTreeMap<String, Value>>;

#[derive(Debug)]
pub struct Stack {
    name: String,
    providers: BTreeMap<&'static str, Vec<Value>>,
    required_providers: BTreeMap<&'static str, RequiredProvider>,
    data: Blocks,
    resources: Blocks,
    ids: BTreeSet<String>,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        return Self {
            name: name.into(),
            providers: BTreeMap::new(),
            required_providers: BTreeMap::new(),
            data: BTreeMap::new(),
            resources: BTreeMap::new(),
            ids: BTreeSet::new(),
        };
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of declared resources and data sources.
    pub fn block_count(&self) -> usize {
        self.ids.len()
    }

    /// Registers a provider configuration. A second configuration of the
    /// same provider is appended; the `required_providers` entry is shared.
    pub fn provider<P: Provider>(&mut self, provider: &P) -> Result<(), Error> {
        let body = to_value(provider)?;

        self.required_providers
            .entry(P::NAME)
            .or_insert(RequiredProvider {
                source: P::SOURCE,
                version: P::VERSION,
            });
        self.providers.entry(P::NAME).or_default().push(body);

        tracing::debug!(provider = P::NAME, source = P::SOURCE, "Declared provider");
        return Ok(());
    }

    pub fn resource<R: Resource>(&mut self, id: &str, resource: &R) -> Result<Handle<R>, Error> {
        let body = self.block_body(id, resource)?;
        self.resources
            .entry(R::TYPE)
            .or_default()
            .insert(id.to_string(), body);

        let handle = Handle::new(format!("{}.{}", R::TYPE, id));
        tracing::debug!(address = handle.address(), "Declared resource");
        return Ok(handle);
    }

    pub fn data<D: DataSource>(&mut self, id: &str, data: &D) -> Result<Handle<D>, Error> {
        let body = self.block_body(id, data)?;
        self.data
            .entry(D::TYPE)
            .or_default()
            .insert(id.to_string(), body);

        let handle = Handle::new(format!("data.{}.{}", D::TYPE, id));
        tracing::debug!(address = handle.address(), "Declared data source");
        return Ok(handle);
    }

    /// Claims `id` and serializes `block` with its construct metadata.
    fn block_body<T: Serialize>(&mut self, id: &str, block: &T) -> Result<Value, Error> {
        if !is_valid_id(id) {
            return Err(Error::InvalidId(id.to_string()));
        }
        if self.ids.contains(id) {
            return Err(Error::DuplicateId(id.to_string()));
        }

        let mut body = to_value(block)?;
        match body.as_object_mut() {
            Some(object) => {
                object.insert(
                    String::from("//"),
                    json!({
                        "metadata": {
                            "path": format!("{}/{}", self.name, id),
                            "uniqueId": id,
                        }
                    }),
                );
            }
            None => {
                return Err(Error::SerializationError(format!(
                    "block `{}` did not serialize to an object",
                    id
                )))
            }
        }

        self.ids.insert(id.to_string());
        return Ok(body);
    }

    pub fn to_json(&self) -> Value {
        let mut root = serde_json::Map::new();
        root.insert(
            String::from("//"),
            json!({
                "metadata": {
                    "backend": "local",
                    "stackName": self.name,
                    "version": SYNTH_VERSION,
                },
                "outputs": {},
            }),
        );
        if !self.data.is_empty() {
            root.insert(String::from("data"), json!(self.data));
        }
        if !self.providers.is_empty() {
            root.insert(String::from("provider"), json!(self.providers));
        }
        if !self.resources.is_empty() {
            root.insert(String::from("resource"), json!(self.resources));
        }
        root.insert(
            String::from("terraform"),
            json!({ "required_providers": self.required_providers }),
        );

        return Value::Object(root);
    }

    /// Pretty-printed Terraform JSON.
    pub fn synth(&self) -> Result<String, Error> {
        return serde_json::to_string_pretty(&self.to_json())
            .map_err(|error| Error::SerializationError(error.to_string()));
    }
}

/// Construct ids and stack names: non-empty ASCII alphanumerics, `_` and `-`.
/// Stack names become directory names in the synth output.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, Error> {
    return serde_json::to_value(value).map_err(|error| Error::SerializationError(error.to_string()));
}

#[cfg(test)]
mod tests {
    use serde::Serialize;
    use serde_json::json;

    use super::{raw_string, DataSource, Error, Provider, Resource, Stack};

    #[derive(Serialize)]
    struct Bucket {
        bucket: String,
    }

    impl Resource for Bucket {
        const TYPE: &'static str = "test_bucket";
    }

    #[derive(Serialize)]
    struct Lookup {
        key: String,
    }

    impl DataSource for Lookup {
        const TYPE: &'static str = "test_lookup";
    }

    #[derive(Serialize)]
    struct TestProvider {
        #[serde(skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
    }

    impl Provider for TestProvider {
        const NAME: &'static str = "test";
        const SOURCE: &'static str = "example/test";
        const VERSION: &'static str = "~> 1.0";
    }

    fn bucket(name: &str) -> Bucket {
        Bucket {
            bucket: String::from(name),
        }
    }

    #[test]
    fn handles_render_interpolation_tokens() {
        let mut stack = Stack::new("test");
        let resource = stack.resource("Logs", &bucket("logs")).unwrap();
        let data = stack
            .data(
                "Lookup",
                &Lookup {
                    key: String::from("k"),
                },
            )
            .unwrap();

        assert_eq!("test_bucket.Logs", resource.address());
        assert_eq!("${test_bucket.Logs.arn}", resource.get("arn"));
        assert_eq!("${data.test_lookup.Lookup.json}", data.get("json"));
    }

    #[test]
    fn rejects_duplicate_ids_across_block_kinds() {
        let mut stack = Stack::new("test");
        stack.resource("Shared", &bucket("a")).unwrap();

        let result = stack.resource("Shared", &bucket("b"));
        assert_eq!(Error::DuplicateId(String::from("Shared")), result.unwrap_err());

        let result = stack.data(
            "Shared",
            &Lookup {
                key: String::from("k"),
            },
        );
        assert_eq!(Error::DuplicateId(String::from("Shared")), result.unwrap_err());
        assert_eq!(1, stack.block_count());
    }

    #[test]
    fn rejects_invalid_ids() {
        let mut stack = Stack::new("test");

        for id in ["", "has space", "dot.ted", "slash/ed"] {
            match stack.resource(id, &bucket("a")) {
                Err(Error::InvalidId(_)) => {}
                other => panic!("Expected `InvalidId` for {:?}, got {:?}", id, other),
            }
        }
        assert_eq!(0, stack.block_count());
    }

    #[test]
    fn synthesizes_blocks_with_metadata() {
        let mut stack = Stack::new("demo");
        stack.provider(&TestProvider { alias: None }).unwrap();
        stack
            .provider(&TestProvider {
                alias: Some(String::from("west")),
            })
            .unwrap();
        stack.resource("Logs", &bucket("logs")).unwrap();

        let expected = json!({
            "//": {
                "metadata": { "backend": "local", "stackName": "demo", "version": "0.20.8" },
                "outputs": {}
            },
            "provider": { "test": [{}, { "alias": "west" }] },
            "resource": {
                "test_bucket": {
                    "Logs": {
                        "//": { "metadata": { "path": "demo/Logs", "uniqueId": "Logs" } },
                        "bucket": "logs"
                    }
                }
            },
            "terraform": {
                "required_providers": {
                    "test": { "source": "example/test", "version": "~> 1.0" }
                }
            }
        });
        assert_eq!(expected, stack.to_json());
    }

    #[test]
    fn synth_is_stable() {
        let build = || {
            let mut stack = Stack::new("demo");
            stack.resource("B", &bucket("b")).unwrap();
            stack.resource("A", &bucket("a")).unwrap();
            stack.synth().unwrap()
        };

        let first = build();
        assert_eq!(first, build());
        assert_eq!(true, first.find("\"A\"").unwrap() < first.find("\"B\"").unwrap());
    }

    #[test]
    fn raw_string_escapes_template_sequences() {
        assert_eq!(
            "$${{ github.run_id }}-$${{ github.run_attempt }}",
            raw_string("${{ github.run_id }}-${{ github.run_attempt }}")
        );
        assert_eq!("%%{ if x }", raw_string("%{ if x }"));
        assert_eq!(".github/workflows/hello-world.yml", raw_string(".github/workflows/hello-world.yml"));
    }
}
