pub mod payload;
pub mod validation;

use jsonschema::{Draft, JSONSchema};
use schemars::schema::RootSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{fmt, sync::Arc};

pub use payload::{ActivityPayload, DayPayload, ItineraryPayload};
pub use validation::validate;

/// Generated JSON Schema of a provider payload, with its Draft 7 validator compiled once.
#[derive(Clone)]
pub struct SchemaHandle {
    schema_name: &'static str,
    schema_json: Arc<Value>,
    validator: Arc<JSONSchema>,
}

impl fmt::Debug for SchemaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaHandle")
            .field("schema_name", &self.schema_name)
            .finish_non_exhaustive()
    }
}

impl SchemaHandle {
    /// Serialize and compile a schemars root schema.
    ///
    /// Panics if the generated schema cannot be serialized or compiled; both
    /// depend only on the payload types, never on runtime input.
    pub fn from_root_schema(schema_name: &'static str, root: RootSchema) -> Self {
        let schema_json = serde_json::to_value(root)
            .unwrap_or_else(|err| panic!("failed to serialize `{}` schema: {}", schema_name, err));
        let validator = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&schema_json)
            .unwrap_or_else(|err| panic!("failed to compile `{}` schema: {}", schema_name, err));

        Self {
            schema_name,
            schema_json: Arc::new(schema_json),
            validator: Arc::new(validator),
        }
    }

    pub fn schema_name(&self) -> &'static str {
        self.schema_name
    }

    pub fn schema_json(&self) -> &Value {
        self.schema_json.as_ref()
    }

    pub(crate) fn validator(&self) -> &JSONSchema {
        self.validator.as_ref()
    }
}

/// A type the provider is asked to produce, with its schema built once per process.
pub trait CompletionSchema: DeserializeOwned + Send + Sync + 'static {
    fn schema() -> &'static SchemaHandle;
}
