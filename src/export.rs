use std::fs;
use std::path::{Path, PathBuf};

use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::info;

use crate::error::{ImportError, Result};
use crate::model::root::RootModel;

/// Compiled once from the embedded schema, so every export is checked
/// against the same contract.
static EXPORT_SCHEMA: Lazy<JSONSchema> = Lazy::new(|| {
    let schema: Value = serde_json::from_str(include_str!("../schemas/export.v1.json"))
        .expect("embedded export schema is valid JSON");
    // jsonschema borrows the schema for the validator's lifetime.
    let schema: &'static Value = Box::leak(Box::new(schema));
    JSONSchema::options()
        .compile(schema)
        .expect("embedded export schema compiles")
});

/// Writes a finished model to its destination. Format-level validation
/// (schema conformance) belongs here; semantic rules live in the validator.
pub trait Exporter {
    fn export(&self, model: &RootModel) -> Result<()>;
}

/// Exports the model as pretty-printed JSON, schema-checked before a single
/// byte hits the disk.
pub struct JsonExporter {
    path: PathBuf,
}

impl JsonExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Exporter for JsonExporter {
    fn export(&self, model: &RootModel) -> Result<()> {
        let value = serde_json::to_value(model)?;
        check_schema(&value)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&value)?)?;
        info!(path = %self.path.display(), "wrote export");
        Ok(())
    }
}

/// Checks a serialized model against the export schema. All schema errors
/// are reported together, not just the first.
pub fn check_schema(value: &Value) -> Result<()> {
    if let Err(errors) = EXPORT_SCHEMA.validate(value) {
        let details: Vec<String> = errors
            .map(|error| format!("{} at {}", error, error.instance_path))
            .collect();
        return Err(ImportError::Schema(details.join("; ")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coworker, Organization};
    use serde_json::json;

    fn small_model() -> RootModel {
        let mut model = RootModel::new();
        let mut anna = Coworker::new("7");
        anna.first_name = Some("Anna".to_string());
        model.add_coworker(anna);
        model.add_organization(Organization::new("1", "Acme"));
        model
    }

    #[test]
    fn serialized_model_conforms_to_the_schema() {
        let value = serde_json::to_value(small_model()).unwrap();
        check_schema(&value).unwrap();
    }

    #[test]
    fn schema_rejects_malformed_exports() {
        let mut value = serde_json::to_value(small_model()).unwrap();
        value["notes"] = json!([{
            "attached_to": { "organization": "1", "deal": "9" },
            "text": "",
            "classification": "Comment",
            "created_by": "import"
        }]);

        let err = check_schema(&value).unwrap_err();
        assert!(matches!(err, ImportError::Schema(_)));
    }

    #[test]
    fn exporter_writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("export.json");
        JsonExporter::new(&path).export(&small_model()).unwrap();

        let written: Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["import_coworker"], "import");
        assert_eq!(written["organizations"][0]["name"], "Acme");
    }
}
