// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime schema files.
//!
//! A schema declares a field table in TOML so mappings can be cast without
//! a compiled [`castfit::Structure`].

use castfit::{
    Annotation, AnnotationParseError, CastError, FieldTable, FieldTableBuilder, Map, TypeCatalog,
    Value,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Schema errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid type for field `{field}`: {source}")]
    Annotation {
        field: String,
        #[source]
        source: AnnotationParseError,
    },

    #[error("Invalid schema: {0}")]
    Invalid(String),

    #[error(transparent)]
    Cast(#[from] CastError),
}

/// Schema file contents.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    /// Record name, used in error messages.
    #[serde(default = "default_schema_name")]
    pub name: String,

    /// Declared fields, in order.
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

/// One `[[fields]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    /// Field name, also the input key.
    pub name: String,

    /// Annotation string (`int`, `optional[list[str]]`, ...).
    #[serde(rename = "type", default)]
    pub type_name: Option<String>,

    /// Default value; the type is inferred from it when `type` is absent.
    #[serde(default)]
    pub default: Option<toml::Value>,
}

fn default_schema_name() -> String {
    "schema".to_string()
}

impl SchemaConfig {
    /// Load a schema from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate a schema.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: SchemaConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check names and annotation strings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("schema name is empty".into()));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "{}: field with an empty name",
                    self.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "{}: field `{}` declared more than once",
                    self.name, field.name
                )));
            }
            if field.type_name.is_none() && field.default.is_none() {
                return Err(ConfigError::Invalid(format!(
                    "{}: field `{}` needs a type or a default",
                    self.name, field.name
                )));
            }
            field.annotation()?;
        }

        Ok(())
    }

    /// Build the field table, normalizing every type through `catalog`.
    pub fn to_field_table(&self, catalog: &TypeCatalog) -> Result<FieldTable, ConfigError> {
        let mut builder = FieldTableBuilder::new(&self.name);
        for field in &self.fields {
            builder = builder.declare(
                &field.name,
                field.annotation()?,
                field.default.clone().map(toml_to_value),
            );
        }
        Ok(builder.build(catalog)?)
    }
}

impl FieldConfig {
    /// Parsed annotation, if the field declares a type.
    pub fn annotation(&self) -> Result<Option<Annotation>, ConfigError> {
        self.type_name
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|source| ConfigError::Annotation {
                field: self.name.clone(),
                source,
            })
    }
}

/// TOML value as a castfit value. Datetimes stay textual; the datetime
/// converter parses them on cast.
pub fn toml_to_value(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::Str(s),
        toml::Value::Integer(i) => Value::Int(i),
        toml::Value::Float(f) => Value::Float(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::Str(dt.to_string()),
        toml::Value::Array(items) => Value::List(items.into_iter().map(toml_to_value).collect()),
        toml::Value::Table(table) => Value::Map(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_value(v)))
                .collect::<Map>(),
        ),
    }
}
