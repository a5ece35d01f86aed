// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Castfit command-line support
//!
//! Schema files and argument parsing behind the `castfit-cli` binary.
//!
//! # Quick Start
//!
//! ```bash
//! # Cast a JSON payload
//! castfit-cli cast --type "list[int]" --json '["1", 2.0]'
//!
//! # Check without coercion
//! castfit-cli check --type "dict[str, float]" --file payload.json
//!
//! # Show how an annotation normalizes
//! castfit-cli describe --type "int | none | str"
//!
//! # Cast KEY=VALUE arguments against a schema
//! castfit-cli args --schema server.toml port=8080 tag=a tag=b
//! ```
//!
//! # Schema File
//!
//! ```toml
//! name = "Server"
//!
//! [[fields]]
//! name = "host"
//! type = "str"
//! default = "localhost"
//!
//! [[fields]]
//! name = "port"
//! type = "int"
//!
//! [[fields]]
//! name = "tag"
//! type = "list[str]"
//! default = []
//! ```

pub mod input;
pub mod schema;

pub use input::{parse_assignments, parse_json, InputError};
pub use schema::{ConfigError, FieldConfig, SchemaConfig};
