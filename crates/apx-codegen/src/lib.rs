//! Artifact generation for finalized APX nodes.
//!
//! - [`NodeGenerator`] emits a C header and source per node with one accessor
//!   per port.
//! - [`Context`] combines several nodes into one APX text file, and reads
//!   such a file back with [`Context::from_apx_text`].
//! - [`GeneratorConfig`] holds the settings both share and can be loaded
//!   from TOML.
//!
//! ```no_run
//! use apx_codegen::{Context, GenerateOptions, NodeGenerator};
//! use apx_node::{DataType, NodeBuilder, Port};
//! use std::sync::Arc;
//!
//! # fn main() -> miette::Result<()> {
//! let mut builder = NodeBuilder::new("TestNode");
//! builder.append(DataType::new("Mode_T", "C(0,15)")?)?;
//! builder.append(Port::provide("Status", r#"T["Mode_T"]"#, Some("=0"))?)?;
//! let node = Arc::new(builder.finalize()?);
//!
//! let options = GenerateOptions::new().direct_write(["Status"]);
//! NodeGenerator::new().generate("generated", &node, &options)?;
//! Context::new().append(node)?.generate_apx("generated")?;
//! # Ok(())
//! # }
//! ```

pub mod apx_text;
mod cgen;
mod config;
mod context;
mod error;
mod generator;
mod writer;

pub use config::{GeneratorConfig, ReferenceStyle};
pub use context::Context;
pub use error::{CodegenError, CodegenResult};
pub use generator::{GenerateOptions, GeneratedSource, NodeGenerator};
pub use writer::{write_artifacts, Artifact};
