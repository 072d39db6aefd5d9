//! Node model of the APX interface compiler.
//!
//! A [`NodeBuilder`] collects [`DataType`]s and [`Port`]s, validating each one
//! as it is appended. [`NodeBuilder::finalize`] turns it into an immutable
//! [`Node`] with the byte layout of its provide and require buffers.
//!
//! ```
//! use apx_node::{DataType, NodeBuilder, Port};
//!
//! let mut builder = NodeBuilder::new("N");
//! builder.append(DataType::new("Mode_T", "C(0,15)")?)?;
//! builder.append(Port::provide("Status", r#"T["Mode_T"]"#, Some("=0"))?)?;
//! builder.append(Port::require("Mode", r#"T["Mode_T"]"#, Some("=15"))?)?;
//!
//! let node = builder.finalize()?;
//! assert_eq!(node.provide_buffer_size(), 1);
//! assert_eq!(node.require_buffer_size(), 1);
//! # Ok::<(), apx_node::NodeError>(())
//! ```
//!
//! Nodes can also be read back from APX text with
//! [`NodeBuilder::from_apx_text`] and [`parse_nodes`].

mod autosar;
mod data_type;
mod definition;
mod error;
mod node;
mod port;
mod registry;
mod value;

pub use autosar::{ComponentDataType, ComponentPort, SoftwareComponent};
pub use data_type::DataType;
pub use definition::parse_nodes;
pub use error::{NodeError, NodeResult};
pub use node::{Node, NodeBuilder, NodeElement, NodePort};
pub use port::{Port, PortDirection};
pub use registry::{TypeId, TypeRegistry};
