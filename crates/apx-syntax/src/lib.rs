//! Parsing of APX data signatures and attribute strings.
//!
//! A data signature is the compact textual encoding of a data type used in
//! APX node definitions: `C(0,15)` is an integer range, `S` a 32-bit scalar,
//! `s` a 16-bit signed integer, `b` a boolean, `a[8]` an 8 byte string,
//! `T["Mode_T"]` a reference to a named type and `{"Id"C"Value"S}` a record.
//! Any element may be followed by `[N]` to form an array.
//!
//! Attribute strings carry the init value and flags of ports (`=3, P`,
//! `Q[10]`) and the value tables of data types (`VT("Off","On")`).
//!
//! [`parse_definition`] reads a whole APX text definition back into node
//! declarations.

pub mod ast;
pub mod definition;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::{
    CharUnit, FixedInt, IntRange, IntegerType, Literal, PortAttributes, RecordField,
    TypeAttributes, TypeDescriptor, TypeRef, SCALAR_MAX, SCALAR_MIN, SCALAR_WIDTH,
};
pub use definition::{
    parse_definition, ApxDefinition, NodeDeclaration, PortDeclaration, TypeDeclaration,
};
pub use error::{SignatureError, SyntaxResult};
pub use parser::{parse_literal, parse_port_attributes, parse_signature, parse_type_attributes};
