//! Reader for APX text definitions.
//!
//! ```text
//! definition := header (node)*
//! header     := 'APX/' uint '.' uint
//! node       := 'N' string type* port*
//! type       := 'T' string signature (':' type-attributes)?
//! port       := ('P' | 'R') string signature (':' port-attributes)?
//! ```
//!
//! Declarations are one per line and blank lines are ignored. The signature of
//! a line ends at the first `:` outside a quoted string; an empty attribute
//! list after the `:` is rejected.

use crate::ast::{PortAttributes, TypeAttributes, TypeDescriptor};
use crate::error::{SignatureError, SyntaxResult};
use crate::parser::{parse_port_attributes, parse_signature, parse_type_attributes};
use miette::SourceSpan;

/// A parsed APX text: the version of the header line and every node block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApxDefinition {
    /// `maj.min` of the `APX/` line.
    pub version: String,
    pub nodes: Vec<NodeDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDeclaration {
    pub name: String,
    pub types: Vec<TypeDeclaration>,
    pub provide_ports: Vec<PortDeclaration>,
    pub require_ports: Vec<PortDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    pub name: String,
    pub signature: String,
    pub descriptor: TypeDescriptor,
    pub attributes: TypeAttributes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDeclaration {
    pub name: String,
    pub signature: String,
    pub descriptor: TypeDescriptor,
    pub attributes: PortAttributes,
}

/// One non-blank line with its 1-based number and byte offset into the text.
struct Line<'a> {
    number: usize,
    offset: usize,
    text: &'a str,
}

struct DefinitionParser<'a> {
    src: &'a str,
}

/// Parses an APX text produced for a single node or for a whole context.
pub fn parse_definition(src: &str) -> SyntaxResult<ApxDefinition> {
    DefinitionParser { src }.parse()
}

impl<'a> DefinitionParser<'a> {
    fn parse(&self) -> SyntaxResult<ApxDefinition> {
        let mut lines = self.lines();
        let header = match lines.next() {
            Some(line) => line,
            None => {
                return Err(self.invalid(
                    1,
                    "missing `APX/<major>.<minor>` header".to_string(),
                    SourceSpan::new(0.into(), 0),
                ))
            }
        };
        let version = self.parse_header(&header)?;

        let mut nodes: Vec<NodeDeclaration> = Vec::new();
        for line in lines {
            let code = line.text.as_bytes()[0];
            match code {
                b'N' => {
                    let (name, rest) = self.split_name(&line)?;
                    if !rest.trim().is_empty() {
                        return Err(self.invalid_at(&line, 1 + name.1, "unexpected text after node name"));
                    }
                    if name.0.is_empty() {
                        return Err(self.invalid_at(&line, 1, "empty node name"));
                    }
                    log::trace!("definition line {}: node `{}`", line.number, name.0);
                    nodes.push(NodeDeclaration {
                        name: name.0,
                        types: Vec::new(),
                        provide_ports: Vec::new(),
                        require_ports: Vec::new(),
                    });
                }
                b'T' | b'P' | b'R' => {
                    let node = match nodes.last_mut() {
                        Some(node) => node,
                        None => {
                            return Err(self.invalid_at(&line, 0, "declaration before the first `N` line"))
                        }
                    };
                    let (name, rest) = self.split_name(&line)?;
                    if name.0.is_empty() {
                        return Err(self.invalid_at(&line, 1, "empty name"));
                    }
                    let (signature, attributes) = self.split_attributes(&line, 1 + name.1, rest)?;
                    let descriptor = parse_signature(signature).map_err(|e| line_error(&line, e))?;
                    if code == b'T' {
                        if !node.provide_ports.is_empty() || !node.require_ports.is_empty() {
                            return Err(self.invalid_at(&line, 0, "data types must be declared before ports"));
                        }
                        let attributes = match attributes {
                            Some(attrs) => parse_type_attributes(attrs).map_err(|e| line_error(&line, e))?,
                            None => TypeAttributes::default(),
                        };
                        node.types.push(TypeDeclaration {
                            name: name.0,
                            signature: signature.to_string(),
                            descriptor,
                            attributes,
                        });
                    } else {
                        let attributes = match attributes {
                            Some(attrs) => parse_port_attributes(attrs).map_err(|e| line_error(&line, e))?,
                            None => PortAttributes::default(),
                        };
                        let port = PortDeclaration {
                            name: name.0,
                            signature: signature.to_string(),
                            descriptor,
                            attributes,
                        };
                        if code == b'P' {
                            node.provide_ports.push(port);
                        } else {
                            node.require_ports.push(port);
                        }
                    }
                }
                _ => {
                    return Err(self.invalid_at(
                        &line,
                        0,
                        "unknown declaration; expected `N`, `T`, `P` or `R`",
                    ))
                }
            }
        }
        Ok(ApxDefinition { version, nodes })
    }

    fn lines(&self) -> impl Iterator<Item = Line<'a>> + 'a {
        let mut offset = 0;
        self.src
            .split('\n')
            .enumerate()
            .filter_map(move |(index, raw)| {
                let start = offset;
                offset += raw.len() + 1;
                let text = raw.strip_suffix('\r').unwrap_or(raw);
                if text.trim().is_empty() {
                    None
                } else {
                    Some(Line {
                        number: index + 1,
                        offset: start,
                        text,
                    })
                }
            })
    }

    fn parse_header(&self, line: &Line<'a>) -> SyntaxResult<String> {
        let version = line.text.trim_end().strip_prefix("APX/").ok_or_else(|| {
            self.invalid_at(line, 0, "expected `APX/<major>.<minor>` header")
        })?;
        let valid = match version.split_once('.') {
            Some((major, minor)) => {
                !major.is_empty()
                    && !minor.is_empty()
                    && major.bytes().all(|b| b.is_ascii_digit())
                    && minor.bytes().all(|b| b.is_ascii_digit())
            }
            None => false,
        };
        if !valid {
            return Err(self.invalid_at(line, 4, "version must be `<major>.<minor>`"));
        }
        Ok(version.to_string())
    }

    /// Reads the quoted name after the declaration code. Returns the unescaped
    /// name with the byte length of its quoted form, and the rest of the line.
    fn split_name(&self, line: &Line<'a>) -> SyntaxResult<((String, usize), &'a str)> {
        let text = &line.text[1..];
        if !text.starts_with('"') {
            return Err(self.invalid_at(line, 1, "expected a quoted name"));
        }
        let mut name = String::new();
        let mut chars = text.char_indices().skip(1);
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    if let Some((_, escaped)) = chars.next() {
                        name.push(escaped);
                    }
                }
                '"' => return Ok(((name, i + 1), &text[i + 1..])),
                c => name.push(c),
            }
        }
        Err(self.invalid_at(line, 1, "unterminated name"))
    }

    /// Splits `rest` at the first `:` outside a quoted string.
    fn split_attributes(
        &self,
        line: &Line<'a>,
        start: usize,
        rest: &'a str,
    ) -> SyntaxResult<(&'a str, Option<&'a str>)> {
        let mut in_string = false;
        let mut escaped = false;
        for (i, c) in rest.char_indices() {
            match c {
                _ if escaped => escaped = false,
                '\\' if in_string => escaped = true,
                '"' => in_string = !in_string,
                ':' if !in_string => {
                    let attributes = &rest[i + 1..];
                    if attributes.trim().is_empty() {
                        return Err(self.invalid_at(line, start + i, "empty attribute list after `:`"));
                    }
                    return Ok((&rest[..i], Some(attributes)));
                }
                _ => {}
            }
        }
        Ok((rest, None))
    }

    /// Error pointing at byte `column` of `line` up to the end of the line.
    fn invalid_at(&self, line: &Line<'a>, column: usize, message: &str) -> SignatureError {
        let column = column.min(line.text.len());
        self.invalid(
            line.number,
            message.to_string(),
            SourceSpan::new((line.offset + column).into(), line.text.len() - column),
        )
    }

    fn invalid(&self, line: usize, message: String, span: SourceSpan) -> SignatureError {
        SignatureError::InvalidDefinition {
            line,
            message,
            src: self.src.to_string(),
            span,
        }
    }
}

fn line_error(line: &Line<'_>, error: SignatureError) -> SignatureError {
    SignatureError::DefinitionLine {
        line: line.number,
        error: Box::new(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{IntRange, Literal, TypeRef};

    #[test]
    fn test_parse_single_node() {
        let src = "APX/1.2\nN\"TestNode\"\nT\"Mode_T\"C(0,3):VT(\"Off\",\"On\")\nP\"Status\"T[0]:=0\nR\"Mode\"T[\"Mode_T\"]:=3,P\n\n";
        let definition = parse_definition(src).unwrap();
        assert_eq!(definition.version, "1.2");
        assert_eq!(definition.nodes.len(), 1);

        let node = &definition.nodes[0];
        assert_eq!(node.name, "TestNode");
        assert_eq!(node.types[0].name, "Mode_T");
        assert_eq!(
            node.types[0].descriptor,
            TypeDescriptor::IntegerRange(IntRange::new(0, 3).unwrap())
        );
        assert_eq!(node.types[0].attributes.value_table, vec!["Off", "On"]);
        assert_eq!(node.provide_ports[0].name, "Status");
        assert_eq!(node.provide_ports[0].descriptor, TypeDescriptor::Reference(TypeRef::Index(0)));
        assert_eq!(node.provide_ports[0].attributes.init_value, Some(Literal::Integer(0)));
        assert_eq!(node.require_ports[0].signature, r#"T["Mode_T"]"#);
        assert!(node.require_ports[0].attributes.is_parameter);
    }

    #[test]
    fn test_parse_multiple_nodes_and_crlf() {
        let src = "APX/1.3\r\nN\"A\"\r\nP\"X\"C(0,7):=1\r\n\r\nN\"B\"\r\nR\"Y\"S\r\n";
        let definition = parse_definition(src).unwrap();
        assert_eq!(definition.version, "1.3");
        let names: Vec<_> = definition.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(definition.nodes[1].require_ports[0].descriptor, TypeDescriptor::Scalar);
    }

    #[test]
    fn test_colon_inside_quoted_field_name() {
        let src = "APX/1.2\nN\"A\"\nP\"X\"{\"a:b\"C}:={1}\n";
        let definition = parse_definition(src).unwrap();
        let port = &definition.nodes[0].provide_ports[0];
        assert_eq!(port.signature, r#"{"a:b"C}"#);
        assert_eq!(port.attributes.init_value, Some(Literal::List(vec![Literal::Integer(1)])));
    }

    #[test]
    fn test_structural_errors() {
        for (src, line) in [
            ("", 1),
            ("N\"A\"\n", 1),
            ("APX/1\n", 1),
            ("APX/1.2\nP\"X\"C\n", 2),
            ("APX/1.2\nN\"A\"\nP\"X\"C\nT\"T\"C\n", 4),
            ("APX/1.2\nN\"A\"\nP\"X\"C:\n", 3),
            ("APX/1.2\nN\"A\"\nX\"X\"C\n", 3),
            ("APX/1.2\nN\"A\n", 2),
            ("APX/1.2\nN\"\"\n", 2),
        ] {
            match parse_definition(src) {
                Err(SignatureError::InvalidDefinition { line: found, .. }) => {
                    assert_eq!(found, line, "wrong line for {:?}", src)
                }
                other => panic!("Expected InvalidDefinition for {:?}, got {:?}", src, other),
            }
        }
    }

    #[test]
    fn test_signature_error_carries_line() {
        match parse_definition("APX/1.2\nN\"A\"\n\nP\"X\"C(5,1)\n") {
            Err(SignatureError::DefinitionLine { line, error }) => {
                assert_eq!(line, 4);
                assert!(matches!(*error, SignatureError::InvalidRange { .. }));
            }
            other => panic!("Expected DefinitionLine, got {:?}", other),
        }
    }

    #[test]
    fn test_header_only_has_no_nodes() {
        assert!(parse_definition("APX/1.2\n").unwrap().nodes.is_empty());
    }
}
