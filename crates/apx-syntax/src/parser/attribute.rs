use super::Parser;
use crate::ast::{Literal, PortAttributes, TypeAttributes};
use crate::error::{SignatureError, SyntaxResult};
use crate::lexer::{parse_int, unquote, TokenKind};
use miette::SourceSpan;

fn invalid(src: &str, message: String, span: SourceSpan) -> SignatureError {
    SignatureError::InvalidAttribute {
        message,
        src: src.to_string(),
        span,
    }
}

/// Parses a port attribute list such as `=3`, `=3, P`, `Q[10]` or `={1, 2}`.
pub fn parse_port_attributes(src: &str) -> SyntaxResult<PortAttributes> {
    let mut parser = Parser::new(src);
    let mut attrs = PortAttributes::default();
    if parser.at_end() {
        return Ok(attrs);
    }
    loop {
        let tok = match parser.next() {
            Some(tok) => tok,
            None => {
                return Err(invalid(src, "expected an attribute after `,`".to_string(), parser.end_span()))
            }
        };
        match tok.kind {
            TokenKind::Eq => {
                if attrs.init_value.is_some() {
                    return Err(invalid(src, "init value given twice".to_string(), tok.span));
                }
                attrs.init_value = Some(parser.parse_literal_value()?);
            }
            TokenKind::Ident if tok.lexeme == "P" => {
                attrs.is_parameter = true;
            }
            TokenKind::Ident if tok.lexeme == "Q" => {
                if attrs.queue_length.is_some() {
                    return Err(invalid(src, "queue length given twice".to_string(), tok.span));
                }
                attrs.queue_length = Some(parser.parse_queue_length()?);
            }
            _ => {
                return Err(invalid(
                    src,
                    format!("unknown port attribute `{}`", tok.lexeme),
                    tok.span,
                ))
            }
        }
        match parser.next() {
            None => return Ok(attrs),
            Some(tok) if tok.kind == TokenKind::Comma => continue,
            Some(tok) => {
                return Err(invalid(
                    src,
                    format!("expected `,` between attributes, found `{}`", tok.lexeme),
                    tok.span,
                ))
            }
        }
    }
}

/// Parses a data type attribute list. Only `VT("A","B",...)` is understood.
pub fn parse_type_attributes(src: &str) -> SyntaxResult<TypeAttributes> {
    let mut parser = Parser::new(src);
    let mut attrs = TypeAttributes::default();
    while let Some(tok) = parser.next() {
        if tok.kind != TokenKind::Ident || tok.lexeme != "VT" {
            return Err(invalid(
                src,
                format!("unknown type attribute `{}`", tok.lexeme),
                tok.span,
            ));
        }
        if !attrs.value_table.is_empty() {
            return Err(invalid(src, "value table given twice".to_string(), tok.span));
        }
        let error = |message, span| invalid(src, message, span);
        parser.expect(TokenKind::LParen, "`(` after VT", error)?;
        loop {
            let label = parser.expect(TokenKind::Str, "a quoted value label", error)?;
            attrs.value_table.push(unquote(label.lexeme));
            match parser.next() {
                Some(t) if t.kind == TokenKind::Comma => continue,
                Some(t) if t.kind == TokenKind::RParen => break,
                Some(t) => {
                    return Err(invalid(
                        src,
                        format!("expected `,` or `)`, found `{}`", t.lexeme),
                        t.span,
                    ))
                }
                None => {
                    return Err(invalid(
                        src,
                        "unterminated value table".to_string(),
                        parser.end_span(),
                    ))
                }
            }
        }
        if let Some(t) = parser.next() {
            if t.kind != TokenKind::Comma {
                return Err(invalid(
                    src,
                    format!("expected `,` between attributes, found `{}`", t.lexeme),
                    t.span,
                ));
            }
        }
    }
    Ok(attrs)
}

/// Parses a standalone literal: integer, quoted string or `{...}` list.
pub fn parse_literal(src: &str) -> SyntaxResult<Literal> {
    let mut parser = Parser::new(src);
    let literal = parser.parse_literal_value()?;
    if let Some(tok) = parser.next() {
        return Err(invalid(
            src,
            format!("unexpected `{}` after literal", tok.lexeme),
            tok.span,
        ));
    }
    Ok(literal)
}

impl<'a> Parser<'a> {
    /// `[N]` after `Q`, with `N >= 1`.
    fn parse_queue_length(&mut self) -> SyntaxResult<u32> {
        let src = self.src();
        let error = |message, span| invalid(src, message, span);
        self.expect(TokenKind::LBracket, "`[` after Q", error)?;
        let tok = self.expect(TokenKind::Number, "a queue length", error)?;
        let len = parse_int(tok.lexeme)
            .filter(|len| *len >= 1)
            .and_then(|len| u32::try_from(len).ok())
            .ok_or_else(|| {
                invalid(
                    src,
                    format!("queue length `{}` must be a positive 32-bit integer", tok.lexeme),
                    tok.span,
                )
            })?;
        self.expect(TokenKind::RBracket, "`]`", error)?;
        Ok(len)
    }

    fn parse_literal_value(&mut self) -> SyntaxResult<Literal> {
        let src = self.src();
        match self.next() {
            Some(tok) if tok.kind == TokenKind::Number => parse_int(tok.lexeme)
                .map(Literal::Integer)
                .ok_or_else(|| invalid(src, format!("integer `{}` is out of range", tok.lexeme), tok.span)),
            Some(tok) if tok.kind == TokenKind::Str => Ok(Literal::String(unquote(tok.lexeme))),
            Some(tok) if tok.kind == TokenKind::LBrace => {
                let mut items = Vec::new();
                if self.peek_is(TokenKind::RBrace) {
                    self.next();
                    return Ok(Literal::List(items));
                }
                loop {
                    items.push(self.parse_literal_value()?);
                    match self.next() {
                        Some(t) if t.kind == TokenKind::Comma => continue,
                        Some(t) if t.kind == TokenKind::RBrace => return Ok(Literal::List(items)),
                        Some(t) => {
                            return Err(invalid(
                                src,
                                format!("expected `,` or `}}`, found `{}`", t.lexeme),
                                t.span,
                            ))
                        }
                        None => {
                            return Err(invalid(src, "unterminated list".to_string(), self.end_span()))
                        }
                    }
                }
            }
            Some(tok) => Err(invalid(
                src,
                format!("expected a literal value, found `{}`", tok.lexeme),
                tok.span,
            )),
            None => Err(invalid(
                src,
                "unexpected end of input; expected a literal value".to_string(),
                self.end_span(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_value() {
        let attrs = parse_port_attributes("=0").unwrap();
        assert_eq!(attrs.init_value, Some(Literal::Integer(0)));
        assert!(!attrs.is_parameter);
    }

    #[test]
    fn test_init_value_and_parameter() {
        let attrs = parse_port_attributes("=3, P").unwrap();
        assert_eq!(attrs.init_value, Some(Literal::Integer(3)));
        assert!(attrs.is_parameter);

        let attrs = parse_port_attributes("P").unwrap();
        assert_eq!(attrs.init_value, None);
        assert!(attrs.is_parameter);
    }

    #[test]
    fn test_queue_length() {
        let attrs = parse_port_attributes("Q[10]").unwrap();
        assert_eq!(attrs.queue_length, Some(10));
        assert_eq!(attrs.init_value, None);

        let attrs = parse_port_attributes("Q[3], P").unwrap();
        assert_eq!(attrs.queue_length, Some(3));
        assert!(attrs.is_parameter);
        assert_eq!(attrs.to_string(), "Q[3],P");
    }

    #[test]
    fn test_empty_attribute_string() {
        assert!(parse_port_attributes("").unwrap().is_empty());
        assert!(parse_port_attributes("  ").unwrap().is_empty());
    }

    #[test]
    fn test_nested_list_literal() {
        let literal = parse_literal(r#"{ {1, 2, {3, 4}}, {"test2", 0xFF}, -8}"#).unwrap();
        assert_eq!(
            literal,
            Literal::List(vec![
                Literal::List(vec![
                    Literal::Integer(1),
                    Literal::Integer(2),
                    Literal::List(vec![Literal::Integer(3), Literal::Integer(4)]),
                ]),
                Literal::List(vec![Literal::String("test2".to_string()), Literal::Integer(255)]),
                Literal::Integer(-8),
            ])
        );
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(parse_literal(r#""""#).unwrap(), Literal::String(String::new()));
        assert_eq!(parse_literal(r#""test""#).unwrap(), Literal::String("test".to_string()));
    }

    #[test]
    fn test_missing_equals_is_rejected() {
        // `P, {..}` is missing the `=` in front of the init value
        assert!(matches!(
            parse_port_attributes(r#"P, {{255, 0}, ""}"#),
            Err(SignatureError::InvalidAttribute { .. })
        ));
        assert!(parse_port_attributes(r#"P, ={{255, 0}, ""}"#).is_ok());
    }

    #[test]
    fn test_malformed_port_attributes() {
        for src in ["=", "=3 P", "=1,", "Q", "Q[0]", "Q[10],Q[2]", "={1,2", "=3,=4"] {
            assert!(
                matches!(parse_port_attributes(src), Err(SignatureError::InvalidAttribute { .. })),
                "{:?} should be rejected",
                src
            );
        }
    }

    #[test]
    fn test_value_table() {
        let attrs = parse_type_attributes(r#"VT("OffOn_Off", "OffOn_On", "OffOn_Error")"#).unwrap();
        assert_eq!(attrs.value_table, vec!["OffOn_Off", "OffOn_On", "OffOn_Error"]);
        assert_eq!(attrs.to_string(), r#"VT("OffOn_Off","OffOn_On","OffOn_Error")"#);
    }

    #[test]
    fn test_malformed_type_attributes() {
        for src in ["VT(", "VT()", "RS(0,1)", r#"VT("a" "b")"#] {
            assert!(
                matches!(parse_type_attributes(src), Err(SignatureError::InvalidAttribute { .. })),
                "{:?} should be rejected",
                src
            );
        }
    }
}
