//! Data signature grammar:
//!
//! ```text
//! element := base suffix*
//! base    := 'C' limits? | int limits? | 'b' | 'S' | 'a' | text
//!          | 'T' '[' (string | uint) ']' | '{' (string element)+ '}'
//! int     := 'c' | 's' | 'l' | 'q' | 'B' | 'L' | 'Q'
//! text    := 'A' | 'u' | 'U'
//! limits  := '(' int ',' int ')'
//! suffix  := '[' uint ']'
//! ```
//!
//! The length of `a`, `A`, `u` and `U` is read from the first suffix; further
//! suffixes make arrays.

use super::Parser;
use crate::ast::{CharUnit, FixedInt, IntRange, IntegerType, RecordField, TypeDescriptor, TypeRef};
use crate::error::{SignatureError, SyntaxResult};
use crate::lexer::{parse_int, unquote, Token, TokenKind};
use miette::SourceSpan;
use std::collections::HashSet;

/// Parses a complete data signature such as `C(0,15)`, `S`, `a[8]`,
/// `T["Mode_T"]` or `{"Id"C"Value"S}[4]`.
pub fn parse_signature(src: &str) -> SyntaxResult<TypeDescriptor> {
    let mut parser = Parser::new(src);
    if parser.at_end() {
        return Err(invalid(src, "empty signature".to_string(), parser.end_span()));
    }
    let ty = parser.parse_element()?;
    if let Some(tok) = parser.next() {
        return Err(invalid(
            src,
            format!("unexpected `{}` after complete signature", tok.lexeme),
            tok.span,
        ));
    }
    Ok(ty)
}

fn invalid(src: &str, message: String, span: SourceSpan) -> SignatureError {
    SignatureError::InvalidSignature {
        message,
        src: src.to_string(),
        span,
    }
}

impl<'a> Parser<'a> {
    fn invalid_signature(&self) -> impl FnOnce(String, SourceSpan) -> SignatureError + 'a {
        let src = self.src();
        move |message, span| invalid(src, message, span)
    }

    fn unknown_type_code(&self, tok: Token<'a>) -> SignatureError {
        SignatureError::UnknownTypeCode {
            code: tok.lexeme.to_string(),
            src: self.src().to_string(),
            span: tok.span,
        }
    }

    pub(crate) fn parse_element(&mut self) -> SyntaxResult<TypeDescriptor> {
        let tok = match self.next() {
            Some(tok) => tok,
            None => {
                return Err(invalid(
                    self.src(),
                    "unexpected end of signature; expected a type code".to_string(),
                    self.end_span(),
                ))
            }
        };

        let mut ty = match tok.kind {
            TokenKind::Ident => match tok.lexeme {
                "C" => {
                    let range = if self.peek_is(TokenKind::LParen) {
                        let (min, max, span) = self.parse_limits()?;
                        i64::try_from(min)
                            .ok()
                            .zip(i64::try_from(max).ok())
                            .and_then(|(lo, hi)| IntRange::new(lo, hi))
                            .ok_or_else(|| self.invalid_range(min, max, span))?
                    } else {
                        IntRange::UINT8
                    };
                    TypeDescriptor::IntegerRange(range)
                }
                "b" => TypeDescriptor::Bool,
                "S" => TypeDescriptor::Scalar,
                "a" => TypeDescriptor::String {
                    len: self.parse_optional_len()?,
                },
                "T" => TypeDescriptor::Reference(self.parse_type_ref()?),
                code => {
                    if let Some(int_ty) = IntegerType::from_code(code) {
                        let int = if self.peek_is(TokenKind::LParen) {
                            let (min, max, span) = self.parse_limits()?;
                            FixedInt::with_limits(int_ty, min, max)
                                .ok_or_else(|| self.invalid_range(min, max, span))?
                        } else {
                            FixedInt::new(int_ty)
                        };
                        TypeDescriptor::Integer(int)
                    } else if let Some(unit) = CharUnit::from_code(code) {
                        TypeDescriptor::Text {
                            unit,
                            len: self.parse_optional_len()?,
                        }
                    } else {
                        return Err(self.unknown_type_code(tok));
                    }
                }
            },
            TokenKind::LBrace => TypeDescriptor::Record(self.parse_record_fields(tok)?),
            TokenKind::Number | TokenKind::Str | TokenKind::Error => {
                return Err(self.unknown_type_code(tok))
            }
            _ => {
                return Err(invalid(
                    self.src(),
                    format!("unexpected `{}`; expected a type code", tok.lexeme),
                    tok.span,
                ))
            }
        };

        while self.peek_is(TokenKind::LBracket) {
            let len = self.parse_array_len()?;
            ty = TypeDescriptor::Array {
                element: Box::new(ty),
                len,
            };
        }
        Ok(ty)
    }

    /// `(min,max)`, checked by the caller against the type code.
    fn parse_limits(&mut self) -> SyntaxResult<(i128, i128, SourceSpan)> {
        let open = self.expect(TokenKind::LParen, "`(`", self.invalid_signature())?;
        let min = self.parse_number()?;
        self.expect(TokenKind::Comma, "`,`", self.invalid_signature())?;
        let max = self.parse_number()?;
        self.expect(TokenKind::RParen, "`)`", self.invalid_signature())?;
        Ok((min, max, self.span_since(open)))
    }

    fn invalid_range(&self, min: i128, max: i128, span: SourceSpan) -> SignatureError {
        SignatureError::InvalidRange {
            min,
            max,
            src: self.src().to_string(),
            span,
        }
    }

    /// Length suffix of a string code; `1` when absent.
    fn parse_optional_len(&mut self) -> SyntaxResult<u32> {
        if self.peek_is(TokenKind::LBracket) {
            self.parse_array_len()
        } else {
            Ok(1)
        }
    }

    /// `[N]` with `N >= 1`.
    fn parse_array_len(&mut self) -> SyntaxResult<u32> {
        self.expect(TokenKind::LBracket, "`[`", self.invalid_signature())?;
        let tok = self.expect(TokenKind::Number, "an array length", self.invalid_signature())?;
        let len = parse_int(tok.lexeme)
            .filter(|len| *len >= 1)
            .and_then(|len| u32::try_from(len).ok())
            .ok_or_else(|| {
                invalid(
                    self.src(),
                    format!("array length `{}` must be a positive 32-bit integer", tok.lexeme),
                    tok.span,
                )
            })?;
        self.expect(TokenKind::RBracket, "`]`", self.invalid_signature())?;
        Ok(len)
    }

    /// `["Name"]` or `[index]`
    fn parse_type_ref(&mut self) -> SyntaxResult<TypeRef> {
        self.expect(TokenKind::LBracket, "`[` after `T`", self.invalid_signature())?;
        let type_ref = match self.next() {
            Some(tok) if tok.kind == TokenKind::Str => {
                let name = unquote(tok.lexeme);
                if name.is_empty() {
                    return Err(invalid(self.src(), "empty type name".to_string(), tok.span));
                }
                TypeRef::Name(name)
            }
            Some(tok) if tok.kind == TokenKind::Number => {
                let index = parse_int(tok.lexeme)
                    .and_then(|i| usize::try_from(i).ok())
                    .ok_or_else(|| {
                        invalid(
                            self.src(),
                            format!("type index `{}` must be a non-negative integer", tok.lexeme),
                            tok.span,
                        )
                    })?;
                TypeRef::Index(index)
            }
            Some(tok) => {
                return Err(invalid(
                    self.src(),
                    format!("expected a type name or index, found `{}`", tok.lexeme),
                    tok.span,
                ))
            }
            None => {
                return Err(invalid(
                    self.src(),
                    "unexpected end of signature; expected a type name or index".to_string(),
                    self.end_span(),
                ))
            }
        };
        self.expect(TokenKind::RBracket, "`]`", self.invalid_signature())?;
        Ok(type_ref)
    }

    /// Fields up to and including the closing `}`. The opening brace is consumed
    /// by the caller.
    fn parse_record_fields(&mut self, open: Token<'a>) -> SyntaxResult<Vec<RecordField>> {
        let mut fields = Vec::new();
        let mut seen = HashSet::new();
        loop {
            match self.peek() {
                Some(tok) if tok.kind == TokenKind::RBrace => {
                    self.next();
                    if fields.is_empty() {
                        return Err(invalid(
                            self.src(),
                            "record must have at least one field".to_string(),
                            self.span_since(open),
                        ));
                    }
                    return Ok(fields);
                }
                Some(_) => {
                    let name_tok =
                        self.expect(TokenKind::Str, "a quoted field name", self.invalid_signature())?;
                    let name = unquote(name_tok.lexeme);
                    if !seen.insert(name.clone()) {
                        return Err(invalid(
                            self.src(),
                            format!("duplicate record field `{}`", name),
                            name_tok.span,
                        ));
                    }
                    let ty = self.parse_element()?;
                    fields.push(RecordField { name, ty });
                }
                None => {
                    return Err(invalid(
                        self.src(),
                        "unterminated record; expected `}`".to_string(),
                        self.end_span(),
                    ))
                }
            }
        }
    }

    fn parse_number(&mut self) -> SyntaxResult<i128> {
        let tok = self.expect(TokenKind::Number, "an integer", self.invalid_signature())?;
        parse_int(tok.lexeme).ok_or_else(|| {
            invalid(
                self.src(),
                format!("integer `{}` is out of range", tok.lexeme),
                tok.span,
            )
        })
    }
}
