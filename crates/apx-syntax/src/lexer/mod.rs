use logos::Logos;
use miette::SourceSpan;

/// A token spans from `start` to `end` within the original signature text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    pub span: SourceSpan,
}

/// All tokens that can appear in a data signature or an attribute string.
#[derive(Debug, Logos, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token("=")]
    Eq,

    // Decimal or hexadecimal integers, optionally negative
    #[regex(r"-?(0[xX][0-9a-fA-F]+|[0-9]+)")]
    Number,

    // Double-quoted string with backslash escapes
    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,

    // Type codes and attribute keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    #[regex(r"[ \t\n\r]+", logos::skip)]
    Whitespace,

    // Anything the grammar does not know about. Kept in the token stream so the
    // parser can decide which error to report.
    #[error]
    Error,
}

/// Lexes the input string into a vector of tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    let mut lexer = TokenKind::lexer(input);
    let mut tokens = Vec::new();

    while let Some(kind) = lexer.next() {
        let range = lexer.span();
        tokens.push(Token {
            kind,
            lexeme: &input[range.clone()],
            span: SourceSpan::new(range.start.into(), range.len()),
        });
    }

    tokens
}

/// Parses an integer lexeme produced by [`TokenKind::Number`].
pub fn parse_int(lexeme: &str) -> Option<i128> {
    let (negative, digits) = match lexeme.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, lexeme),
    };
    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i128::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i128>().ok()?,
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// Strips the quotes of a [`TokenKind::Str`] lexeme and resolves escapes.
pub fn unquote(lexeme: &str) -> String {
    let inner = &lexeme[1..lexeme.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        lex(input).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lex_range_signature() {
        assert_eq!(
            kinds("C(0, 15)"),
            vec![
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Number,
                TokenKind::Comma,
                TokenKind::Number,
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn test_lex_reference_and_record() {
        assert_eq!(
            kinds(r#"{"a"T["Mode_T"]}"#),
            vec![
                TokenKind::LBrace,
                TokenKind::Str,
                TokenKind::Ident,
                TokenKind::LBracket,
                TokenKind::Str,
                TokenKind::RBracket,
                TokenKind::RBrace,
            ]
        );
    }

    #[test]
    fn test_lex_keeps_unknown_characters() {
        let tokens = lex("#C");
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[0].lexeme, "#");
        assert_eq!(tokens[1].kind, TokenKind::Ident);
    }

    #[test]
    fn test_spans_point_into_source() {
        let tokens = lex("a[8]");
        assert_eq!(tokens[2].lexeme, "8");
        assert_eq!(tokens[2].span, SourceSpan::new(2.into(), 1));
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("15"), Some(15));
        assert_eq!(parse_int("-128"), Some(-128));
        assert_eq!(parse_int("0xFFFF"), Some(0xFFFF));
        assert_eq!(parse_int("18446744073709551615"), Some(u64::MAX as i128));
        assert_eq!(parse_int("999999999999999999999999999999999999999999"), None);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r#""Mode_T""#), "Mode_T");
        assert_eq!(unquote(r#""a\"b\\c""#), "a\"b\\c");
        assert_eq!(unquote(r#""""#), "");
    }
}
