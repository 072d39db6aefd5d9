use thiserror::Error;
use miette::{Diagnostic, SourceSpan};

/// Errors produced while parsing data signatures, attribute strings and literals.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum SignatureError {
    /// The text does not follow the signature grammar (unbalanced brackets,
    /// missing limits, trailing input and similar).
    #[error("Invalid signature `{src}`: {message}")]
    #[diagnostic(code(apx_syntax::invalid_signature))]
    InvalidSignature {
        message: String,
        #[source_code]
        src: String,
        #[label("{message}")]
        span: SourceSpan,
    },

    /// Range limits with `min > max`, or limits that do not fit the type code.
    #[error("Invalid range ({min},{max}) in signature `{src}`")]
    #[diagnostic(
        code(apx_syntax::invalid_range),
        help("the lower limit must not exceed the upper limit and both must fit the type; `C` limits must fit in 32 bits")
    )]
    InvalidRange {
        min: i128,
        max: i128,
        #[source_code]
        src: String,
        #[label("limits declared here")]
        span: SourceSpan,
    },

    /// The element starts with a character that is not a known type code.
    #[error("Unknown type code `{code}` in signature `{src}`")]
    #[diagnostic(
        code(apx_syntax::unknown_type_code),
        help("known type codes are C, c, s, l, q, B, L, Q, b, S, a, A, u, U, T and records starting with '{{'")
    )]
    UnknownTypeCode {
        code: String,
        #[source_code]
        src: String,
        #[label("not a type code")]
        span: SourceSpan,
    },

    /// A port or type attribute string that cannot be parsed.
    #[error("Invalid attribute `{src}`: {message}")]
    #[diagnostic(code(apx_syntax::invalid_attribute))]
    InvalidAttribute {
        message: String,
        #[source_code]
        src: String,
        #[label("{message}")]
        span: SourceSpan,
    },

    /// An APX text definition that does not follow the line grammar.
    #[error("Invalid APX definition at line {line}: {message}")]
    #[diagnostic(code(apx_syntax::invalid_definition))]
    InvalidDefinition {
        line: usize,
        message: String,
        #[source_code]
        src: String,
        #[label("{message}")]
        span: SourceSpan,
    },

    /// A signature or attribute error inside one line of an APX text definition.
    #[error("Invalid APX definition at line {line}")]
    #[diagnostic(code(apx_syntax::invalid_definition_line))]
    DefinitionLine {
        line: usize,
        #[source]
        error: Box<SignatureError>,
    },
}

/// Result type for signature parsing.
pub type SyntaxResult<T> = std::result::Result<T, SignatureError>;
