use std::fmt;

use crate::span::TextSpan;

/// Stable error codes; `as_str` values are part of the public contract.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    // lexer
    UnterminatedExpr,
    UnterminatedIf,
    UnterminatedFor,
    // expression parser
    ExprEmpty,
    ExprTrailing,
    UnexpectedChar,
    MissingRParen,
    NumberFormat,
    StringStart,
    StringEscape,
    StringUnterminated,
    MemberName,
    NestingDepth,
    // template parser
    IfMissingLBrace,
    IfMissingRBrace,
    ElseMissingLBrace,
    ElseMissingRBrace,
    ForItemIdent,
    ForIndexIdent,
    ForMissingIn,
    ForMissingExpr,
    ForMissingLBrace,
    ForMissingRBrace,
    // evaluation / rendering
    MissingIdent,
    MissingMember,
    TypeMismatch,
    DivisionByZero,
    UnsupportedOp,
    UnsupportedExpr,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UnterminatedExpr => "UnterminatedExpr",
            ErrorCode::UnterminatedIf => "UnterminatedIf",
            ErrorCode::UnterminatedFor => "UnterminatedFor",
            ErrorCode::ExprEmpty => "ExprEmpty",
            ErrorCode::ExprTrailing => "ExprTrailing",
            ErrorCode::UnexpectedChar => "UnexpectedChar",
            ErrorCode::MissingRParen => "MissingRParen",
            ErrorCode::NumberFormat => "NumberFormat",
            ErrorCode::StringStart => "StringStart",
            ErrorCode::StringEscape => "StringEscape",
            ErrorCode::StringUnterminated => "StringUnterminated",
            ErrorCode::MemberName => "MemberName",
            ErrorCode::NestingDepth => "NestingDepth",
            ErrorCode::IfMissingLBrace => "IfMissingLBrace",
            ErrorCode::IfMissingRBrace => "IfMissingRBrace",
            ErrorCode::ElseMissingLBrace => "ElseMissingLBrace",
            ErrorCode::ElseMissingRBrace => "ElseMissingRBrace",
            ErrorCode::ForItemIdent => "ForItemIdent",
            ErrorCode::ForIndexIdent => "ForIndexIdent",
            ErrorCode::ForMissingIn => "ForMissingIn",
            ErrorCode::ForMissingExpr => "ForMissingExpr",
            ErrorCode::ForMissingLBrace => "ForMissingLBrace",
            ErrorCode::ForMissingRBrace => "ForMissingRBrace",
            ErrorCode::MissingIdent => "MissingIdent",
            ErrorCode::MissingMember => "MissingMember",
            ErrorCode::TypeMismatch => "TypeMismatch",
            ErrorCode::DivisionByZero => "DivisionByZero",
            ErrorCode::UnsupportedOp => "UnsupportedOp",
            ErrorCode::UnsupportedExpr => "UnsupportedExpr",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Error {
    pub code: ErrorCode,
    pub span: TextSpan,
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, span: TextSpan, message: impl Into<String>) -> Self {
        Self {
            code,
            span,
            message: message.into(),
        }
    }

    /// Rebind the error to another source span, keeping code and message.
    pub fn with_span(mut self, span: TextSpan) -> Self {
        self.span = span;
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}..{}): {}",
            self.code,
            self.span.offset,
            self.span.end(),
            self.message
        )
    }
}

impl std::error::Error for Error {}
