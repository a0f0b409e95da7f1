pub mod ast;
pub mod cache;
pub mod error;
pub mod eval;
pub mod expr;
pub mod json;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod render;
pub mod span;
pub mod token;

pub use quill_rt::accessor::{Accessor, ChainAccessor, MapAccessor};
pub use quill_rt::value::{NUMBER_EPSILON, Value};

pub use ast::{BinaryOp, Expr, Node, NodeKind, Template, UnaryOp};
pub use cache::TemplateCache;
pub use error::{Error, ErrorCode};
pub use eval::evaluate;
pub use expr::parse_expr;
pub use lexer::lex;
pub use model::{MapModel, Model, ModelError, render_model};
pub use parser::parse;
pub use render::render;
pub use span::TextSpan;
pub use token::{Token, TokenKind};

/// Lexes and parses template text into its compiled form.
pub fn compile(text: &str) -> Result<Template, Error> {
    let tokens = lexer::lex(text)?;
    parser::parse(&tokens)
}

/// Compiles and renders in one step.
pub fn render_template(text: &str, scope: &dyn Accessor) -> Result<String, Error> {
    let template = compile(text)?;
    render::render(&template, scope)
}
