use quill_rt::accessor::{Accessor, ChainAccessor};
use quill_rt::value::Value;

use crate::ast::{Node, NodeKind, Template};
use crate::error::{Error, ErrorCode};
use crate::eval;

/// Renders a compiled template against a scope. Fails fast: the first error
/// in document order wins and no partial output is returned.
pub fn render(template: &Template, scope: &dyn Accessor) -> Result<String, Error> {
    let mut out = String::new();
    render_nodes(&template.nodes, scope, &mut out)?;
    Ok(out)
}

fn render_nodes(nodes: &[Node], scope: &dyn Accessor, out: &mut String) -> Result<(), Error> {
    for node in nodes {
        render_node(node, scope, out)?;
    }
    Ok(())
}

fn render_node(node: &Node, scope: &dyn Accessor, out: &mut String) -> Result<(), Error> {
    match &node.kind {
        NodeKind::Text(content) => {
            out.push_str(content);
            Ok(())
        }
        NodeKind::Ident(name) => {
            let value = scope.get(name).ok_or_else(|| {
                Error::new(
                    ErrorCode::MissingIdent,
                    node.span,
                    format!("unknown identifier '{name}'"),
                )
            })?;
            if !value.is_scalar() {
                return Err(Error::new(
                    ErrorCode::TypeMismatch,
                    node.span,
                    format!(
                        "Value of '{name}' is not a scalar value, but {}",
                        value.kind_name()
                    ),
                ));
            }
            out.push_str(&value.to_display_string());
            Ok(())
        }
        NodeKind::Expr(expr) => {
            let value = eval::evaluate(expr, scope).map_err(|err| err.with_span(node.span))?;
            if !value.is_scalar() {
                return Err(Error::new(
                    ErrorCode::TypeMismatch,
                    node.span,
                    format!(
                        "Expression did not evaluate to a scalar value, but {}",
                        value.kind_name()
                    ),
                ));
            }
            out.push_str(&value.to_display_string());
            Ok(())
        }
        NodeKind::If {
            cond,
            then,
            or_else,
        } => {
            let value = eval::evaluate(cond, scope).map_err(|err| err.with_span(node.span))?;
            match value {
                Value::Boolean(true) => render_nodes(then, scope, out),
                Value::Boolean(false) => render_nodes(or_else, scope, out),
                other => Err(Error::new(
                    ErrorCode::TypeMismatch,
                    node.span,
                    format!(
                        "Condition of @if must be boolean, but got {}",
                        other.kind_name()
                    ),
                )),
            }
        }
        NodeKind::For {
            item,
            index,
            seq,
            body,
            or_else,
        } => {
            let value = eval::evaluate(seq, scope).map_err(|err| err.with_span(node.span))?;
            let items = match value {
                Value::Sequence(items) => items,
                other => {
                    return Err(Error::new(
                        ErrorCode::TypeMismatch,
                        node.span,
                        format!(
                            "Expression of @for must evaluate to a sequence, but got {}",
                            other.kind_name()
                        ),
                    ));
                }
            };
            if items.is_empty() {
                return render_nodes(or_else, scope, out);
            }
            for (position, element) in items.into_iter().enumerate() {
                let item_scope = ChainAccessor::new(scope, item, element);
                match index {
                    Some(index_name) => {
                        let index_scope = ChainAccessor::new(
                            &item_scope,
                            index_name,
                            Value::Number(position as f64),
                        );
                        render_nodes(body, &index_scope, out)?;
                    }
                    None => render_nodes(body, &item_scope, out)?,
                }
            }
            Ok(())
        }
    }
}
