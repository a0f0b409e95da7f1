use std::collections::HashMap;

use quill::{MapAccessor, Value, render_template};
use quill::ErrorCode;

fn empty() -> MapAccessor {
    MapAccessor::new()
}

fn expect_error(text: &str, scope: &MapAccessor) -> quill::Error {
    render_template(text, scope).expect_err("expected render failure")
}

#[test]
fn plain_text_passes_through_unchanged() {
    let text = "no constructs here, just text.\nsecond line";
    assert_eq!(render_template(text, &empty()).unwrap(), text);
}

#[test]
fn escaped_at_renders_once() {
    assert_eq!(
        render_template("mail me @@ home", &empty()).unwrap(),
        "mail me @ home"
    );
}

#[test]
fn identifier_interpolation_renders_scalars() {
    let scope = MapAccessor::new()
        .with("name", "Ada")
        .with("age", 36.0)
        .with("admin", true);
    assert_eq!(
        render_template("@name is @age (admin: @admin)", &scope).unwrap(),
        "Ada is 36 (admin: true)"
    );
}

#[test]
fn expression_precedence_drives_output() {
    assert_eq!(
        render_template("Result: @(1 + 2 * (3 - 1))", &empty()).unwrap(),
        "Result: 5"
    );
}

#[test]
fn numbers_render_invariantly() {
    assert_eq!(
        render_template("@(10 / 4) @(3 * 2)", &empty()).unwrap(),
        "2.5 6"
    );
}

#[test]
fn text_concatenation() {
    let scope = MapAccessor::new().with("first", "Ada").with("last", "Lovelace");
    assert_eq!(
        render_template("@(first + \" \" + last)", &scope).unwrap(),
        "Ada Lovelace"
    );
}

#[test]
fn if_selects_the_right_branch() {
    let scope = MapAccessor::new().with("ok", true);
    assert_eq!(
        render_template("@if(ok){yes}else{no}", &scope).unwrap(),
        "yes"
    );
    let scope = MapAccessor::new().with("ok", false);
    assert_eq!(
        render_template("@if(ok){yes}else{no}", &scope).unwrap(),
        "no"
    );
    assert_eq!(
        render_template("@if(false){yes}", &empty()).unwrap(),
        ""
    );
}

#[test]
fn elif_chains_evaluate_in_order() {
    let template = "@if(n == 1){one}@elif(n == 2){two}else{many}";
    for (n, expected) in [(1.0, "one"), (2.0, "two"), (7.0, "many")] {
        let scope = MapAccessor::new().with("n", n);
        assert_eq!(render_template(template, &scope).unwrap(), expected);
    }
}

#[test]
fn non_boolean_condition_is_a_type_mismatch() {
    let scope = MapAccessor::new().with("ok", 1.0);
    let err = expect_error("@if(ok){x}", &scope);
    assert_eq!(err.code, ErrorCode::TypeMismatch);
    assert_eq!((err.span.offset, err.span.length), (0, 7));
}

#[test]
fn boolean_operators_do_not_short_circuit_type_errors() {
    // `false && ...` would normally hide the bad `1 + true`
    let err = expect_error("@if(false && 1 + true > 0){T}else{E}", &empty());
    assert_eq!(err.code, ErrorCode::TypeMismatch);
    assert_eq!((err.span.offset, err.span.length), (0, 26));
}

#[test]
fn division_by_zero_is_reported() {
    let err = expect_error("@(1 / 0)", &empty());
    assert_eq!(err.code, ErrorCode::DivisionByZero);
    assert_eq!((err.span.offset, err.span.length), (0, 8));
}

#[test]
fn missing_identifier_reports_the_node_span() {
    let err = expect_error("Hi @nope", &empty());
    assert_eq!(err.code, ErrorCode::MissingIdent);
    assert_eq!((err.span.offset, err.span.length), (3, 5));
}

#[test]
fn interpolating_a_map_is_never_stringified() {
    let mut user = HashMap::new();
    user.insert("name".to_string(), Value::Text("Ada".to_string()));
    let scope = MapAccessor::new().with("user", Value::Map(user));

    let err = expect_error("@user", &scope);
    assert_eq!(err.code, ErrorCode::TypeMismatch);

    let err = expect_error("@(user)", &scope);
    assert_eq!(err.code, ErrorCode::TypeMismatch);
}

#[test]
fn member_access_reads_nested_maps() {
    let mut user = HashMap::new();
    user.insert("name".to_string(), Value::Text("Ada".to_string()));
    let scope = MapAccessor::new().with("user", Value::Map(user));
    assert_eq!(render_template("@(user.name)", &scope).unwrap(), "Ada");
}

#[test]
fn missing_member_reports_the_node_span() {
    let scope = MapAccessor::new().with("user", Value::Map(HashMap::new()));
    let err = expect_error("x @(user.name)", &scope);
    assert_eq!(err.code, ErrorCode::MissingMember);
    assert_eq!((err.span.offset, err.span.length), (2, 12));
}

#[test]
fn numeric_equality_uses_the_tolerance() {
    let scope = MapAccessor::new().with("x", 0.1 + 0.2);
    assert_eq!(
        render_template("@if(x == 0.3){close}else{far}", &scope).unwrap(),
        "close"
    );
}

#[test]
fn empty_sequence_renders_the_else_block() {
    let scope = MapAccessor::new().with("items", Value::Sequence(Vec::new()));
    assert_eq!(
        render_template("@for(x in items){@x}else{none}", &scope).unwrap(),
        "none"
    );
    assert_eq!(
        render_template("@for(x in items){@x}", &scope).unwrap(),
        ""
    );
}

#[test]
fn for_over_a_non_sequence_is_a_type_mismatch() {
    let scope = MapAccessor::new().with("items", 3.0);
    let err = expect_error("@for(x in items){@x}", &scope);
    assert_eq!(err.code, ErrorCode::TypeMismatch);
    assert!(err.message.contains("got Number"), "message: {}", err.message);
    assert_eq!((err.span.offset, err.span.length), (0, 16));
}

#[test]
fn first_error_in_document_order_wins() {
    let err = expect_error("@missing @(1/0)", &empty());
    assert_eq!(err.code, ErrorCode::MissingIdent);
}

#[test]
fn compiled_templates_render_repeatedly() {
    let template = quill::compile("@greeting, @name!").unwrap();
    let first = quill::render(
        &template,
        &MapAccessor::new().with("greeting", "Hi").with("name", "Ada"),
    )
    .unwrap();
    let second = quill::render(
        &template,
        &MapAccessor::new().with("greeting", "Yo").with("name", "Bo"),
    )
    .unwrap();
    assert_eq!(first, "Hi, Ada!");
    assert_eq!(second, "Yo, Bo!");
}
