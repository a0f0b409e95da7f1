use quill::json::{accessor_from_json, value_from_json, value_to_json};
use quill::{Value, render_template};
use serde_json::json;

#[test]
fn json_objects_become_root_scopes() {
    let data = json!({
        "name": "Ada",
        "admin": true,
        "logins": 3,
        "tags": ["a", "b"],
    });
    let scope = accessor_from_json(&data).unwrap();
    assert_eq!(
        render_template("@name (@logins) @for(t in tags){[@t]}", &scope).unwrap(),
        "Ada (3) [a][b]"
    );
}

#[test]
fn non_object_roots_offer_no_bindings() {
    assert!(accessor_from_json(&json!([1, 2, 3])).is_none());
    assert!(accessor_from_json(&json!("plain")).is_none());
}

#[test]
fn nested_objects_map_to_member_access() {
    let data = json!({"user": {"name": "Bo", "score": 1.5}});
    let scope = accessor_from_json(&data).unwrap();
    assert_eq!(
        render_template("@(user.name): @(user.score * 2)", &scope).unwrap(),
        "Bo: 3"
    );
}

#[test]
fn null_becomes_empty_text() {
    assert_eq!(value_from_json(&json!(null)), Value::Text(String::new()));
}

#[test]
fn values_round_trip_through_json() {
    let data = json!({"a": [1.5, true, "x"], "b": {"c": 2.5}});
    let value = value_from_json(&data);
    assert_eq!(value_to_json(&value), data);
}
