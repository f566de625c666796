//! Tests for template compilation and rendering.

use crate::template::{Template, TemplateError, render_template};
use std::collections::BTreeMap;

fn vars<const N: usize>(pairs: [(&str, &str); N]) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn simple_substitution() {
    let result =
        render_template("{greeting}, {name}!", &vars([("name", "Alice"), ("greeting", "Hello")]))
            .unwrap();
    assert_eq!(result, "Hello, Alice!");
}

#[test]
fn plain_text_needs_no_variables() {
    let result = render_template("Just plain text", &BTreeMap::new()).unwrap();
    assert_eq!(result, "Just plain text");
}

#[test]
fn empty_template_renders_empty() {
    let result = render_template("", &BTreeMap::new()).unwrap();
    assert_eq!(result, "");
}

#[test]
fn escaped_braces_render_literally() {
    let result = render_template("Use {{var}} for variables", &BTreeMap::new()).unwrap();
    assert_eq!(result, "Use {var} for variables");
}

#[test]
fn lone_closing_brace_is_a_regular_character() {
    let result = render_template("end}", &BTreeMap::new()).unwrap();
    assert_eq!(result, "end}");
}

#[test]
fn whitespace_in_placeholder_names_is_trimmed() {
    let result = render_template("{ name }", &vars([("name", "Alice")])).unwrap();
    assert_eq!(result, "Alice");
}

#[test]
fn unmatched_brace_fails_at_compile_time() {
    let err = Template::compile("hello {name").unwrap_err();
    assert_eq!(err, TemplateError::UnmatchedBrace { position: 6 });
}

#[test]
fn empty_placeholder_fails_at_compile_time() {
    let err = Template::compile("hello {}").unwrap_err();
    assert_eq!(err, TemplateError::EmptyVariableName { position: 6 });
}

#[test]
fn undefined_variable_fails_at_render_time() {
    let template = Template::compile("hello {name}").unwrap();
    let err = template.render(&BTreeMap::new()).unwrap_err();
    assert_eq!(
        err,
        TemplateError::UndefinedVariable {
            name: "name".to_string(),
            position: 6,
        }
    );
}

#[test]
fn compiled_template_renders_repeatedly() {
    let template = Template::compile("{a}-{a}-{b}").unwrap();
    assert_eq!(template.render(&vars([("a", "x"), ("b", "y")])).unwrap(), "x-x-y");
    assert_eq!(template.render(&vars([("a", "1"), ("b", "2")])).unwrap(), "1-1-2");
}

#[test]
fn placeholders_lists_referenced_names_in_order() {
    let template = Template::compile("{first} then {second} then {first}").unwrap();
    let names: Vec<&str> = template.placeholders().collect();
    assert_eq!(names, vec!["first", "second", "first"]);
}

#[test]
fn unicode_values_render_correctly() {
    let result = render_template("say {word}", &vars([("word", "こんにちは")])).unwrap();
    assert_eq!(result, "say こんにちは");
}
