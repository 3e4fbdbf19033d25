//! Example functions from `_test.go` files.

use super::comment::comment_text;
use super::gofile::{GoFile, is_exported};
use super::render::expand_leading_tabs;
use crate::types::Example;
use regex::Regex;
use std::sync::LazyLock;
use tree_sitter::Node;

const EXAMPLE_PREFIX: &str = "Example";

static OUTPUT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*output:").expect("output prefix pattern is valid"));

/// An example bound to the name of the declaration it documents.
///
/// `target` is `""` for package examples, `"F"` for a function or type,
/// and `"T_M"` for a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NamedExample {
    pub(crate) target: String,
    pub(crate) example: Example,
}

/// Collect the examples declared in `file`, in source order.
pub(crate) fn collect_examples(file: &GoFile) -> Vec<NamedExample> {
    file.top_level()
        .into_iter()
        .filter(|n| n.kind() == "function_declaration")
        .filter_map(|func| {
            let name = file.text(func.child_by_field_name("name")?);
            let suffix = example_suffix(name)?;
            if !is_niladic(func) {
                return None;
            }
            let body = func.child_by_field_name("body")?;
            let (code, output) = render_body(file, body);
            Some(NamedExample {
                target: example_target(suffix).to_string(),
                example: Example { code, output },
            })
        })
        .collect()
}

/// The part of an example function's name after `Example`, if it is one.
///
/// `Examplefoo` is not an example: the prefix must be followed by the end of
/// the name or a non-lowercase character.
fn example_suffix(name: &str) -> Option<&str> {
    let rest = name.strip_prefix(EXAMPLE_PREFIX)?;
    match rest.chars().next() {
        Some(c) if c.is_lowercase() => None,
        _ => Some(rest),
    }
}

/// Strip a trailing `_discriminator` unless it looks like an exported name.
///
/// `Reader_second` documents `Reader`; `Reader_Read` documents the method `Reader.Read`.
fn example_target(suffix: &str) -> &str {
    match suffix.rsplit_once('_') {
        Some((head, tail)) if !tail.is_empty() && !is_exported(tail) => head,
        _ => suffix,
    }
}

fn is_niladic(func: Node<'_>) -> bool {
    func.child_by_field_name("result").is_none()
        && func.child_by_field_name("type_parameters").is_none()
        && func
            .child_by_field_name("parameters")
            .is_some_and(|p| p.named_child_count() == 0)
}

/// Example code without the enclosing braces or the trailing output comment, plus the expected output.
///
/// The output comment is the group of `//` lines closing the body, when its text
/// starts with `Output:`.
fn render_body(file: &GoFile, body: Node<'_>) -> (String, String) {
    let inner_start = body.start_byte() + 1;
    let inner_end = body.end_byte().saturating_sub(1).max(inner_start);
    let inner = &file.source[inner_start..inner_end];
    let lines: Vec<&str> = inner.lines().collect();

    let mut code_len = lines.len();
    while code_len > 0 && lines[code_len - 1].trim().is_empty() {
        code_len -= 1;
    }
    let mut group_start = code_len;
    while group_start > 0 && lines[group_start - 1].trim_start().starts_with("//") {
        group_start -= 1;
    }

    let comments: Vec<&str> = lines[group_start..code_len].iter().map(|l| l.trim()).collect();
    let text = comment_text(&comments);
    match OUTPUT_PREFIX.find(&text) {
        Some(m) => (
            dedent(&lines[..group_start].join("\n")),
            text[m.end()..].trim().to_string(),
        ),
        None => (dedent(inner), String::new()),
    }
}

/// Remove the common leading indentation and surrounding blank lines.
///
/// Only ASCII spaces count as indentation; other whitespace is line content.
fn dedent(code: &str) -> String {
    let lines: Vec<String> = code.lines().map(expand_leading_tabs).collect();
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);

    let body: Vec<&str> = lines
        .iter()
        .map(|l| if l.trim().is_empty() { "" } else { &l[indent..] })
        .map(str::trim_end)
        .collect();

    body.join("\n").trim_matches('\n').to_string()
}
