//! Doc comment extraction and synopsis derivation.

use super::gofile::GoFile;
use tree_sitter::Node;

/// Maximum synopsis length in bytes.
const MAX_SYNOPSIS_LEN: usize = 400;

/// First sentences starting with these (lowercased) prefixes are boilerplate, not documentation.
const BOILERPLATE_PREFIXES: &[&str] = &["copyright", "all rights", "author"];

/// The comment group directly above `node`, as plain text.
///
/// A comment belongs to the group only if it sits on its own line and the group
/// ends on the line right before `node`.
pub(crate) fn doc_comment(file: &GoFile, node: Node<'_>) -> String {
    let mut group = Vec::new();
    let mut next_row = node.start_position().row;
    let mut candidate = node.prev_named_sibling();

    while let Some(comment) = candidate {
        if comment.kind() != "comment" || comment.end_position().row + 1 != next_row {
            break;
        }
        if trails_code(file, comment) {
            break;
        }
        group.push(file.text(comment));
        next_row = comment.start_position().row;
        candidate = comment.prev_named_sibling();
    }

    group.reverse();
    comment_text(&group)
}

/// The first free-standing comment group that follows the package clause.
pub(crate) fn first_comment_group(file: &GoFile) -> String {
    let mut group: Vec<&str> = Vec::new();
    let mut last_row = 0;
    let mut seen_clause = false;

    for node in file.top_level() {
        if node.kind() == "package_clause" {
            seen_clause = true;
            continue;
        }
        if !seen_clause {
            continue;
        }
        let is_own_line_comment = node.kind() == "comment" && !trails_code(file, node);
        if is_own_line_comment
            && (group.is_empty() || node.start_position().row == last_row + 1)
        {
            group.push(file.text(node));
            last_row = node.end_position().row;
        } else if !group.is_empty() {
            break;
        }
    }

    comment_text(&group)
}

/// True for a comment that shares its line with preceding code.
fn trails_code(file: &GoFile, comment: Node<'_>) -> bool {
    !file.line_prefix(comment).trim().is_empty()
}

/// Convert raw `//` and `/* */` comments to text.
///
/// Strips comment markers and `//go:` directives, trims trailing whitespace,
/// drops leading and trailing blank lines, and collapses runs of blank lines.
/// Non-empty results end in a newline.
pub(crate) fn comment_text(comments: &[&str]) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for raw in comments {
        if let Some(body) = raw.strip_prefix("//") {
            if is_directive(body) {
                continue;
            }
            lines.push(body.strip_prefix(' ').unwrap_or(body));
        } else if let Some(body) = raw.strip_prefix("/*") {
            let body = body.strip_suffix("*/").unwrap_or(body);
            lines.extend(body.lines());
        }
    }

    let mut out = String::new();
    let mut pending_blank = false;
    for line in lines.iter().map(|l| l.trim_end()) {
        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if pending_blank {
            out.push('\n');
            pending_blank = false;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn is_directive(body: &str) -> bool {
    body.strip_prefix("go:")
        .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_lowercase()))
}

/// The first sentence of the first paragraph of `doc`, on a single line.
pub fn synopsis(doc: &str) -> String {
    let paragraph = doc
        .trim_start()
        .split("\n\n")
        .next()
        .unwrap_or_default();
    let text = collapse_whitespace(paragraph);
    let end = sentence_end(&text).unwrap_or(text.len());
    let sentence = truncate(&text[..end], MAX_SYNOPSIS_LEN);

    let lower = sentence.to_lowercase();
    if BOILERPLATE_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return String::new();
    }
    sentence.to_string()
}

/// True if `doc` carries text beyond its first sentence.
pub fn has_multiple_sentences(doc: &str) -> bool {
    let text = collapse_whitespace(doc);
    sentence_end(&text).is_some_and(|end| !text[end..].trim().is_empty())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Byte offset just past the first sentence terminator.
///
/// A terminator is `.`, `!` or `?` followed by whitespace or the end of text,
/// and not preceded by an uppercase letter (so initials like "U.S." do not end a sentence).
fn sentence_end(text: &str) -> Option<usize> {
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') && !prev.is_some_and(char::is_uppercase) {
            match chars.peek() {
                None => return Some(i + c.len_utf8()),
                Some(&(_, next)) if next.is_whitespace() => return Some(i + c.len_utf8()),
                _ => {}
            }
        }
        prev = Some(c);
    }
    None
}

/// Cut `s` to at most `max` bytes on a character boundary.
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case("Demo does X.\n", "Demo does X.")]
    #[case("Package http provides HTTP client and server implementations.\nMore text here.\n", "Package http provides HTTP client and server implementations.")]
    #[case("Wait! Then go.", "Wait!")]
    #[case("Is it? Yes.", "Is it?")]
    #[case("Built by the U.S. Army. More.", "Built by the U.S. Army.")]
    #[case("Version 1.2 is out. Next.", "Version 1.2 is out.")]
    #[case("No terminator at all", "No terminator at all")]
    #[case("First paragraph\nwraps here\n\nSecond paragraph.", "First paragraph wraps here")]
    #[case("Copyright 2012 The Authors. All rights reserved.", "")]
    #[case("", "")]
    fn test_synopsis(#[case] doc: &str, #[case] expected: &str) {
        check!(synopsis(doc) == expected);
    }

    #[test]
    fn test_synopsis_truncates_on_char_boundary() {
        let doc = "é".repeat(300);
        let s = synopsis(&doc);
        check!(s.len() <= MAX_SYNOPSIS_LEN);
        check!(s.len() == 400);
        check!(s.chars().all(|c| c == 'é'));

        let odd = format!("a{}", "é".repeat(300));
        let s = synopsis(&odd);
        check!(s.len() == 399);
    }

    #[rstest]
    #[case("Tool does things. It also does more.", true)]
    #[case("Tool does things.", false)]
    #[case("Tool does things", false)]
    #[case("", false)]
    fn test_has_multiple_sentences(#[case] doc: &str, #[case] expected: bool) {
        check!(has_multiple_sentences(doc) == expected);
    }

    #[rstest]
    #[case(&["// Hello world."], "Hello world.\n")]
    #[case(&["//Tight."], "Tight.\n")]
    #[case(&["// a", "//", "//", "// b"], "a\n\nb\n")]
    #[case(&["//", "// a", "//"], "a\n")]
    #[case(&["/*\nBlock\n   comment.\n*/"], "Block\n   comment.\n")]
    #[case(&["//go:generate stringer", "// Kind enumerates."], "Kind enumerates.\n")]
    #[case(&[], "")]
    fn test_comment_text(#[case] comments: &[&str], #[case] expected: &str) {
        check!(comment_text(comments) == expected);
    }

    #[test]
    fn test_doc_comment_requires_adjacency() {
        let src = "package p\n\n// Detached.\n\nfunc A() {}\n\n// Attached\n// twice.\nfunc B() {}\n\nvar x = 1 // trailing\nfunc C() {}\n";
        let file = GoFile::parse("p.go", src.as_bytes()).expect("parses");
        let funcs: Vec<_> = file
            .top_level()
            .into_iter()
            .filter(|n| n.kind() == "function_declaration")
            .collect();

        check!(doc_comment(&file, funcs[0]) == "");
        check!(doc_comment(&file, funcs[1]) == "Attached\ntwice.\n");
        check!(doc_comment(&file, funcs[2]) == "");
    }

    #[test]
    fn test_package_comment_and_fallback() {
        let file = GoFile::parse(
            "a.go",
            b"// Package p is documented.\npackage p\n\n// F does F.\nfunc F() {}\n",
        )
        .expect("parses");
        let clause = file.package_clause().expect("clause");
        check!(doc_comment(&file, clause) == "Package p is documented.\n");
        check!(first_comment_group(&file) == "F does F.\n");

        let file = GoFile::parse("a.go", b"package demo\n// Demo does X.\nfunc Demo() {}")
            .expect("parses");
        check!(first_comment_group(&file) == "Demo does X.\n");
    }
}
