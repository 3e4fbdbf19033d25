//! Declaration rendering and cross-reference annotation.
//!
//! Declarations are rendered from their source text with bodies dropped and
//! unexported members filtered out. Annotations are then computed by parsing the
//! rendered text again behind a synthetic package clause, so that offsets refer to
//! the rendered string rather than the original file.

use super::gofile::{
    GoFile, descendants_of_kind, field_nodes, is_exported, named_children, parse_go,
};
use crate::types::{Annotation, Decl};
use std::collections::HashMap;
use std::ops::Range;
use tree_sitter::Node;

const FILTERED_FIELDS: &str = "contains filtered or unexported fields";
const FILTERED_METHODS: &str = "contains filtered or unexported methods";

/// Synthetic header that makes a rendered declaration a complete Go file.
const PACKAGE_WRAPPER: &str = "package p\n";

const TAB_WIDTH: usize = 4;

/// Render `node` and annotate the result against the file's imports.
pub(crate) fn render_decl(
    file: &GoFile,
    node: Node<'_>,
    imports: &HashMap<String, String>,
) -> Decl {
    let text = render_text(file, node);
    let annotations = annotate(&text, imports);
    Decl { text, annotations }
}

/// Presentation text for a function, method, type spec or value declaration.
pub(crate) fn render_text(file: &GoFile, node: Node<'_>) -> String {
    let raw = match node.kind() {
        "function_declaration" | "method_declaration" => {
            let end = node
                .child_by_field_name("body")
                .map_or(node.end_byte(), |body| body.start_byte());
            file.source[node.start_byte()..end].trim_end().to_string()
        }
        "type_spec" | "type_alias" => format!("type {}", filtered_text(file, node)),
        _ => filtered_text(file, node),
    };
    normalize_indent(&raw, file.indent_of(node))
}

/// A replacement of a byte range of the original source.
#[derive(Debug)]
struct Edit {
    range: Range<usize>,
    replacement: String,
}

impl Edit {
    fn insert(at: usize, text: String) -> Self {
        Self {
            range: at..at,
            replacement: text,
        }
    }
}

fn filtered_text(file: &GoFile, node: Node<'_>) -> String {
    let mut edits = Vec::new();
    collect_edits(file, node, &mut edits);
    edits.sort_by_key(|e| (e.range.start, e.range.end));

    let mut out = String::new();
    let mut pos = node.start_byte();
    for edit in edits {
        if edit.range.start < pos {
            continue;
        }
        out.push_str(&file.source[pos..edit.range.start]);
        out.push_str(&edit.replacement);
        pos = edit.range.end;
    }
    out.push_str(&file.source[pos..node.end_byte()]);
    out
}

fn collect_edits(file: &GoFile, node: Node<'_>, edits: &mut Vec<Edit>) {
    match node.kind() {
        "field_declaration_list" => filter_members(file, node, FILTERED_FIELDS, edits),
        "interface_type" => filter_members(file, node, FILTERED_METHODS, edits),
        "const_declaration" | "var_declaration" => {
            for spec in descendants_of_kind(node, &["const_spec", "var_spec"]) {
                let names = field_nodes(spec, "name");
                if !filter_names(file, &names, edits) {
                    edits.push(removal(file, spec));
                    continue;
                }
                if let Some(ty) = spec.child_by_field_name("type") {
                    collect_edits(file, ty, edits);
                }
            }
        }
        _ => {
            for child in named_children(node) {
                collect_edits(file, child, edits);
            }
        }
    }
}

/// Drop unexported names from a name list. Returns false if none survive.
fn filter_names(file: &GoFile, names: &[Node<'_>], edits: &mut Vec<Edit>) -> bool {
    let kept: Vec<&str> = names
        .iter()
        .map(|n| file.text(*n))
        .filter(|name| is_exported(name))
        .collect();
    if kept.is_empty() {
        return false;
    }
    if let (Some(first), Some(last)) = (names.first(), names.last())
        && kept.len() < names.len()
    {
        edits.push(Edit {
            range: first.start_byte()..last.end_byte(),
            replacement: kept.join(", "),
        });
    }
    true
}

/// Filter struct fields or interface methods, leaving a note where members were removed.
fn filter_members(file: &GoFile, container: Node<'_>, note: &str, edits: &mut Vec<Edit>) {
    let members: Vec<Node<'_>> = named_children(container)
        .into_iter()
        .filter(|n| n.kind() != "comment")
        .collect();

    let mut filtered = false;
    for member in &members {
        match member.kind() {
            "field_declaration" => {
                let names = field_nodes(*member, "name");
                let ty = member.child_by_field_name("type");
                let keep = if names.is_empty() {
                    ty.and_then(|t| base_type_name(file, t))
                        .is_some_and(|(name, _)| is_exported(name))
                } else {
                    let before = edits.len();
                    let keep = filter_names(file, &names, edits);
                    filtered |= edits.len() > before;
                    keep
                };
                if !keep {
                    edits.push(removal(file, *member));
                    filtered = true;
                } else if let Some(ty) = ty {
                    collect_edits(file, ty, edits);
                }
            }
            "method_elem" | "method_spec" => {
                let exported = member
                    .child_by_field_name("name")
                    .is_some_and(|n| is_exported(file.text(n)));
                if !exported {
                    edits.push(removal(file, *member));
                    filtered = true;
                }
            }
            _ => collect_edits(file, *member, edits),
        }
    }

    if filtered {
        edits.push(filtered_note(file, container, &members, note));
    }
}

/// Remove a member together with its doc comment. Members on a line of their own
/// take the whole line with them.
fn removal(file: &GoFile, node: Node<'_>) -> Edit {
    let src = &file.source;

    let mut first = node;
    while let Some(prev) = first.prev_named_sibling() {
        let attached = prev.kind() == "comment"
            && prev.end_position().row + 1 == first.start_position().row
            && file.line_prefix(prev).trim().is_empty();
        if !attached {
            break;
        }
        first = prev;
    }

    let prefix = file.line_prefix(first);
    let mut start = first.start_byte();
    let mut end = node.end_byte();
    let line_end = src[end..].find('\n').map_or(src.len(), |i| end + i);
    let rest = src[end..line_end].trim_start();

    if prefix.trim().is_empty() && (rest.is_empty() || rest.starts_with("//")) {
        start -= prefix.len();
        end = (line_end + 1).min(src.len());
    } else {
        let after = src[end..].trim_start_matches([' ', '\t']);
        if let Some(stripped) = after.strip_prefix(';') {
            end = src.len() - stripped.len();
        }
    }

    Edit {
        range: start..end,
        replacement: String::new(),
    }
}

fn filtered_note(file: &GoFile, container: Node<'_>, members: &[Node<'_>], note: &str) -> Edit {
    let close = container.end_byte().saturating_sub(1);
    let line_start = file.source[..close].rfind('\n').map_or(0, |i| i + 1);
    let before_close = &file.source[line_start..close];

    if container.start_position().row != container.end_position().row
        && before_close.trim().is_empty()
    {
        let indent = members.first().map_or_else(
            || format!("{before_close}\t"),
            |m| file.indent_of(*m).to_string(),
        );
        Edit::insert(line_start, format!("{indent}// {note}\n"))
    } else {
        Edit::insert(close, format!(" /* {note} */ "))
    }
}

/// The named type at the core of a type expression, and whether it is imported.
pub(crate) fn base_type_name<'f>(file: &'f GoFile, node: Node<'_>) -> Option<(&'f str, bool)> {
    match node.kind() {
        "type_identifier" => Some((&file.source[node.byte_range()], false)),
        "qualified_type" => node
            .child_by_field_name("name")
            .map(|name| (&file.source[name.byte_range()], true)),
        "pointer_type" | "parenthesized_type" => named_children(node)
            .into_iter()
            .find(|n| n.kind() != "comment")
            .and_then(|inner| base_type_name(file, inner)),
        "generic_type" => node
            .child_by_field_name("type")
            .and_then(|inner| base_type_name(file, inner)),
        _ => None,
    }
}

fn normalize_indent(text: &str, base_indent: &str) -> String {
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            let line = if i == 0 || base_indent.is_empty() {
                line
            } else {
                line.strip_prefix(base_indent).unwrap_or(line)
            };
            expand_leading_tabs(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn expand_leading_tabs(line: &str) -> String {
    let rest = line.trim_start_matches('\t');
    let tabs = line.len() - rest.len();
    format!("{}{}", " ".repeat(tabs * TAB_WIDTH), rest)
}

/// Cross-references in rendered declaration `text`, sorted by start offset.
///
/// `imports` maps the local package names of the declaring file to import paths.
/// Selectors through unknown names are skipped.
pub(crate) fn annotate(text: &str, imports: &HashMap<String, String>) -> Vec<Annotation> {
    let wrapped = format!("{PACKAGE_WRAPPER}{text}");
    let Some(tree) = parse_go(&wrapped) else {
        tracing::debug!("Rendered declaration does not reparse, skipping annotations");
        return Vec::new();
    };

    let mut annotator = Annotator {
        source: &wrapped,
        imports,
        annotations: Vec::new(),
    };
    annotator.visit(tree.root_node());

    let mut annotations = annotator.annotations;
    annotations.sort_by_key(|a| a.start);
    annotations
}

struct Annotator<'a> {
    source: &'a str,
    imports: &'a HashMap<String, String>,
    annotations: Vec<Annotation>,
}

impl Annotator<'_> {
    /// Walks type expressions only: declared names, parameter names and values are skipped.
    fn visit(&mut self, node: Node<'_>) {
        match node.kind() {
            "type_spec" | "type_alias" => self.visit_fields(node, &["type_parameters", "type"]),
            "function_declaration" | "method_declaration" => self.visit_fields(
                node,
                &["receiver", "type_parameters", "parameters", "result"],
            ),
            "parameter_declaration"
            | "variadic_parameter_declaration"
            | "type_parameter_declaration"
            | "field_declaration"
            | "const_spec"
            | "var_spec" => self.visit_fields(node, &["type"]),
            "method_elem" | "method_spec" => self.visit_fields(node, &["parameters", "result"]),
            "qualified_type" => self.visit_selector(node, "package", "name"),
            "selector_expression" => self.visit_selector(node, "operand", "field"),
            "type_identifier" | "identifier" => {
                let name = self.text(node);
                if is_exported(name) {
                    self.push(node, String::new(), name.to_string());
                }
            }
            "comment" | "package_clause" => {}
            _ => {
                for child in named_children(node) {
                    self.visit(child);
                }
            }
        }
    }

    fn visit_fields(&mut self, node: Node<'_>, fields: &[&str]) {
        for field in fields {
            for child in field_nodes(node, field) {
                self.visit(child);
            }
        }
    }

    fn visit_selector(&mut self, node: Node<'_>, package_field: &str, name_field: &str) {
        let (Some(package), Some(name)) = (
            node.child_by_field_name(package_field),
            node.child_by_field_name(name_field),
        ) else {
            return;
        };
        if !matches!(package.kind(), "identifier" | "package_identifier") {
            self.visit(package);
            return;
        }
        let name = self.text(name);
        if !is_exported(name) {
            return;
        }
        if let Some(import_path) = self.imports.get(self.text(package)) {
            self.push(node, import_path.clone(), name.to_string());
        }
    }

    fn text(&self, node: Node<'_>) -> &str {
        &self.source[node.byte_range()]
    }

    fn push(&mut self, node: Node<'_>, import_path: String, name: String) {
        self.annotations.push(Annotation {
            start: node.start_byte() - PACKAGE_WRAPPER.len(),
            end: node.end_byte() - PACKAGE_WRAPPER.len(),
            import_path,
            name,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    fn parse(src: &str) -> GoFile {
        GoFile::parse("a.go", src.as_bytes()).expect("test source parses")
    }

    fn first_of_kind<'f>(file: &'f GoFile, kind: &str) -> Node<'f> {
        descendants_of_kind(file.root(), &[kind])
            .into_iter()
            .next()
            .expect("node of kind")
    }

    #[rstest]
    #[case("package p\nfunc Open(name string) (*File, error) {\n\treturn nil, nil\n}\n", "function_declaration", "func Open(name string) (*File, error)")]
    #[case("package p\nfunc (f *File) Close() error { return nil }\n", "method_declaration", "func (f *File) Close() error")]
    #[case("package p\ntype ID int\n", "type_spec", "type ID int")]
    #[case("package p\ntype Alias = int\n", "type_alias", "type Alias = int")]
    #[case("package p\nconst Max = 10\n", "const_declaration", "const Max = 10")]
    fn test_render_text(#[case] src: &str, #[case] kind: &str, #[case] expected: &str) {
        let file = parse(src);
        check!(render_text(&file, first_of_kind(&file, kind)) == expected);
    }

    #[test]
    fn test_render_filters_unexported_fields() {
        let file = parse(
            "package p\n\ntype T struct {\n\tName string\n\t// hidden doc\n\tsecret int\n\tio.Reader\n\tmu sync.Mutex\n}\n",
        );
        let text = render_text(&file, first_of_kind(&file, "type_spec"));
        check!(
            text == "type T struct {\n    Name string\n    io.Reader\n    // contains filtered or unexported fields\n}"
        );
    }

    #[test]
    fn test_render_filters_unexported_methods_and_names() {
        let file = parse(
            "package p\n\ntype I interface {\n\tRead() error\n\tclose()\n}\n\nvar a, B, c int\n",
        );
        check!(
            render_text(&file, first_of_kind(&file, "type_spec"))
                == "type I interface {\n    Read() error\n    // contains filtered or unexported methods\n}"
        );
        check!(render_text(&file, first_of_kind(&file, "var_declaration")) == "var B int");
    }

    #[test]
    fn test_render_grouped_values_and_types() {
        let file = parse(
            "package p\n\nconst (\n\t// A is first.\n\tA = 1\n\tb = 2\n\tC = 3\n)\n\ntype (\n\tPoint struct {\n\t\tX int\n\t}\n)\n",
        );
        check!(
            render_text(&file, first_of_kind(&file, "const_declaration"))
                == "const (\n    // A is first.\n    A = 1\n    C = 3\n)"
        );
        check!(
            render_text(&file, first_of_kind(&file, "type_spec"))
                == "type Point struct {\n    X int\n}"
        );
    }

    #[test]
    fn test_annotate_resolves_imports_and_local_types() {
        let imports = HashMap::from([("io".to_string(), "io".to_string())]);
        let text = "func Copy(dst io.Writer, src Source) (int64, error)";
        let annotations = annotate(text, &imports);

        check!(annotations.len() == 2);
        check!(annotations[0].import_path == "io");
        check!(annotations[0].name == "Writer");
        check!(&text[annotations[0].start..annotations[0].end] == "io.Writer");
        check!(annotations[1].import_path == "");
        check!(annotations[1].name == "Source");
        check!(&text[annotations[1].start..annotations[1].end] == "Source");
    }

    #[test]
    fn test_annotate_skips_names_values_and_unknown_packages() {
        let imports = HashMap::new();
        let annotations = annotate("type Config struct {\n    Limit Size\n    Out bufio.Writer\n}", &imports);
        check!(annotations.len() == 1);
        check!(annotations[0].name == "Size");

        check!(annotate("const Max = Other + 1", &imports).is_empty());
        check!(annotate("this is not go", &imports).is_empty());
    }

    #[test]
    fn test_annotations_are_sorted() {
        let imports = HashMap::from([("http".to_string(), "net/http".to_string())]);
        let annotations = annotate("func (s *Server) Handle(h http.Handler, o Options) Result", &imports);
        let starts: Vec<usize> = annotations.iter().map(|a| a.start).collect();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        check!(starts == sorted);
        check!(annotations.len() == 4);
        check!(annotations[0].name == "Server");
    }
}
