//! Tree-sitter parsing of Go compilation units.

use crate::types::last_segment;
use std::collections::HashMap;
use tree_sitter::{Node, Parser, Tree};

/// Parse Go source with a fresh parser.
///
/// Returns `None` when the grammar fails to load or the tree contains syntax errors;
/// the builder treats both the same as an unparseable file.
pub(crate) fn parse_go(source: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&tree_sitter_go::LANGUAGE.into()) {
        tracing::error!("Failed to load Go grammar: {}", e);
        return None;
    }
    let tree = parser.parse(source, None)?;
    if tree.root_node().has_error() {
        return None;
    }
    Some(tree)
}

/// A single `import` spec as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportSpec {
    /// Explicit local name, including `_` and `.`.
    pub(crate) name: Option<String>,
    pub(crate) path: String,
}

impl ImportSpec {
    /// The identifier this import is referenced by inside the file, if any.
    pub(crate) fn local_name(&self) -> Option<&str> {
        match self.name.as_deref() {
            Some("_" | ".") => None,
            Some(name) => Some(name),
            None => Some(default_import_name(&self.path)),
        }
    }
}

/// A parsed Go source file.
pub(crate) struct GoFile {
    pub(crate) name: String,
    pub(crate) source: String,
    pub(crate) tree: Tree,
    pub(crate) package_name: String,
    pub(crate) imports: Vec<ImportSpec>,
}

impl std::fmt::Debug for GoFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoFile")
            .field("name", &self.name)
            .field("package_name", &self.package_name)
            .field("imports", &self.imports.len())
            .finish_non_exhaustive()
    }
}

impl GoFile {
    /// Parse `content` as a Go file. Fails on invalid UTF-8, syntax errors,
    /// or a missing package clause.
    pub(crate) fn parse(name: &str, content: &[u8]) -> Option<Self> {
        let source = std::str::from_utf8(content).ok()?.to_string();
        let tree = parse_go(&source)?;

        let root = tree.root_node();
        let clause = named_children(root)
            .into_iter()
            .find(|n| n.kind() == "package_clause")?;
        let package_name = named_children(clause)
            .into_iter()
            .find(|n| n.kind() == "package_identifier")
            .map(|n| source[n.byte_range()].to_string())?;

        let imports = named_children(root)
            .into_iter()
            .filter(|n| n.kind() == "import_declaration")
            .flat_map(|decl| descendants_of_kind(decl, &["import_spec"]))
            .filter_map(|spec| {
                let path = spec.child_by_field_name("path")?;
                let path = source[path.byte_range()]
                    .trim_matches(|c| c == '"' || c == '`')
                    .to_string();
                let name = spec
                    .child_by_field_name("name")
                    .map(|n| source[n.byte_range()].to_string());
                Some(ImportSpec { name, path })
            })
            .collect();

        Some(Self {
            name: name.to_string(),
            source,
            tree,
            package_name,
            imports,
        })
    }

    pub(crate) fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub(crate) fn text(&self, node: Node<'_>) -> &str {
        &self.source[node.byte_range()]
    }

    /// Top-level declarations and comments in source order.
    pub(crate) fn top_level(&self) -> Vec<Node<'_>> {
        named_children(self.root())
    }

    pub(crate) fn package_clause(&self) -> Option<Node<'_>> {
        self.top_level()
            .into_iter()
            .find(|n| n.kind() == "package_clause")
    }

    /// Local import name to import path.
    pub(crate) fn import_map(&self) -> HashMap<String, String> {
        self.imports
            .iter()
            .filter_map(|spec| Some((spec.local_name()?.to_string(), spec.path.clone())))
            .collect()
    }

    /// 1-based line of `node`.
    pub(crate) fn line(&self, node: Node<'_>) -> usize {
        node.start_position().row + 1
    }

    /// Source text between the start of `node`'s first line and `node`.
    pub(crate) fn line_prefix(&self, node: Node<'_>) -> &str {
        let start = node.start_byte();
        let line_start = self.source[..start].rfind('\n').map_or(0, |i| i + 1);
        &self.source[line_start..start]
    }

    /// Whitespace preceding `node` on its first line.
    pub(crate) fn indent_of(&self, node: Node<'_>) -> &str {
        let prefix = self.line_prefix(node);
        let len = prefix.len() - prefix.trim_start().len();
        &prefix[..len]
    }

    /// Number of top-level declarations, used to rank competing package candidates.
    pub(crate) fn declaration_count(&self) -> usize {
        self.top_level()
            .iter()
            .filter(|n| {
                matches!(
                    n.kind(),
                    "function_declaration"
                        | "method_declaration"
                        | "type_declaration"
                        | "const_declaration"
                        | "var_declaration"
                )
            })
            .count()
    }

    /// True if the file declares `func main()` with no parameters or results.
    pub(crate) fn has_main_func(&self) -> bool {
        self.top_level().into_iter().any(|n| {
            n.kind() == "function_declaration"
                && n.child_by_field_name("name")
                    .is_some_and(|name| self.text(name) == "main")
                && n.child_by_field_name("type_parameters").is_none()
                && n.child_by_field_name("result").is_none()
                && n.child_by_field_name("parameters")
                    .is_some_and(|params| params.named_child_count() == 0)
        })
    }
}

pub(crate) fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

pub(crate) fn field_nodes<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// Descendants of `node` whose kind is in `kinds`, without descending into matches.
///
/// Works for both the bare and the parenthesized forms of `import`, `const`,
/// `var` and `type` declarations.
pub(crate) fn descendants_of_kind<'t>(node: Node<'t>, kinds: &[&str]) -> Vec<Node<'t>> {
    let mut found = Vec::new();
    for child in named_children(node) {
        if kinds.contains(&child.kind()) {
            found.push(child);
        } else {
            found.extend(descendants_of_kind(child, kinds));
        }
    }
    found
}

/// Go's export rule: the first character is an uppercase letter.
pub(crate) fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

pub(crate) fn is_test_file(filename: &str) -> bool {
    filename.ends_with("_test.go")
}

/// Go source files that take part in documentation. Names starting with `_` or `.`
/// are ignored by the go tool.
pub fn is_doc_file(filename: &str) -> bool {
    let base = last_segment(filename);
    base.ends_with(".go") && !base.starts_with('_') && !base.starts_with('.')
}

/// The name a package is referenced by when imported without an explicit name.
pub(crate) fn default_import_name(import_path: &str) -> &str {
    let name = last_segment(import_path);
    if let Some(stripped) = name.strip_prefix("go-") {
        stripped
    } else {
        name.strip_suffix(".go").unwrap_or(name)
    }
}
