//! Assembly of the exported declaration tree of a package.
//!
//! Values, factory functions and methods are attached to the exported type they
//! belong to; everything else stays at package level.

use super::comment::doc_comment;
use super::gofile::{GoFile, descendants_of_kind, field_nodes, is_exported, named_children};
use super::render::{base_type_name, render_decl};
use crate::types::{Decl, Example, Func, Type, Value};
use std::collections::{BTreeMap, HashMap};
use tree_sitter::Node;

/// Share of a value group's specs that must name the same type for the group
/// to be listed under that type.
const TYPED_VALUE_THRESHOLD: (usize, usize) = (3, 4);

/// The exported declarations of a package.
#[derive(Debug, Default)]
pub(crate) struct Declarations {
    pub(crate) consts: Vec<Value>,
    pub(crate) vars: Vec<Value>,
    pub(crate) funcs: Vec<Func>,
    pub(crate) types: Vec<Type>,
}

impl Declarations {
    pub(crate) fn is_empty(&self) -> bool {
        self.consts.is_empty() && self.vars.is_empty() && self.funcs.is_empty() && self.types.is_empty()
    }

    /// Attach examples to their functions, types and methods by target name.
    pub(crate) fn attach_examples(&mut self, examples: &BTreeMap<String, Vec<Example>>) {
        let lookup = |name: &str| examples.get(name).cloned().unwrap_or_default();

        for func in &mut self.funcs {
            func.examples = lookup(&func.name);
        }
        for ty in &mut self.types {
            ty.examples = lookup(&ty.name);
            for func in &mut ty.funcs {
                func.examples = lookup(&func.name);
            }
            for method in &mut ty.methods {
                method.examples = lookup(&format!("{}_{}", ty.name, method.name));
            }
        }
    }
}

/// A value group with the keys it is sorted by.
struct OrderedValue {
    sorting_name: String,
    order: usize,
    value: Value,
}

fn sorted_values(mut values: Vec<OrderedValue>) -> Vec<Value> {
    values.sort_by(|a, b| {
        a.sorting_name
            .cmp(&b.sorting_name)
            .then(a.order.cmp(&b.order))
    });
    values.into_iter().map(|v| v.value).collect()
}

#[derive(Default)]
struct TypeEntry {
    ty: Option<Type>,
    consts: Vec<OrderedValue>,
    vars: Vec<OrderedValue>,
}

/// Reads the exported declarations of the chosen package files.
pub(crate) struct PackageReader<'a> {
    files: &'a [GoFile],
    anchor_format: &'a str,
    urls: &'a HashMap<String, String>,
    imports: Vec<HashMap<String, String>>,
}

impl<'a> PackageReader<'a> {
    pub(crate) fn new(
        files: &'a [GoFile],
        anchor_format: &'a str,
        urls: &'a HashMap<String, String>,
    ) -> Self {
        let imports = files.iter().map(GoFile::import_map).collect();
        Self {
            files,
            anchor_format,
            urls,
            imports,
        }
    }

    pub(crate) fn read(&self) -> Declarations {
        let mut types = self.read_types();

        let mut consts = Vec::new();
        let mut vars = Vec::new();
        let mut funcs = Vec::new();
        let mut order = 0;

        for (index, file) in self.files.iter().enumerate() {
            for node in file.top_level() {
                match node.kind() {
                    "const_declaration" | "var_declaration" => {
                        let is_const = node.kind() == "const_declaration";
                        let Some(value) = self.read_value(index, node, order) else {
                            continue;
                        };
                        order += 1;

                        let owner = dominant_type(file, is_const, &exported_specs(file, node))
                            .and_then(|name| types.get_mut(name))
                            .filter(|entry| entry.ty.is_some());
                        match (owner, is_const) {
                            (Some(entry), true) => entry.consts.push(value),
                            (Some(entry), false) => entry.vars.push(value),
                            (None, true) => consts.push(value),
                            (None, false) => vars.push(value),
                        }
                    }
                    "function_declaration" => {
                        let Some(func) = self.read_func(index, node) else {
                            continue;
                        };
                        let owner = factory_type(file, node)
                            .and_then(|name| types.get_mut(name))
                            .and_then(|entry| entry.ty.as_mut());
                        match owner {
                            Some(ty) => ty.funcs.push(func),
                            None => funcs.push(func),
                        }
                    }
                    "method_declaration" => {
                        let Some(receiver) = receiver_type(file, node) else {
                            continue;
                        };
                        let Some(ty) = types.get_mut(receiver).and_then(|e| e.ty.as_mut()) else {
                            tracing::trace!("Dropping method on unexported or unknown type '{}'", receiver);
                            continue;
                        };
                        if let Some(method) = self.read_func(index, node) {
                            ty.methods.push(method);
                        }
                    }
                    _ => {}
                }
            }
        }

        funcs.sort_by(|a, b| a.name.cmp(&b.name));

        // BTreeMap iteration yields types sorted by name.
        let types = types
            .into_values()
            .filter_map(|entry| {
                let mut ty = entry.ty?;
                ty.consts = sorted_values(entry.consts);
                ty.vars = sorted_values(entry.vars);
                ty.funcs.sort_by(|a, b| a.name.cmp(&b.name));
                ty.methods.sort_by(|a, b| a.name.cmp(&b.name));
                Some(ty)
            })
            .collect();

        Declarations {
            consts: sorted_values(consts),
            vars: sorted_values(vars),
            funcs,
            types,
        }
    }

    fn read_types(&self) -> BTreeMap<&'a str, TypeEntry> {
        let mut types: BTreeMap<&'a str, TypeEntry> = BTreeMap::new();
        for (index, file) in self.files.iter().enumerate() {
            for decl in file.top_level() {
                if decl.kind() != "type_declaration" {
                    continue;
                }
                let specs = descendants_of_kind(decl, &["type_spec", "type_alias"]);
                let grouped = specs.len() > 1;
                for spec in specs {
                    let Some(name) = spec.child_by_field_name("name").map(|n| file.text(n)) else {
                        continue;
                    };
                    if !is_exported(name) {
                        continue;
                    }
                    let mut doc = doc_comment(file, spec);
                    if doc.is_empty() && !grouped {
                        doc = doc_comment(file, decl);
                    }
                    let anchor = if grouped { spec } else { decl };
                    types.entry(name).or_default().ty = Some(Type {
                        doc,
                        name: name.to_string(),
                        decl: self.decl(index, spec),
                        url: self.url(index, anchor),
                        consts: Vec::new(),
                        vars: Vec::new(),
                        funcs: Vec::new(),
                        methods: Vec::new(),
                        examples: Vec::new(),
                    });
                }
            }
        }
        types
    }

    fn read_value(&self, index: usize, node: Node<'_>, order: usize) -> Option<OrderedValue> {
        let file = &self.files[index];
        let specs = exported_specs(file, node);
        if specs.is_empty() {
            return None;
        }
        let sorting_name = match specs.as_slice() {
            [spec] => field_nodes(*spec, "name")
                .iter()
                .map(|n| file.text(*n))
                .find(|name| is_exported(name))
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        };
        Some(OrderedValue {
            sorting_name,
            order,
            value: Value {
                decl: self.decl(index, node),
                url: self.url(index, node),
                doc: doc_comment(file, node),
            },
        })
    }

    fn read_func(&self, index: usize, node: Node<'_>) -> Option<Func> {
        let file = &self.files[index];
        let name = file.text(node.child_by_field_name("name")?);
        if !is_exported(name) {
            return None;
        }
        let recv = node
            .child_by_field_name("receiver")
            .and_then(|r| receiver_param(r)?.child_by_field_name("type"))
            .map(|t| file.text(t).to_string())
            .unwrap_or_default();
        Some(Func {
            decl: self.decl(index, node),
            url: self.url(index, node),
            doc: doc_comment(file, node),
            name: name.to_string(),
            recv,
            examples: Vec::new(),
        })
    }

    fn decl(&self, index: usize, node: Node<'_>) -> Decl {
        render_decl(&self.files[index], node, &self.imports[index])
    }

    fn url(&self, index: usize, node: Node<'_>) -> String {
        let file = &self.files[index];
        let base = self.urls.get(&file.name).map_or("", String::as_str);
        format!("{}{}", base, format_anchor(self.anchor_format, file.line(node)))
    }
}

/// Substitute `line` for the first `%d` of a printf-style anchor format.
pub(crate) fn format_anchor(anchor_format: &str, line: usize) -> String {
    anchor_format.replacen("%d", &line.to_string(), 1)
}

/// Value specs of a const/var declaration that declare at least one exported name.
fn exported_specs<'t>(file: &GoFile, decl: Node<'t>) -> Vec<Node<'t>> {
    descendants_of_kind(decl, &["const_spec", "var_spec"])
        .into_iter()
        .filter(|spec| {
            field_nodes(*spec, "name")
                .iter()
                .any(|n| is_exported(file.text(*n)))
        })
        .collect()
}

/// The local type a value group is predominantly declared with.
///
/// Untyped constants without a value inherit the type of the spec above them
/// (the `iota` pattern). Groups mixing several named types belong to none.
fn dominant_type<'f>(file: &'f GoFile, is_const: bool, specs: &[Node<'_>]) -> Option<&'f str> {
    let mut dominant: Option<&'f str> = None;
    let mut frequency = 0;
    let mut prev: Option<&'f str> = None;

    for spec in specs {
        let name = match spec.child_by_field_name("type") {
            Some(ty) => base_type_name(file, ty)
                .and_then(|(name, imported)| (!imported).then_some(name)),
            None if is_const && spec.child_by_field_name("value").is_none() => prev,
            None => None,
        };
        if let Some(name) = name {
            if dominant.is_some_and(|d| d != name) {
                return None;
            }
            dominant = Some(name);
            frequency += 1;
        }
        prev = name;
    }

    let (num, den) = TYPED_VALUE_THRESHOLD;
    dominant.filter(|name| is_exported(name) && frequency >= specs.len() * num / den)
}

/// The local type a function constructs, when exactly one of its results names one.
fn factory_type<'f>(file: &'f GoFile, func: Node<'_>) -> Option<&'f str> {
    let result = func.child_by_field_name("result")?;
    let result_types: Vec<Node<'_>> = if result.kind() == "parameter_list" {
        named_children(result)
            .into_iter()
            .filter_map(|param| param.child_by_field_name("type"))
            .collect()
    } else {
        vec![result]
    };

    let mut found = None;
    let mut count = 0;
    for ty in result_types {
        let ty = match ty.kind() {
            "slice_type" | "array_type" => match ty.child_by_field_name("element") {
                Some(element) => element,
                None => continue,
            },
            _ => ty,
        };
        if let Some((name, false)) = base_type_name(file, ty)
            && is_exported(name)
        {
            found = Some(name);
            count += 1;
        }
    }
    found.filter(|_| count == 1)
}

fn receiver_param(receiver: Node<'_>) -> Option<Node<'_>> {
    named_children(receiver)
        .into_iter()
        .find(|n| n.kind() == "parameter_declaration")
}

/// Base type name of a method's receiver.
fn receiver_type<'f>(file: &'f GoFile, method: Node<'_>) -> Option<&'f str> {
    let receiver = method.child_by_field_name("receiver")?;
    let ty = receiver_param(receiver)?.child_by_field_name("type")?;
    base_type_name(file, ty).map(|(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    fn read(src: &str) -> Declarations {
        let files = vec![GoFile::parse("a.go", src.as_bytes()).expect("test source parses")];
        let urls = HashMap::from([("a.go".to_string(), "https://src/a.go".to_string())]);
        PackageReader::new(&files, "#L%d", &urls).read()
    }

    #[rstest]
    #[case("#L%d", 12, "#L12")]
    #[case("#%d", 3, "#3")]
    #[case("", 3, "")]
    fn test_format_anchor(#[case] format: &str, #[case] line: usize, #[case] expected: &str) {
        check!(format_anchor(format, line) == expected);
    }

    #[test]
    fn test_unexported_declarations_are_dropped() {
        let decls = read("package p\n\nfunc helper() {}\n\ntype inner struct{}\n\nvar count int\n\nconst max = 1\n");
        check!(decls.is_empty());
    }

    #[test]
    fn test_methods_and_factories_attach_to_types() {
        let src = "package p\n\n// File is an open file.\ntype File struct{}\n\n// Open opens.\nfunc Open(name string) (*File, error) { return nil, nil }\n\nfunc (f *File) Close() error { return nil }\n\nfunc (f *File) sync() {}\n\nfunc (h hidden) Run() {}\n\nfunc Join(a, b string) string { return a }\n";
        let decls = read(src);

        check!(decls.funcs.len() == 1);
        check!(decls.funcs[0].name == "Join");
        check!(decls.funcs[0].url == "https://src/a.go#L15");

        check!(decls.types.len() == 1);
        let file = &decls.types[0];
        check!(file.name == "File");
        check!(file.doc == "File is an open file.\n");
        check!(file.url == "https://src/a.go#L4");
        check!(file.funcs.len() == 1);
        check!(file.funcs[0].name == "Open");
        check!(file.funcs[0].doc == "Open opens.\n");
        check!(file.methods.len() == 1);
        check!(file.methods[0].name == "Close");
        check!(file.methods[0].recv == "*File");
        check!(file.methods[0].decl.text == "func (f *File) Close() error");
    }

    #[test]
    fn test_typed_constants_attach_to_their_type() {
        let src = "package p\n\ntype Color int\n\nconst (\n\tRed Color = iota\n\tGreen\n\tBlue\n)\n\nconst Pi = 3.14\n\nvar (\n\tA = 1\n\tB = 2\n\tC Color\n\tD = 3\n)\n";
        let decls = read(src);

        check!(decls.types[0].consts.len() == 1);
        check!(decls.types[0].consts[0].decl.text.contains("Green"));
        check!(decls.consts.len() == 1);
        check!(decls.consts[0].decl.text == "const Pi = 3.14");
        // One typed spec out of four does not reach the threshold
        check!(decls.vars.len() == 1);
        check!(decls.types[0].vars.is_empty());
    }

    #[test]
    fn test_declarations_are_sorted() {
        let src = "package p\n\nfunc Zed() {}\nfunc Alpha() {}\n\ntype Y int\ntype X int\n\nconst B = 1\nconst A = 2\n";
        let decls = read(src);
        let funcs: Vec<_> = decls.funcs.iter().map(|f| f.name.as_str()).collect();
        let types: Vec<_> = decls.types.iter().map(|t| t.name.as_str()).collect();
        check!(funcs == ["Alpha", "Zed"]);
        check!(types == ["X", "Y"]);
        check!(decls.consts[0].decl.text == "const A = 2");
    }

    #[test]
    fn test_attach_examples() {
        let mut decls = read("package p\n\ntype T int\n\nfunc (T) M() {}\n\nfunc F() {}\n");
        let example = Example {
            code: "F()".into(),
            output: String::new(),
        };
        let examples = BTreeMap::from([
            ("F".to_string(), vec![example.clone()]),
            ("T_M".to_string(), vec![example.clone(), example.clone()]),
        ]);
        decls.attach_examples(&examples);

        check!(decls.funcs[0].examples.len() == 1);
        check!(decls.types[0].examples.is_empty());
        check!(decls.types[0].methods[0].examples.len() == 2);
    }
}
