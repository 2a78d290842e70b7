//! Reflection provider backing the compiler.
//!
//! The compiler works over classes: types with doc-comment annotations, the
//! methods declared in their inherent impl blocks, and their fields. This
//! module builds that view statically from parsed syntax trees: a
//! [`ClassRegistry`] indexes every discovered class by its fully-qualified
//! `::`-separated path, records per-file import tables from `use` items, and
//! resolves bare type references the way the source file would.

use crate::parser::ParsedFile;
use indexmap::IndexMap;
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A method declared directly on a class (in an inherent impl block within
/// the declaring file).
#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub name: String,
    /// Raw doc-comment text, one line per `///` line
    pub doc: String,
}

/// A named field of a class.
#[derive(Debug, Clone)]
pub struct PropertyInfo {
    pub name: String,
    /// Raw doc-comment text of the field
    pub doc: String,
    /// Fully-qualified path of the class declaring this property. Reference
    /// lookups for the property's type start from this class's file and
    /// namespace.
    pub declaring_class: String,
}

/// Everything the compiler knows about one class.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    /// Short name, e.g. `Pet`
    pub name: String,
    /// Fully-qualified path, e.g. `models::Pet`
    pub full_path: String,
    /// Namespace the class lives in, e.g. `models`; empty at the crate root
    pub namespace: String,
    /// File the class was declared in
    pub file: PathBuf,
    /// Raw doc-comment text of the type itself
    pub doc: String,
    pub methods: Vec<MethodInfo>,
    pub properties: Vec<PropertyInfo>,
    /// Scenario name -> ordered property-name tokens, each optionally
    /// prefixed with the required marker `*`. Declared on the type's doc
    /// comment as `@api-scenario <name> <token>...` lines.
    pub scenarios: IndexMap<String, Vec<String>>,
}

/// Registry of all classes discovered in a project, in discovery order.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: IndexMap<String, ClassInfo>,
    /// Per-file import tables: short name -> fully-qualified path
    imports: HashMap<PathBuf, HashMap<String, String>>,
}

impl ClassRegistry {
    /// Builds the registry from parsed files. `root` is the project root the
    /// scan started from; namespaces are derived from paths relative to it.
    pub fn from_parsed_files(parsed_files: &[ParsedFile], root: &Path) -> Self {
        let mut registry = Self::default();

        for parsed in parsed_files {
            let namespace = namespace_from_path(&parsed.path, root);
            registry
                .imports
                .insert(parsed.path.clone(), collect_use_map(&parsed.syntax_tree.items));
            registry.collect_items(&parsed.syntax_tree.items, &namespace, &parsed.path);
        }

        debug!("Reflected {} classes", registry.classes.len());
        registry
    }

    fn collect_items(&mut self, items: &[syn::Item], namespace: &str, file: &Path) {
        // Structs first so that impl blocks in the same item list always find
        // their class.
        for item in items {
            if let syn::Item::Struct(item_struct) = item {
                self.collect_struct(item_struct, namespace, file);
            }
        }

        for item in items {
            match item {
                syn::Item::Impl(item_impl) => self.collect_impl(item_impl, namespace),
                syn::Item::Mod(item_mod) => {
                    if let Some((_, nested)) = &item_mod.content {
                        let nested_ns = join_namespace(namespace, &item_mod.ident.to_string());
                        self.collect_items(nested, &nested_ns, file);
                    }
                }
                _ => {}
            }
        }
    }

    fn collect_struct(&mut self, item_struct: &syn::ItemStruct, namespace: &str, file: &Path) {
        let name = item_struct.ident.to_string();
        let full_path = join_namespace(namespace, &name);
        let doc = doc_text(&item_struct.attrs);

        let mut properties = Vec::new();
        if let syn::Fields::Named(named) = &item_struct.fields {
            for field in &named.named {
                if let Some(ident) = &field.ident {
                    properties.push(PropertyInfo {
                        name: ident.to_string(),
                        doc: doc_text(&field.attrs),
                        declaring_class: full_path.clone(),
                    });
                }
            }
        }

        let scenarios = parse_scenarios(&doc);

        debug!("Reflected class {}", full_path);
        self.classes.insert(
            full_path.clone(),
            ClassInfo {
                name,
                full_path,
                namespace: namespace.to_string(),
                file: file.to_path_buf(),
                doc,
                methods: Vec::new(),
                properties,
                scenarios,
            },
        );
    }

    fn collect_impl(&mut self, item_impl: &syn::ItemImpl, namespace: &str) {
        // Trait impls are not part of a class's directly-declared surface
        if item_impl.trait_.is_some() {
            return;
        }

        let syn::Type::Path(type_path) = item_impl.self_ty.as_ref() else {
            return;
        };
        let Some(segment) = type_path.path.segments.last() else {
            return;
        };

        let full_path = join_namespace(namespace, &segment.ident.to_string());
        let Some(class) = self.classes.get_mut(&full_path) else {
            debug!("Skipping impl block for unknown class {}", full_path);
            return;
        };

        for impl_item in &item_impl.items {
            if let syn::ImplItem::Fn(method) = impl_item {
                class.methods.push(MethodInfo {
                    name: method.sig.ident.to_string(),
                    doc: doc_text(&method.attrs),
                });
            }
        }
    }

    pub fn get(&self, full_path: &str) -> Option<&ClassInfo> {
        self.classes.get(full_path)
    }

    pub fn contains(&self, full_path: &str) -> bool {
        self.classes.contains_key(full_path)
    }

    /// Classes in discovery order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassInfo> {
        self.classes.values()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Resolves a bare class-name token as seen from `declaring`'s file.
    ///
    /// Checks, in order, first match wins: the token is already a
    /// fully-qualified existing path; the token appears in the declaring
    /// file's import table; the token names a class in the declaring class's
    /// own namespace.
    pub fn resolve_reference(&self, token: &str, declaring: &ClassInfo) -> Option<String> {
        if self.classes.contains_key(token) {
            return Some(token.to_string());
        }

        if let Some(imports) = self.imports.get(&declaring.file) {
            if let Some(full) = imports.get(token) {
                if self.classes.contains_key(full) {
                    return Some(full.clone());
                }
            }
        }

        let in_namespace = join_namespace(&declaring.namespace, token);
        if self.classes.contains_key(&in_namespace) {
            return Some(in_namespace);
        }

        None
    }

    /// The import table recorded for a file, if any.
    pub fn imports_for(&self, file: &Path) -> Option<&HashMap<String, String>> {
        self.imports.get(file)
    }
}

/// Joins a namespace and a name with `::`, treating the crate root as empty.
fn join_namespace(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", namespace, name)
    }
}

/// Derives the module namespace of a file from its path relative to the
/// project root. `src/` prefixes are dropped, as are `lib`/`main`/`mod` file
/// stems, so `src/models/pet.rs` becomes `models::pet` and `src/lib.rs`
/// becomes the empty crate-root namespace.
pub fn namespace_from_path(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);

    let mut parts: Vec<String> = relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();

    if parts.first().map(String::as_str) == Some("src") {
        parts.remove(0);
    }
    if matches!(parts.last().map(String::as_str), Some("lib") | Some("main") | Some("mod")) {
        parts.pop();
    }

    parts.join("::")
}

/// Joins the string values of all `#[doc]` attributes into one doc-comment
/// text, one source line per line.
fn doc_text(attrs: &[syn::Attribute]) -> String {
    let mut lines = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        if let syn::Meta::NameValue(nv) = &attr.meta {
            if let syn::Expr::Lit(expr_lit) = &nv.value {
                if let syn::Lit::Str(lit) = &expr_lit.lit {
                    lines.push(lit.value().trim().to_string());
                }
            }
        }
    }
    lines.join("\n")
}

/// Extracts the scenario table from a class doc comment. Each
/// `@api-scenario <name> <token>...` line declares one scenario; tokens keep
/// their optional `*` required markers.
fn parse_scenarios(doc: &str) -> IndexMap<String, Vec<String>> {
    let mut scenarios = IndexMap::new();
    for line in doc.lines() {
        let Some(rest) = line.trim().strip_prefix("@api-scenario") else {
            continue;
        };
        let mut tokens = rest.split_whitespace();
        if let Some(name) = tokens.next() {
            scenarios.insert(name.to_string(), tokens.map(str::to_string).collect());
        }
    }
    scenarios
}

/// Builds a per-file map from imported short name to fully-qualified path.
/// A leading `crate`/`self` segment is dropped so the result matches the
/// root-relative paths the registry is keyed by.
fn collect_use_map(items: &[syn::Item]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for item in items {
        if let syn::Item::Use(item_use) = item {
            collect_use_tree(&item_use.tree, &mut Vec::new(), &mut map);
        }
    }
    map
}

fn collect_use_tree(tree: &syn::UseTree, prefix: &mut Vec<String>, map: &mut HashMap<String, String>) {
    match tree {
        syn::UseTree::Path(path) => {
            prefix.push(path.ident.to_string());
            collect_use_tree(&path.tree, prefix, map);
            prefix.pop();
        }
        syn::UseTree::Name(name) => {
            let short = name.ident.to_string();
            map.insert(short.clone(), qualify(prefix, &short));
        }
        syn::UseTree::Rename(rename) => {
            map.insert(rename.rename.to_string(), qualify(prefix, &rename.ident.to_string()));
        }
        syn::UseTree::Group(group) => {
            for item in &group.items {
                collect_use_tree(item, prefix, map);
            }
        }
        syn::UseTree::Glob(_) => {}
    }
}

fn qualify(prefix: &[String], name: &str) -> String {
    let mut parts: Vec<&str> = prefix
        .iter()
        .map(String::as_str)
        .filter(|s| *s != "crate" && *s != "self")
        .collect();
    parts.push(name);
    parts.join("::")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::AstParser;
    use std::fs;
    use tempfile::TempDir;

    fn registry_from(files: Vec<(&str, &str)>) -> (ClassRegistry, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for (name, content) in files {
            let path = temp_dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, content).unwrap();
            paths.push(path);
        }
        let parsed: Vec<_> = AstParser::parse_files(&paths)
            .into_iter()
            .filter_map(Result::ok)
            .collect();
        let registry = ClassRegistry::from_parsed_files(&parsed, temp_dir.path());
        (registry, temp_dir)
    }

    #[test]
    fn test_namespace_from_path() {
        let root = Path::new("/project");
        assert_eq!(
            namespace_from_path(Path::new("/project/src/models/pet.rs"), root),
            "models::pet"
        );
        assert_eq!(namespace_from_path(Path::new("/project/src/lib.rs"), root), "");
        assert_eq!(
            namespace_from_path(Path::new("/project/src/models/mod.rs"), root),
            "models"
        );
        assert_eq!(
            namespace_from_path(Path::new("/project/controllers.rs"), root),
            "controllers"
        );
    }

    #[test]
    fn test_collects_classes_with_properties_and_doc() {
        let (registry, _dir) = registry_from(vec![(
            "src/models/pet.rs",
            r#"
                /// A pet in the store.
                ///
                /// @api-scenario default id *name
                pub struct Pet {
                    /// @var integer Unique id
                    pub id: u64,
                    /// @var string Display name
                    pub name: String,
                }
            "#,
        )]);

        let class = registry.get("models::pet::Pet").expect("class not found");
        assert_eq!(class.name, "Pet");
        assert_eq!(class.namespace, "models::pet");
        assert!(class.doc.contains("A pet in the store."));
        assert_eq!(class.properties.len(), 2);
        assert_eq!(class.properties[0].name, "id");
        assert_eq!(class.properties[0].declaring_class, "models::pet::Pet");

        let scenario = class.scenarios.get("default").unwrap();
        assert_eq!(scenario, &vec!["id".to_string(), "*name".to_string()]);
    }

    #[test]
    fn test_collects_methods_from_inherent_impl_only() {
        let (registry, _dir) = registry_from(vec![(
            "pets.rs",
            r#"
                /// @api-path /pets
                pub struct PetController;

                impl PetController {
                    /// Lists pets.
                    ///
                    /// @api-method get
                    pub fn index(&self) {}

                    pub fn helper(&self) {}
                }

                impl Default for PetController {
                    fn default() -> Self {
                        PetController
                    }
                }
            "#,
        )]);

        let class = registry.get("pets::PetController").unwrap();
        let names: Vec<&str> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["index", "helper"]);
        assert!(class.methods[0].doc.contains("@api-method get"));
    }

    #[test]
    fn test_multiple_scenarios() {
        let (registry, _dir) = registry_from(vec![(
            "forms.rs",
            r#"
                /// @api-scenario default id name email
                /// @api-scenario create *name *email
                pub struct UserForm {
                    /// @var integer Id
                    pub id: u64,
                }
            "#,
        )]);

        let class = registry.get("forms::UserForm").unwrap();
        assert_eq!(class.scenarios.len(), 2);
        assert_eq!(
            class.scenarios.get("create").unwrap(),
            &vec!["*name".to_string(), "*email".to_string()]
        );
    }

    #[test]
    fn test_use_map_resolution() {
        let (registry, _dir) = registry_from(vec![
            (
                "src/models.rs",
                r#"
                    pub struct Tag {
                        /// @var string Label
                        pub label: String,
                    }
                "#,
            ),
            (
                "src/forms.rs",
                r#"
                    use crate::models::Tag;

                    pub struct PetForm {
                        /// @var Tag The tag
                        pub tag: Tag,
                    }
                "#,
            ),
        ]);

        let form = registry.get("forms::PetForm").unwrap();
        assert_eq!(
            registry.resolve_reference("Tag", form),
            Some("models::Tag".to_string())
        );
    }

    #[test]
    fn test_resolution_order_fully_qualified_wins() {
        let (registry, _dir) = registry_from(vec![(
            "src/models.rs",
            r#"
                pub struct Tag {
                    /// @var string Label
                    pub label: String,
                }
            "#,
        )]);

        let tag = registry.get("models::Tag").unwrap();
        assert_eq!(
            registry.resolve_reference("models::Tag", tag),
            Some("models::Tag".to_string())
        );
    }

    #[test]
    fn test_resolution_falls_back_to_declaring_namespace() {
        let (registry, _dir) = registry_from(vec![(
            "src/models.rs",
            r#"
                pub struct Owner {
                    /// @var string Name
                    pub name: String,
                }

                pub struct Pet {
                    /// @var Owner The owner
                    pub owner: Owner,
                }
            "#,
        )]);

        let pet = registry.get("models::Pet").unwrap();
        assert_eq!(
            registry.resolve_reference("Owner", pet),
            Some("models::Owner".to_string())
        );
        assert_eq!(registry.resolve_reference("Stranger", pet), None);
    }

    #[test]
    fn test_inline_modules_extend_namespace() {
        let (registry, _dir) = registry_from(vec![(
            "src/lib.rs",
            r#"
                pub mod models {
                    pub struct Pet {
                        /// @var string Name
                        pub name: String,
                    }
                }
            "#,
        )]);

        assert!(registry.contains("models::Pet"));
    }

    #[test]
    fn test_use_rename_and_group() {
        let (registry, _dir) = registry_from(vec![
            (
                "src/models.rs",
                r#"
                    pub struct Pet {
                        /// @var string Name
                        pub name: String,
                    }
                    pub struct Owner {
                        /// @var string Name
                        pub name: String,
                    }
                "#,
            ),
            (
                "src/api.rs",
                r#"
                    use crate::models::{Pet as Animal, Owner};

                    pub struct Shelter {
                        /// @var Animal Current resident
                        pub resident: Pet,
                    }
                "#,
            ),
        ]);

        let shelter = registry.get("api::Shelter").unwrap();
        assert_eq!(
            registry.resolve_reference("Animal", shelter),
            Some("models::Pet".to_string())
        );
        assert_eq!(
            registry.resolve_reference("Owner", shelter),
            Some("models::Owner".to_string())
        );
    }
}
