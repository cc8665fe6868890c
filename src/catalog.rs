//! Loaded-rule catalog for the combinator
//!
//! Indexes simple class selectors (`.p-3`, `.btn:hover`, the same inside
//! `@media`) across every loaded stylesheet. A class defined again later
//! merges into its entry per property, last definition winning.

use crate::error::{CascadeError, Result};
use crate::parser;
use crate::selector;
use crate::types::{Declaration, Scope};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Declarations of one class under one scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedDeclarations {
    pub scope: Scope,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassEntry {
    pub name: String,
    /// Scopes in first-definition order
    pub scopes: Vec<ScopedDeclarations>,
}

impl ClassEntry {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            scopes: Vec::new(),
        }
    }

    pub fn declarations_for(&self, scope: &Scope) -> &[Declaration] {
        self.scopes
            .iter()
            .find(|s| &s.scope == scope)
            .map(|s| s.declarations.as_slice())
            .unwrap_or(&[])
    }

    fn absorb(&mut self, scope: Scope, declarations: Vec<Declaration>) {
        let slot = match self.scopes.iter().position(|s| s.scope == scope) {
            Some(index) => &mut self.scopes[index],
            None => {
                self.scopes.push(ScopedDeclarations {
                    scope,
                    declarations: Vec::new(),
                });
                let last = self.scopes.len() - 1;
                &mut self.scopes[last]
            }
        };
        for decl in declarations {
            slot.declarations.retain(|d| d.property != decl.property);
            slot.declarations.push(decl);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CssCatalog {
    classes: Vec<ClassEntry>,
    sources: Vec<String>,
    skipped_selectors: usize,
}

impl CssCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `css` and indexes its class rules under the source `name`.
    /// Returns how many rules were indexed.
    pub fn load_text(&mut self, name: &str, css: &str) -> Result<usize> {
        let rules = parser::parse_stylesheet(css)?;
        let mut indexed = 0;

        for rule in rules {
            let Some((class, None)) = selector::simple_class(&rule.selector) else {
                log::debug!("Catalog skips non-class selector '{}' in {}", rule.full_selector(), name);
                self.skipped_selectors += 1;
                continue;
            };
            let scope = rule.scope();
            let index = match self.classes.iter().position(|c| c.name == class) {
                Some(index) => index,
                None => {
                    self.classes.push(ClassEntry::new(&class));
                    self.classes.len() - 1
                }
            };
            self.classes[index].absorb(scope, rule.declarations);
            indexed += 1;
        }

        self.sources.push(name.to_string());
        log::info!("Loaded {} class rule(s) from {}", indexed, name);
        Ok(indexed)
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let css = fs::read_to_string(path).map_err(|e| CascadeError::FileNotFound {
            path: format!("{}: {}", path.display(), e),
        })?;
        self.load_text(&path.display().to_string(), &css)
    }

    /// Loads every `.css` file below `dir`, in file-name order
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let mut total = 0;
        for entry in WalkDir::new(dir.as_ref()).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                CascadeError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Directory traversal error: {}", e),
                ))
            })?;
            if entry.file_type().is_file() && entry.path().extension().map_or(false, |ext| ext == "css") {
                total += self.load_file(entry.path())?;
            }
        }
        Ok(total)
    }

    pub fn clear(&mut self) {
        self.classes.clear();
        self.sources.clear();
        self.skipped_selectors = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.class(name).is_some()
    }

    pub fn class(&self, name: &str) -> Option<&ClassEntry> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn classes(&self) -> &[ClassEntry] {
        &self.classes
    }

    pub fn loaded_sources(&self) -> &[String] {
        &self.sources
    }

    pub fn skipped_selectors(&self) -> usize {
        self.skipped_selectors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const UTILITIES: &str = r#"
        .p-3 { padding: 1rem; }
        .pt-2 { padding-top: .5rem; }
        .btn:hover { color: red; }
        .card .title { font-weight: bold; }
        @media (min-width: 768px) { .md\:p-4 { padding: 1.5rem; } }
    "#;

    #[test]
    fn test_indexes_simple_classes() {
        let mut catalog = CssCatalog::new();
        assert!(catalog.is_empty());
        assert_eq!(catalog.load_text("utilities.css", UTILITIES).unwrap(), 4);
        assert_eq!(catalog.skipped_selectors(), 1);
        assert!(catalog.has_class("p-3"));
        assert!(catalog.has_class("md:p-4"));
        assert!(!catalog.has_class("title"));

        let btn = catalog.class("btn").unwrap();
        assert_eq!(btn.declarations_for(&Scope::pseudo(":hover"))[0].value, "red");
        assert!(btn.declarations_for(&Scope::base()).is_empty());

        let md = catalog.class("md:p-4").unwrap();
        assert_eq!(md.scopes[0].scope, Scope::media("(min-width: 768px)"));
    }

    #[test]
    fn test_later_source_wins_per_property() {
        let mut catalog = CssCatalog::new();
        catalog.load_text("a.css", ".box { color: red; margin: 0; }").unwrap();
        catalog.load_text("b.css", ".box { color: blue; }").unwrap();
        let decls = catalog.class("box").unwrap().declarations_for(&Scope::base());
        let text: Vec<String> = decls.iter().map(|d| d.to_string()).collect();
        assert_eq!(text, vec!["margin: 0", "color: blue"]);
        assert_eq!(catalog.loaded_sources(), &["a.css".to_string(), "b.css".to_string()]);

        catalog.clear();
        assert!(catalog.is_empty());
        assert!(!catalog.has_class("box"));
    }

    #[test]
    fn test_load_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.css"), ".a { color: red; }").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/b.css"), ".b { color: blue; }").unwrap();
        fs::write(dir.path().join("notes.txt"), ".c { color: green; }").unwrap();

        let mut catalog = CssCatalog::new();
        assert_eq!(catalog.load_dir(dir.path()).unwrap(), 2);
        assert!(catalog.has_class("a"));
        assert!(catalog.has_class("b"));
        assert!(!catalog.has_class("c"));
        assert_eq!(catalog.loaded_sources().len(), 2);
    }

    #[test]
    fn test_missing_file_and_bad_css() {
        let mut catalog = CssCatalog::new();
        assert!(matches!(
            catalog.load_file("/definitely/not/here.css"),
            Err(CascadeError::FileNotFound { .. })
        ));
        assert!(catalog.load_text("broken.css", ".a { color: red;").is_err());
        assert!(catalog.is_empty());
    }
}
