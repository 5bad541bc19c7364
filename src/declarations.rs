// Copyright 2018-2024 the Deno authors. MIT license.

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// The top level import and export surface of a file, as extracted from its
/// AST. Statements that neither import nor export are not represented.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDeclarations {
  /// Whether the file is an external module. Scripts, global declaration
  /// files and files containing only internal namespaces are not.
  pub is_module: bool,
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub declarations: Vec<Declaration>,
}

impl ModuleDeclarations {
  /// A module with the provided declarations. A file with no import or export
  /// declaration at all is not a module.
  pub fn new(declarations: Vec<Declaration>) -> Self {
    Self {
      is_module: !declarations.is_empty(),
      declarations,
    }
  }

  /// A file that declares into the global scope.
  pub fn ambient() -> Self {
    Self::default()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Declaration {
  /// `import a, {b, c as d} from './m';`, `import * as m from './m';` or the
  /// side effect only `import './m';`.
  Import {
    specifier: String,
    #[serde(default)]
    bindings: Vec<ImportBinding>,
  },
  /// `export {a, b as c};`
  ExportLocals { names: Vec<ExportName> },
  /// `export {a, b as c} from './m';`
  ReExport {
    specifier: String,
    names: Vec<ExportName>,
  },
  /// `export * from './m';`
  ReExportAll { specifier: String },
  /// `export * as ns from './m';`
  ReExportNamespace { specifier: String, name: String },
  /// An export flagged declaration such as `export class A {}`.
  Export(ExportedDecl),
  /// `export default ...;`
  ExportDefault,
  /// `export = ...;`
  ExportAssignment,
  /// An export form that is not understood.
  Unsupported { description: String },
}

impl Declaration {
  pub fn import(
    specifier: impl Into<String>,
    bindings: Vec<ImportBinding>,
  ) -> Self {
    Self::Import {
      specifier: specifier.into(),
      bindings,
    }
  }

  pub fn re_export(
    specifier: impl Into<String>,
    names: Vec<ExportName>,
  ) -> Self {
    Self::ReExport {
      specifier: specifier.into(),
      names,
    }
  }

  pub fn re_export_all(specifier: impl Into<String>) -> Self {
    Self::ReExportAll {
      specifier: specifier.into(),
    }
  }

  pub fn export(kind: DeclKind, name: impl Into<String>) -> Self {
    Self::Export(ExportedDecl {
      kind,
      bindings: vec![BindingPattern::Ident(name.into())],
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ImportBinding {
  /// `import a from './m';`
  Default,
  /// `import * as m from './m';`
  Namespace,
  /// `import {a} from './m';` or `import {a as b} from './m';`. Only the
  /// imported name matters, the local alias does not.
  Named { imported: String },
}

impl ImportBinding {
  pub fn named(imported: impl Into<String>) -> Self {
    Self::Named {
      imported: imported.into(),
    }
  }
}

/// One entry of an export list, `orig` or `orig as exported`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportName {
  pub orig: String,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub exported: Option<String>,
}

impl ExportName {
  pub fn new(orig: impl Into<String>) -> Self {
    Self {
      orig: orig.into(),
      exported: None,
    }
  }

  pub fn aliased(orig: impl Into<String>, exported: impl Into<String>) -> Self {
    Self {
      orig: orig.into(),
      exported: Some(exported.into()),
    }
  }

  /// The name the outside world sees.
  pub fn exported_name(&self) -> &str {
    self.exported.as_deref().unwrap_or(&self.orig)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeclKind {
  Class,
  Function,
  Enum,
  Interface,
  TypeAlias,
  Variable,
  Namespace,
  /// `export import a = require('./m');` or `export import a = b.c;`
  ImportAlias,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedDecl {
  pub kind: DeclKind,
  /// The declared names. Variable statements may have several declarators,
  /// each of which may be a destructuring pattern.
  pub bindings: Vec<BindingPattern>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum BindingPattern {
  Ident(String),
  /// `[a, , [b]]`. Holes are `None`.
  Array(Vec<Option<BindingPattern>>),
  /// `{p: a, q: [b], c}`. Only the bound values are kept, property keys are
  /// irrelevant.
  Object(Vec<BindingPattern>),
}

impl BindingPattern {
  pub fn ident(name: impl Into<String>) -> Self {
    Self::Ident(name.into())
  }

  /// Collects every name bound by the pattern in source order.
  pub fn bound_names(&self) -> Vec<&str> {
    fn collect<'a>(pattern: &'a BindingPattern, names: &mut Vec<&'a str>) {
      match pattern {
        BindingPattern::Ident(name) => names.push(name),
        BindingPattern::Array(elements) => {
          for element in elements.iter().flatten() {
            collect(element, names);
          }
        }
        BindingPattern::Object(values) => {
          for value in values {
            collect(value, names);
          }
        }
      }
    }

    let mut names = Vec::new();
    collect(self, &mut names);
    names
  }
}

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalyzeError {
  #[error("File not found: {0}")]
  NotFound(String),
  #[error("The module's source code could not be parsed: {0}")]
  Parse(String),
}

/// Supplies the declarations of a file.
///
/// The graph only asks for the declarations of files whose module node
/// cannot be reused from a previous build, and may ask for several files at
/// the same time.
pub trait DeclarationAnalyzer: Sync {
  fn analyze(
    &self,
    file_name: &str,
  ) -> Result<ModuleDeclarations, AnalyzeError>;
}

/// An analyzer over declarations that were extracted ahead of time.
#[derive(Debug, Default, Clone)]
pub struct MemoryAnalyzer {
  modules: IndexMap<String, ModuleDeclarations>,
}

impl MemoryAnalyzer {
  pub fn new<S: Into<String>>(
    modules: impl IntoIterator<Item = (S, ModuleDeclarations)>,
  ) -> Self {
    Self {
      modules: modules
        .into_iter()
        .map(|(file_name, declarations)| (file_name.into(), declarations))
        .collect(),
    }
  }

  pub fn add(
    &mut self,
    file_name: impl Into<String>,
    declarations: ModuleDeclarations,
  ) -> &mut Self {
    self.modules.insert(file_name.into(), declarations);
    self
  }

  pub fn remove(&mut self, file_name: &str) -> Option<ModuleDeclarations> {
    self.modules.shift_remove(file_name)
  }

  pub fn file_names(&self) -> impl Iterator<Item = &str> {
    self.modules.keys().map(|k| k.as_str())
  }
}

impl DeclarationAnalyzer for MemoryAnalyzer {
  fn analyze(
    &self,
    file_name: &str,
  ) -> Result<ModuleDeclarations, AnalyzeError> {
    self
      .modules
      .get(file_name)
      .cloned()
      .ok_or_else(|| AnalyzeError::NotFound(file_name.to_string()))
  }
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;
  use serde_json::json;

  use super::*;

  #[test]
  fn test_bound_names() {
    // [, a, [b, c]]
    let pattern = BindingPattern::Array(vec![
      None,
      Some(BindingPattern::ident("a")),
      Some(BindingPattern::Array(vec![
        Some(BindingPattern::ident("b")),
        Some(BindingPattern::ident("c")),
      ])),
    ]);
    assert_eq!(pattern.bound_names(), vec!["a", "b", "c"]);

    // {p: d, q: [e]}
    let pattern = BindingPattern::Object(vec![
      BindingPattern::ident("d"),
      BindingPattern::Array(vec![Some(BindingPattern::ident("e"))]),
    ]);
    assert_eq!(pattern.bound_names(), vec!["d", "e"]);
  }

  #[test]
  fn test_ambient_detection() {
    assert!(!ModuleDeclarations::new(Vec::new()).is_module);
    assert!(!ModuleDeclarations::ambient().is_module);
    assert!(
      ModuleDeclarations::new(vec![Declaration::ExportLocals {
        names: Vec::new()
      }])
      .is_module
    );
  }

  #[test]
  fn test_deserialize_declarations() {
    let actual: ModuleDeclarations = serde_json::from_value(json!({
      "isModule": true,
      "declarations": [
        {
          "type": "import",
          "specifier": "./foo",
          "bindings": [
            { "type": "named", "imported": "a" },
            { "type": "default" }
          ]
        },
        { "type": "reExportAll", "specifier": "./bar" },
        { "type": "exportDefault" }
      ]
    }))
    .unwrap();
    assert_eq!(
      actual,
      ModuleDeclarations::new(vec![
        Declaration::import(
          "./foo",
          vec![ImportBinding::named("a"), ImportBinding::Default]
        ),
        Declaration::re_export_all("./bar"),
        Declaration::ExportDefault,
      ])
    );
  }

  #[test]
  fn test_memory_analyzer() {
    let mut analyzer = MemoryAnalyzer::default();
    analyzer.add("foo.ts", ModuleDeclarations::ambient());
    assert_eq!(
      analyzer.analyze("foo.ts"),
      Ok(ModuleDeclarations::ambient())
    );
    assert_eq!(
      analyzer.analyze("bar.ts"),
      Err(AnalyzeError::NotFound("bar.ts".to_string()))
    );
    assert_eq!(analyzer.file_names().collect::<Vec<_>>(), vec!["foo.ts"]);
  }
}
