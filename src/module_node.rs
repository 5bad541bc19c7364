// Copyright 2018-2024 the Deno authors. MIT license.

use indexmap::IndexMap;
use indexmap::IndexSet;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::declarations::AnalyzeError;
use crate::declarations::Declaration;
use crate::declarations::ImportBinding;
use crate::declarations::ModuleDeclarations;
use crate::resolver::Resolver;
use crate::symbol_key::SymbolKey;
use crate::symbol_key::SymbolKeyError;
use crate::symbol_key::NAMESPACE_IDENTIFIER;

/// Something that made a module node invalid.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ModuleNodeDiagnostic {
  #[error("Unable to resolve \"{specifier}\".")]
  Unresolved { specifier: String },
  #[error("Unsupported export type ({description}). Incremental compilation may be significantly slower.")]
  UnsupportedExport { description: String },
  #[error("{source}")]
  InvalidIdentifier { source: SymbolKeyError },
  #[error("{source}")]
  AnalysisFailed { source: AnalyzeError },
}

/// The symbols a module pulls in and publishes.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSurface {
  /// Symbols that are imported into the local scope.
  /// Corresponds to a statement of `import {foo} from './bar';`.
  pub imports: IndexSet<SymbolKey>,
  /// Symbols that are defined and exported from the local scope.
  /// Corresponds to a statement of `export const foo = 'bar';`.
  ///
  /// These are tracked because they take precedence over a wildcard
  /// re-export of the same name.
  pub exports: IndexSet<SymbolKey>,
  /// Maps an imported symbol to the local symbol this module publishes it
  /// as. Corresponds to a statement of `export {foo} from './bar';`.
  ///
  /// Several `some-module.ts%*` keys may map to the same `this-module.ts%*`,
  /// which is fine because the mapping is only ever read downstream.
  pub reexports: IndexMap<SymbolKey, SymbolKey>,
}

impl ModuleSurface {
  /// Every symbol other modules can import from this module.
  pub fn public_symbols(&self) -> IndexSet<&SymbolKey> {
    self.exports.iter().chain(self.reexports.values()).collect()
  }

  /// The symbols whose file component is an edge to another module.
  pub fn imported_symbols(&self) -> impl Iterator<Item = &SymbolKey> {
    self.imports.iter().chain(self.reexports.keys())
  }
}

/// An immutable summary of the import and export surface of one file.
///
/// Nodes are shared between graphs of consecutive builds, so they are never
/// mutated after being built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleNode {
  file_name: String,
  /// Whether every specifier resolved and every declaration was understood.
  is_valid: bool,
  /// `None` when the module declares into the ambient scope.
  #[serde(skip_serializing_if = "Option::is_none", default)]
  surface: Option<ModuleSurface>,
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  diagnostics: Vec<ModuleNodeDiagnostic>,
}

impl ModuleNode {
  /// A node for a file whose declarations could not be obtained. The node is
  /// treated as ambient so any change to it invalidates every file.
  pub fn analysis_failed(file_name: &str, err: AnalyzeError) -> Self {
    log::warn!("Warning: Unable to analyze {}: {}", file_name, err);
    Self {
      file_name: file_name.to_string(),
      is_valid: false,
      surface: None,
      diagnostics: vec![ModuleNodeDiagnostic::AnalysisFailed { source: err }],
    }
  }

  pub fn file_name(&self) -> &str {
    &self.file_name
  }

  pub fn is_valid(&self) -> bool {
    self.is_valid
  }

  pub fn is_ambient(&self) -> bool {
    self.surface.is_none()
  }

  /// The import and export surface, which only external modules have.
  pub fn surface(&self) -> Option<&ModuleSurface> {
    self.surface.as_ref()
  }

  pub fn diagnostics(&self) -> &[ModuleNodeDiagnostic] {
    &self.diagnostics
  }
}

/// Builds the module node of a file from its declarations.
///
/// Unresolved specifiers and unsupported declarations never fail the build:
/// they mark the node invalid and the rest of the declarations are still
/// processed.
pub fn build_module_node(
  file_name: &str,
  declarations: &ModuleDeclarations,
  resolver: &dyn Resolver,
) -> ModuleNode {
  if !declarations.is_module {
    return ModuleNode {
      file_name: file_name.to_string(),
      is_valid: true,
      surface: None,
      diagnostics: Vec::new(),
    };
  }

  let mut builder = ModuleNodeBuilder {
    file_name,
    resolver,
    surface: ModuleSurface::default(),
    diagnostics: Vec::new(),
  };
  for declaration in &declarations.declarations {
    builder.fill_declaration(declaration);
  }
  ModuleNode {
    file_name: file_name.to_string(),
    is_valid: builder.diagnostics.is_empty(),
    surface: Some(builder.surface),
    diagnostics: builder.diagnostics,
  }
}

struct ModuleNodeBuilder<'a> {
  file_name: &'a str,
  resolver: &'a dyn Resolver,
  surface: ModuleSurface,
  diagnostics: Vec<ModuleNodeDiagnostic>,
}

impl<'a> ModuleNodeBuilder<'a> {
  fn fill_declaration(&mut self, declaration: &Declaration) {
    match declaration {
      Declaration::Import {
        specifier,
        bindings,
      } => {
        // resolve even without bindings so a missing side effect import
        // still marks the module as invalid
        let Some(target) = self.resolve(specifier) else {
          return;
        };
        for binding in bindings {
          let identifier = match binding {
            ImportBinding::Default => "default",
            ImportBinding::Namespace => NAMESPACE_IDENTIFIER,
            ImportBinding::Named { imported } => imported.as_str(),
          };
          if let Some(key) = self.create_key(&target, identifier) {
            self.surface.imports.insert(key);
          }
        }
      }
      Declaration::ExportLocals { names } => {
        for name in names {
          self.add_export(name.exported_name());
        }
      }
      Declaration::ReExport { specifier, names } => {
        let Some(target) = self.resolve(specifier) else {
          return;
        };
        for name in names {
          self.add_reexport(&target, &name.orig, name.exported_name());
        }
      }
      Declaration::ReExportAll { specifier } => {
        if let Some(target) = self.resolve(specifier) {
          self.add_reexport(
            &target,
            NAMESPACE_IDENTIFIER,
            NAMESPACE_IDENTIFIER,
          );
        }
      }
      Declaration::ReExportNamespace { specifier, name } => {
        if let Some(target) = self.resolve(specifier) {
          self.add_reexport(&target, NAMESPACE_IDENTIFIER, name);
        }
      }
      Declaration::Export(decl) => {
        for binding in &decl.bindings {
          for name in binding.bound_names() {
            self.add_export(name);
          }
        }
      }
      Declaration::ExportDefault => self.add_export("default"),
      Declaration::ExportAssignment => self.add_export("export="),
      Declaration::Unsupported { description } => {
        self.add_unsupported(description.clone());
      }
    }
  }

  fn add_unsupported(&mut self, description: String) {
    log::warn!(
      "Warning: Unsupported export type in {} ({}). Incremental compilation may be significantly slower.",
      self.file_name,
      description
    );
    self
      .diagnostics
      .push(ModuleNodeDiagnostic::UnsupportedExport { description });
  }

  fn resolve(&mut self, specifier: &str) -> Option<String> {
    let resolved = self.resolver.resolve(specifier, self.file_name);
    if resolved.is_none() {
      log::debug!(
        "Unable to resolve \"{}\" from {}",
        specifier,
        self.file_name
      );
      self.diagnostics.push(ModuleNodeDiagnostic::Unresolved {
        specifier: specifier.to_string(),
      });
    }
    resolved
  }

  fn create_key(
    &mut self,
    file_name: &str,
    identifier: &str,
  ) -> Option<SymbolKey> {
    match SymbolKey::new(file_name, identifier) {
      Ok(key) => Some(key),
      Err(err) => {
        log::warn!("Warning: {}", err);
        self
          .diagnostics
          .push(ModuleNodeDiagnostic::InvalidIdentifier { source: err });
        None
      }
    }
  }

  fn add_export(&mut self, name: &str) {
    let file_name = self.file_name;
    if let Some(key) = self.create_key(file_name, name) {
      self.surface.exports.insert(key);
    }
  }

  fn add_reexport(&mut self, target: &str, imported: &str, exported: &str) {
    let file_name = self.file_name;
    let Some(from) = self.create_key(target, imported) else {
      return;
    };
    let Some(to) = self.create_key(file_name, exported) else {
      return;
    };
    match self.surface.reexports.get(&from) {
      // the same symbol published under two names can only be tracked
      // under one of them, so fall back to file level invalidation
      Some(existing) if *existing != to => {
        let description =
          format!("{} is re-exported as both {} and {}", from, existing, to);
        self.add_unsupported(description);
      }
      _ => {
        self.surface.reexports.insert(from, to);
      }
    }
  }
}
