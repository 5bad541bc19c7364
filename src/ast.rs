// Copyright 2018-2024 the Deno authors. MIT license.

use std::sync::Arc;

use deno_ast::swc::ast::*;
use deno_ast::MediaType;
use deno_ast::ParseParams;
use deno_ast::ProgramRef;
use indexmap::IndexMap;

use crate::declarations::AnalyzeError;
use crate::declarations::BindingPattern;
use crate::declarations::DeclKind;
use crate::declarations::Declaration;
use crate::declarations::DeclarationAnalyzer;
use crate::declarations::ExportName;
use crate::declarations::ExportedDecl;
use crate::declarations::ImportBinding;
use crate::declarations::ModuleDeclarations;
use crate::fingerprint::Fingerprint;
use crate::graph::GraphFile;
use crate::resolver::file_url;

/// Extracts declarations by parsing TypeScript and JavaScript sources.
///
/// The media type of a file is derived from its extension, so `.d.ts`, `.tsx`
/// and `.js` files are parsed with the matching syntax.
#[derive(Debug, Default, Clone)]
pub struct SourceAnalyzer {
  sources: IndexMap<String, Arc<str>>,
}

impl SourceAnalyzer {
  pub fn new<S: Into<String>, T: Into<Arc<str>>>(
    sources: impl IntoIterator<Item = (S, T)>,
  ) -> Self {
    Self {
      sources: sources
        .into_iter()
        .map(|(file_name, text)| (file_name.into(), text.into()))
        .collect(),
    }
  }

  pub fn add(
    &mut self,
    file_name: impl Into<String>,
    text: impl Into<Arc<str>>,
  ) -> &mut Self {
    self.sources.insert(file_name.into(), text.into());
    self
  }

  pub fn remove(&mut self, file_name: &str) -> Option<Arc<str>> {
    self.sources.shift_remove(file_name)
  }

  pub fn get(&self, file_name: &str) -> Option<&Arc<str>> {
    self.sources.get(file_name)
  }

  /// Every file of the analyzer, fingerprinted by a checksum of its text.
  pub fn graph_files(&self) -> Vec<GraphFile> {
    self
      .sources
      .iter()
      .map(|(file_name, text)| {
        GraphFile::new(
          file_name.clone(),
          Fingerprint::from_content(text.as_bytes()),
        )
      })
      .collect()
  }
}

impl DeclarationAnalyzer for SourceAnalyzer {
  fn analyze(
    &self,
    file_name: &str,
  ) -> Result<ModuleDeclarations, AnalyzeError> {
    let text = self
      .sources
      .get(file_name)
      .ok_or_else(|| AnalyzeError::NotFound(file_name.to_string()))?;
    analyze_source(file_name, text.clone())
  }
}

/// Parses a source and extracts its top level declarations.
pub fn analyze_source(
  file_name: &str,
  text: Arc<str>,
) -> Result<ModuleDeclarations, AnalyzeError> {
  let specifier = file_url(file_name).ok_or_else(|| {
    AnalyzeError::Parse(format!("{}: not a valid path", file_name))
  })?;
  let media_type = MediaType::from_specifier(&specifier);
  let parsed_source = deno_ast::parse_program(ParseParams {
    specifier,
    text,
    media_type,
    capture_tokens: false,
    scope_analysis: false,
    maybe_syntax: None,
  })
  .map_err(|err| AnalyzeError::Parse(err.to_string()))?;

  let module = match parsed_source.program_ref() {
    ProgramRef::Module(module) => module,
    ProgramRef::Script(_) => return Ok(ModuleDeclarations::ambient()),
  };
  let is_module = module.body.iter().any(|item| match item {
    ModuleItem::ModuleDecl(module_decl) => is_module_indicator(module_decl),
    ModuleItem::Stmt(_) => false,
  });
  if !is_module {
    return Ok(ModuleDeclarations::ambient());
  }

  let mut declarations = Vec::new();
  for item in &module.body {
    if let ModuleItem::ModuleDecl(module_decl) = item {
      fill_module_decl(module_decl, &mut declarations);
    }
  }
  Ok(ModuleDeclarations {
    is_module: true,
    declarations,
  })
}


/// `import x = A.B;` only aliases a namespace and is allowed in scripts.
fn is_module_indicator(module_decl: &ModuleDecl) -> bool {
  match module_decl {
    ModuleDecl::TsImportEquals(import_equals) => {
      import_equals.is_export
        || matches!(
          import_equals.module_ref,
          TsModuleRef::TsExternalModuleRef(_)
        )
    }
    _ => true,
  }
}

fn fill_module_decl(
  module_decl: &ModuleDecl,
  declarations: &mut Vec<Declaration>,
) {
  match module_decl {
    ModuleDecl::Import(import_decl) => {
      let bindings = import_decl
        .specifiers
        .iter()
        .map(|specifier| match specifier {
          ImportSpecifier::Default(_) => ImportBinding::Default,
          ImportSpecifier::Namespace(_) => ImportBinding::Namespace,
          ImportSpecifier::Named(named) => ImportBinding::Named {
            imported: match &named.imported {
              Some(imported) => export_name_text(imported),
              None => named.local.sym.to_string(),
            },
          },
        })
        .collect();
      declarations
        .push(Declaration::import(import_decl.src.value.to_string(), bindings));
    }
    ModuleDecl::ExportDecl(export_decl) => {
      declarations.push(export_decl_declaration(&export_decl.decl));
    }
    ModuleDecl::ExportNamed(named_export) => {
      fill_named_export(named_export, declarations);
    }
    ModuleDecl::ExportDefaultDecl(_) | ModuleDecl::ExportDefaultExpr(_) => {
      declarations.push(Declaration::ExportDefault);
    }
    ModuleDecl::ExportAll(export_all) => {
      declarations
        .push(Declaration::re_export_all(export_all.src.value.to_string()));
    }
    ModuleDecl::TsImportEquals(import_equals) => {
      if let TsModuleRef::TsExternalModuleRef(module_ref) =
        &import_equals.module_ref
      {
        declarations.push(Declaration::import(
          module_ref.expr.value.to_string(),
          vec![ImportBinding::Namespace],
        ));
      }
      if import_equals.is_export {
        declarations.push(Declaration::export(
          DeclKind::ImportAlias,
          import_equals.id.sym.to_string(),
        ));
      }
    }
    ModuleDecl::TsExportAssignment(_) => {
      declarations.push(Declaration::ExportAssignment);
    }
    ModuleDecl::TsNamespaceExport(namespace_export) => {
      declarations.push(Declaration::Unsupported {
        description: format!(
          "export as namespace {}",
          namespace_export.id.sym
        ),
      });
    }
  }
}

fn fill_named_export(
  named_export: &NamedExport,
  declarations: &mut Vec<Declaration>,
) {
  let mut names = Vec::with_capacity(named_export.specifiers.len());
  for specifier in &named_export.specifiers {
    match specifier {
      ExportSpecifier::Named(named) => names.push(ExportName {
        orig: export_name_text(&named.orig),
        exported: named.exported.as_ref().map(export_name_text),
      }),
      ExportSpecifier::Namespace(namespace) => match &named_export.src {
        Some(src) => declarations.push(Declaration::ReExportNamespace {
          specifier: src.value.to_string(),
          name: export_name_text(&namespace.name),
        }),
        None => declarations.push(Declaration::Unsupported {
          description: "export * as without a module specifier".to_string(),
        }),
      },
      // https://github.com/tc39/proposal-export-default-from
      ExportSpecifier::Default(default) => {
        declarations.push(Declaration::Unsupported {
          description: format!("export {} from", default.exported.sym),
        });
      }
    }
  }
  match &named_export.src {
    Some(src) => {
      if !names.is_empty() {
        declarations.push(Declaration::re_export(src.value.to_string(), names));
      }
    }
    None => declarations.push(Declaration::ExportLocals { names }),
  }
}

fn export_decl_declaration(decl: &Decl) -> Declaration {
  match decl {
    Decl::Class(n) => {
      Declaration::export(DeclKind::Class, n.ident.sym.to_string())
    }
    Decl::Fn(n) => {
      Declaration::export(DeclKind::Function, n.ident.sym.to_string())
    }
    Decl::TsInterface(n) => {
      Declaration::export(DeclKind::Interface, n.id.sym.to_string())
    }
    Decl::TsTypeAlias(n) => {
      Declaration::export(DeclKind::TypeAlias, n.id.sym.to_string())
    }
    Decl::TsEnum(n) => {
      Declaration::export(DeclKind::Enum, n.id.sym.to_string())
    }
    Decl::TsModule(n) => match &n.id {
      TsModuleName::Ident(ident) => {
        Declaration::export(DeclKind::Namespace, ident.sym.to_string())
      }
      TsModuleName::Str(str) => Declaration::Unsupported {
        description: format!("export declare module \"{}\"", str.value),
      },
    },
    Decl::Var(var_decl) => {
      let mut bindings = Vec::with_capacity(var_decl.decls.len());
      for declarator in &var_decl.decls {
        match binding_pattern(&declarator.name) {
          Some(pattern) => bindings.push(pattern),
          None => {
            return Declaration::Unsupported {
              description: "exported variable with an invalid binding"
                .to_string(),
            };
          }
        }
      }
      Declaration::Export(ExportedDecl {
        kind: DeclKind::Variable,
        bindings,
      })
    }
    Decl::Using(_) => Declaration::Unsupported {
      description: "exported using declaration".to_string(),
    },
  }
}

fn binding_pattern(pat: &Pat) -> Option<BindingPattern> {
  match pat {
    Pat::Ident(binding) => {
      Some(BindingPattern::Ident(binding.id.sym.to_string()))
    }
    Pat::Array(array) => {
      let mut elements = Vec::with_capacity(array.elems.len());
      for elem in &array.elems {
        elements.push(match elem {
          Some(pat) => Some(binding_pattern(pat)?),
          None => None,
        });
      }
      Some(BindingPattern::Array(elements))
    }
    Pat::Object(object) => {
      let mut values = Vec::with_capacity(object.props.len());
      for prop in &object.props {
        values.push(match prop {
          ObjectPatProp::KeyValue(kv) => binding_pattern(&kv.value)?,
          ObjectPatProp::Assign(assign) => {
            BindingPattern::Ident(assign.key.sym.to_string())
          }
          ObjectPatProp::Rest(rest) => binding_pattern(&rest.arg)?,
        });
      }
      Some(BindingPattern::Object(values))
    }
    Pat::Assign(assign) => binding_pattern(&assign.left),
    Pat::Rest(rest) => binding_pattern(&rest.arg),
    Pat::Invalid(_) | Pat::Expr(_) => None,
  }
}

fn export_name_text(name: &ModuleExportName) -> String {
  match name {
    ModuleExportName::Ident(ident) => ident.sym.to_string(),
    ModuleExportName::Str(str) => str.value.to_string(),
  }
}
