// Copyright 2018-2024 the Deno authors. All rights reserved. MIT license.

#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]

#[cfg(feature = "swc")]
mod ast;
mod collect;
mod declarations;
mod diff;
mod fingerprint;
mod graph;
mod module_node;
mod resolver;
mod symbol_key;

#[cfg(feature = "swc")]
pub use ast::analyze_source;
#[cfg(feature = "swc")]
pub use ast::SourceAnalyzer;
pub use collect::collect_by_file;
pub use collect::collect_by_symbol;
pub use declarations::AnalyzeError;
pub use declarations::BindingPattern;
pub use declarations::DeclKind;
pub use declarations::Declaration;
pub use declarations::DeclarationAnalyzer;
pub use declarations::ExportName;
pub use declarations::ExportedDecl;
pub use declarations::ImportBinding;
pub use declarations::MemoryAnalyzer;
pub use declarations::ModuleDeclarations;
pub use diff::diff_symbol_graphs;
pub use diff::DiffError;
pub use fingerprint::Fingerprint;
pub use graph::BuildOptions;
pub use graph::GraphFile;
pub use graph::GraphModule;
pub use graph::SymbolGraph;
pub use module_node::build_module_node;
pub use module_node::ModuleNode;
pub use module_node::ModuleNodeDiagnostic;
pub use module_node::ModuleSurface;
pub use resolver::FileSetResolver;
pub use resolver::Resolver;
pub use resolver::DEFAULT_EXTENSIONS;
pub use symbol_key::SymbolKey;
pub use symbol_key::SymbolKeyError;
pub use symbol_key::NAMESPACE_IDENTIFIER;

/// Builds the symbol graph of a set of files.
///
/// When `options.previous` is provided, the module nodes of files whose
/// fingerprint did not change are shared with the previous graph and the
/// analyzer is not asked for their declarations.
pub fn build_graph(
  files: Vec<GraphFile>,
  analyzer: &dyn DeclarationAnalyzer,
  options: BuildOptions,
) -> SymbolGraph {
  SymbolGraph::build(files, analyzer, options)
}
