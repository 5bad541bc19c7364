// Copyright 2018-2024 the Deno authors. MIT license.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::de;
use serde::ser::SerializeMap;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::declarations::DeclarationAnalyzer;
use crate::fingerprint::Fingerprint;
use crate::module_node::build_module_node;
use crate::module_node::ModuleNode;
use crate::module_node::ModuleNodeDiagnostic;
use crate::resolver::FileSetResolver;
use crate::resolver::Resolver;

/// A file that is part of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphFile {
  pub file_name: String,
  /// Decides whether the module node of a previous build can be reused.
  pub fingerprint: Fingerprint,
}

impl GraphFile {
  pub fn new(file_name: impl Into<String>, fingerprint: Fingerprint) -> Self {
    Self {
      file_name: file_name.into(),
      fingerprint,
    }
  }
}

#[derive(Default)]
pub struct BuildOptions<'a> {
  /// Resolves module specifiers. Defaults to resolving relative and absolute
  /// specifiers against the files of the build.
  pub resolver: Option<&'a dyn Resolver>,
  /// The graph of the previous build. Nodes of files whose fingerprint did
  /// not change are reused instead of being analyzed again.
  pub previous: Option<&'a SymbolGraph>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphModule {
  pub fingerprint: Fingerprint,
  pub node: Arc<ModuleNode>,
}

/// The module nodes of a whole build and the index of who depends on whom.
///
/// A graph is logically immutable once built. Consecutive builds may share
/// the same `ModuleNode` for files that did not change.
#[derive(Debug, Clone, Default)]
pub struct SymbolGraph {
  modules: BTreeMap<String, GraphModule>,
  /// file name -> file names that import or re-export from it
  reverse_lookup: BTreeMap<String, BTreeSet<String>>,
}

impl SymbolGraph {
  /// Builds the graph for the provided files, reusing the nodes of
  /// `options.previous` where the fingerprint is unchanged.
  ///
  /// Nodes are built in parallel. The reverse lookup is always computed from
  /// scratch because a rebuilt node may add or remove an edge pointing at a
  /// reused one.
  pub fn build(
    files: Vec<GraphFile>,
    analyzer: &dyn DeclarationAnalyzer,
    options: BuildOptions,
  ) -> Self {
    // the last fingerprint provided for a file wins
    let files = files
      .into_iter()
      .map(|file| (file.file_name, file.fingerprint))
      .collect::<IndexMap<_, _>>();
    let file_names = files.keys().cloned().collect::<BTreeSet<_>>();
    let files_added = options.previous.is_some_and(|previous| {
      file_names.iter().any(|file_name| !previous.contains(file_name))
    });
    let default_resolver;
    let resolver = match options.resolver {
      Some(resolver) => resolver,
      None => {
        default_resolver = FileSetResolver::new(file_names.iter().cloned());
        &default_resolver as &dyn Resolver
      }
    };

    let modules = files
      .into_iter()
      .collect::<Vec<_>>()
      .into_par_iter()
      .map(|(file_name, fingerprint)| {
        let reused = options.previous.and_then(|previous| {
          previous
            .modules
            .get(&file_name)
            .filter(|module| {
              module.fingerprint == fingerprint
                && can_reuse(&module.node, &file_names, files_added)
            })
            .map(|module| module.node.clone())
        });
        let node = match reused {
          Some(node) => node,
          None => Arc::new(match analyzer.analyze(&file_name) {
            Ok(declarations) => {
              build_module_node(&file_name, &declarations, resolver)
            }
            Err(err) => ModuleNode::analysis_failed(&file_name, err),
          }),
        };
        (file_name, GraphModule { fingerprint, node })
      })
      .collect::<Vec<_>>();

    let graph = Self::from_modules(modules);
    if let Some(previous) = options.previous {
      let reused_count = graph
        .modules
        .iter()
        .filter(|(file_name, module)| {
          previous
            .modules
            .get(*file_name)
            .map(|prev| Arc::ptr_eq(&prev.node, &module.node))
            .unwrap_or(false)
        })
        .count();
      log::debug!(
        "Built symbol graph with {} modules ({} reused).",
        graph.modules.len(),
        reused_count
      );
    } else {
      log::debug!("Built symbol graph with {} modules.", graph.modules.len());
    }
    graph
  }

  /// Creates a graph from nodes that were already built.
  pub fn from_modules(
    modules: impl IntoIterator<Item = (String, GraphModule)>,
  ) -> Self {
    let modules = modules.into_iter().collect::<BTreeMap<_, _>>();
    let reverse_lookup = create_reverse_lookup(&modules);
    Self {
      modules,
      reverse_lookup,
    }
  }

  pub fn contains(&self, file_name: &str) -> bool {
    self.modules.contains_key(file_name)
  }

  pub fn get(&self, file_name: &str) -> Option<&ModuleNode> {
    self.modules.get(file_name).map(|module| module.node.as_ref())
  }

  /// Gets the shared node, which may also be referenced by other graphs.
  pub fn get_shared(&self, file_name: &str) -> Option<&Arc<ModuleNode>> {
    self.modules.get(file_name).map(|module| &module.node)
  }

  pub fn fingerprint(&self, file_name: &str) -> Option<&Fingerprint> {
    self.modules.get(file_name).map(|module| &module.fingerprint)
  }

  pub fn len(&self) -> usize {
    self.modules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }

  pub fn file_names(&self) -> impl Iterator<Item = &str> {
    self.modules.keys().map(|k| k.as_str())
  }

  pub fn modules(&self) -> impl Iterator<Item = &ModuleNode> {
    self.modules.values().map(|module| module.node.as_ref())
  }

  /// The files that import or re-export something from the provided file.
  pub fn importers(&self, file_name: &str) -> impl Iterator<Item = &str> {
    self
      .reverse_lookup
      .get(file_name)
      .into_iter()
      .flat_map(|importers| importers.iter().map(|i| i.as_str()))
  }

  pub fn reverse_lookup(&self) -> &BTreeMap<String, BTreeSet<String>> {
    &self.reverse_lookup
  }

  /// Every diagnostic of every module along with the file it belongs to.
  pub fn diagnostics(
    &self,
  ) -> impl Iterator<Item = (&str, &ModuleNodeDiagnostic)> {
    self.modules.iter().flat_map(|(file_name, module)| {
      module
        .node
        .diagnostics()
        .iter()
        .map(move |diagnostic| (file_name.as_str(), diagnostic))
    })
  }

  /// The files that were added, removed or whose fingerprint differs from
  /// the previous graph.
  ///
  /// A file with an unchanged fingerprint is included too when its node was
  /// rebuilt and came out different, which happens when the files it
  /// resolves against changed.
  pub fn changed_files(&self, previous: &SymbolGraph) -> BTreeSet<String> {
    let mut changed = BTreeSet::new();
    for (file_name, module) in &self.modules {
      match previous.modules.get(file_name) {
        Some(prev)
          if prev.fingerprint == module.fingerprint
            && (Arc::ptr_eq(&prev.node, &module.node)
              || prev.node == module.node) => {}
        _ => {
          changed.insert(file_name.clone());
        }
      }
    }
    for file_name in previous.modules.keys() {
      if !self.modules.contains_key(file_name) {
        changed.insert(file_name.clone());
      }
    }
    changed
  }
}

/// A node with an unchanged fingerprint is only reused while everything it
/// resolved is still part of the build. Invalid nodes are always rebuilt
/// since a new file may now resolve one of their specifiers.
///
/// Once files were added, nodes with edges are rebuilt as well: an added
/// `lib.ts` wins the resolution of `./lib` over an existing `lib/index.ts`.
fn can_reuse(
  node: &ModuleNode,
  file_names: &BTreeSet<String>,
  files_added: bool,
) -> bool {
  if !node.is_valid() {
    return false;
  }
  match node.surface() {
    Some(surface) => {
      let mut symbols = surface.imported_symbols().peekable();
      if files_added && symbols.peek().is_some() {
        return false;
      }
      symbols.all(|imported| file_names.contains(imported.file_name()))
    }
    None => true,
  }
}

/// Inverts the imports and re-exports of every module.
///
/// Ambient modules contribute no edges of their own, though they still end
/// up as importees when another module imports them by file name.
fn create_reverse_lookup(
  modules: &BTreeMap<String, GraphModule>,
) -> BTreeMap<String, BTreeSet<String>> {
  let mut reverse_lookup = BTreeMap::<String, BTreeSet<String>>::new();
  for (importer, module) in modules {
    let Some(surface) = module.node.surface() else {
      continue;
    };
    for imported in surface.imported_symbols() {
      reverse_lookup
        .entry(imported.file_name().to_string())
        .or_default()
        .insert(importer.clone());
    }
  }
  reverse_lookup
}

impl Serialize for SymbolGraph {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    let mut map = serializer.serialize_map(Some(self.modules.len()))?;
    for (file_name, module) in &self.modules {
      map.serialize_entry(file_name, module)?;
    }
    map.end()
  }
}

impl<'de> Deserialize<'de> for SymbolGraph {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let modules = BTreeMap::<String, GraphModule>::deserialize(deserializer)?;
    for (file_name, module) in &modules {
      if module.node.file_name() != file_name {
        return Err(de::Error::custom(MismatchedFileName {
          key: file_name.clone(),
          node: module.node.file_name().to_string(),
        }));
      }
    }
    Ok(Self::from_modules(modules))
  }
}

struct MismatchedFileName {
  key: String,
  node: String,
}

impl fmt::Display for MismatchedFileName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Module stored under \"{}\" is for \"{}\".",
      self.key, self.node
    )
  }
}

/// Builds a graph from declarations, one module per entry.
#[cfg(test)]
pub(crate) fn graph_from_declarations(
  modules: Vec<(&str, Vec<crate::declarations::Declaration>)>,
) -> SymbolGraph {
  use crate::declarations::MemoryAnalyzer;
  use crate::declarations::ModuleDeclarations;

  let analyzer = MemoryAnalyzer::new(
    modules
      .into_iter()
      .map(|(file_name, decls)| (file_name, ModuleDeclarations::new(decls))),
  );
  let files = analyzer
    .file_names()
    .map(|file_name| GraphFile::new(file_name, Fingerprint::from_version(1)))
    .collect();
  SymbolGraph::build(files, &analyzer, Default::default())
}
