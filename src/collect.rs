// Copyright 2018-2024 the Deno authors. MIT license.

use std::collections::BTreeSet;
use std::hash::Hash;

use indexmap::IndexSet;

use crate::graph::SymbolGraph;
use crate::module_node::ModuleSurface;
use crate::symbol_key::SymbolKey;

/// A breadth first worklist where every item is visited at most once.
///
/// The pending items are the tail of the seen items, so cycles terminate
/// once every reachable item has been seen.
struct Worklist<T: Hash + Eq> {
  seen: IndexSet<T>,
  next_index: usize,
}

impl<T: Hash + Eq + Clone> Worklist<T> {
  fn new(start: T) -> Self {
    let mut seen = IndexSet::with_capacity(16);
    seen.insert(start);
    Self {
      seen,
      next_index: 0,
    }
  }

  fn add(&mut self, item: T) {
    self.seen.insert(item);
  }

  fn next_pending(&mut self) -> Option<T> {
    let next = self.seen.get_index(self.next_index).cloned();
    if next.is_some() {
      self.next_index += 1;
    }
    next
  }

  fn into_seen(self) -> IndexSet<T> {
    self.seen
  }
}

/// Collects the file and every file that transitively imports or re-exports
/// anything from it.
///
/// This is conservative. It's used when the validity or ambient-ness of a
/// file changes, which can affect resolution for every downstream importer
/// no matter which symbol is involved.
pub fn collect_by_file(
  graph: &SymbolGraph,
  file_name: &str,
) -> BTreeSet<String> {
  let mut worklist = Worklist::new(file_name);
  while let Some(importee) = worklist.next_pending() {
    for importer in graph.importers(importee) {
      worklist.add(importer);
    }
  }
  worklist
    .into_seen()
    .into_iter()
    .map(ToString::to_string)
    .collect()
}

/// Collects the files that depend on a symbol.
///
/// The file of the symbol is always included. Re-exports are followed under
/// their new local name so the importers of the re-exporting module are
/// found too. When `include_reexports` is set, the re-exporting modules
/// themselves are included, which is needed when the symbol may have been
/// removed and a re-export could break.
///
/// Importing a module namespace (`import * as m`) counts as depending on
/// every symbol of the module.
pub fn collect_by_symbol(
  graph: &SymbolGraph,
  symbol: &SymbolKey,
  include_reexports: bool,
) -> BTreeSet<String> {
  let mut collected = BTreeSet::new();
  collected.insert(symbol.file_name().to_string());

  // a file may be visited more than once due to circular dependencies,
  // but never a symbol
  let mut traced = Worklist::new(symbol.clone());
  while let Some(importee) = traced.next_pending() {
    let file_name = importee.file_name();
    if include_reexports {
      collected.insert(file_name.to_string());
    }
    let namespace = SymbolKey::namespace(file_name);
    for importer_name in graph.importers(file_name) {
      let importer = importer_surface(graph, importer_name);
      if importee.is_namespace() {
        // the identifiers actually used are unknown, so select any symbol
        // coming from the module concerned
        if importer
          .imports
          .iter()
          .any(|imported| imported.file_name() == file_name)
        {
          collected.insert(importer_name.to_string());
        }
        for (imported, local) in &importer.reexports {
          if imported.file_name() == file_name {
            traced.add(local.clone());
          }
        }
      } else {
        if importer.imports.contains(&importee)
          || importer.imports.contains(&namespace)
        {
          collected.insert(importer_name.to_string());
        }
        if let Some(local) = importer.reexports.get(&importee) {
          traced.add(local.clone());
        }
        match importer.reexports.get(&namespace) {
          // `export * from` keeps the name, `export * as ns from` exposes
          // the symbol through `ns`
          Some(local) if local.is_namespace() => {
            traced.add(importee.with_file_name(importer_name));
          }
          Some(local) => traced.add(local.clone()),
          None => {}
        }
      }
    }
  }
  collected
}

fn importer_surface<'a>(
  graph: &'a SymbolGraph,
  importer_name: &str,
) -> &'a ModuleSurface {
  match graph.get(importer_name).and_then(|node| node.surface()) {
    Some(surface) => surface,
    None => panic!(
      "The reverse lookup lists {} as an importer, but it has no module surface in the graph.",
      importer_name
    ),
  }
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::declarations::DeclKind;
  use crate::declarations::Declaration;
  use crate::declarations::ExportName;
  use crate::declarations::ImportBinding;
  use crate::graph::graph_from_declarations;

  fn key(file_name: &str, identifier: &str) -> SymbolKey {
    SymbolKey::new(file_name, identifier).unwrap()
  }

  fn sorted(files: &[&str]) -> BTreeSet<String> {
    files.iter().map(|f| f.to_string()).collect()
  }

  fn import(specifier: &str, name: &str) -> Declaration {
    Declaration::import(specifier, vec![ImportBinding::named(name)])
  }

  fn re_export(specifier: &str, orig: &str, exported: &str) -> Declaration {
    Declaration::re_export(specifier, vec![ExportName::aliased(orig, exported)])
  }

  #[test]
  fn test_collect_by_file() {
    let graph = graph_from_declarations(vec![
      ("foo.ts", vec![Declaration::export(DeclKind::Variable, "a")]),
      ("bar.ts", vec![re_export("./foo", "a", "a")]),
      ("baz.ts", vec![Declaration::re_export_all("./foo")]),
      ("index.ts", vec![Declaration::export(DeclKind::Variable, "number")]),
    ]);
    assert_eq!(
      collect_by_file(&graph, "foo.ts"),
      sorted(&["foo.ts", "bar.ts", "baz.ts"])
    );
    assert_eq!(collect_by_file(&graph, "index.ts"), sorted(&["index.ts"]));
  }

  #[test]
  fn test_collect_by_file_circular() {
    let graph = graph_from_declarations(vec![
      (
        "foo.ts",
        vec![
          Declaration::export(DeclKind::Variable, "a"),
          Declaration::re_export_all("./bar"),
        ],
      ),
      (
        "bar.ts",
        vec![
          Declaration::export(DeclKind::Variable, "b"),
          Declaration::re_export_all("./foo"),
        ],
      ),
      ("index.ts", vec![Declaration::re_export_all("./foo")]),
    ]);
    assert_eq!(
      collect_by_file(&graph, "bar.ts"),
      sorted(&["foo.ts", "bar.ts", "index.ts"])
    );
  }

  #[test]
  fn test_collect_by_symbol_with_reexports() {
    let graph = graph_from_declarations(vec![
      (
        "foo.ts",
        vec![
          Declaration::export(DeclKind::Variable, "a"),
          Declaration::export(DeclKind::Variable, "b"),
        ],
      ),
      ("bar.ts", vec![re_export("./foo", "a", "a")]),
      ("baz.ts", vec![Declaration::re_export_all("./foo")]),
      (
        "tar.ts",
        vec![Declaration::import("./foo", vec![ImportBinding::Namespace])],
      ),
      ("car.ts", vec![import("./baz", "a")]),
      ("index.ts", vec![import("./foo", "b")]),
    ]);
    assert_eq!(
      collect_by_symbol(&graph, &key("foo.ts", "a"), true),
      sorted(&["foo.ts", "bar.ts", "baz.ts", "tar.ts", "car.ts"])
    );
  }

  #[test]
  fn test_collect_by_symbol_without_reexports() {
    let graph = graph_from_declarations(vec![
      ("foo.ts", vec![Declaration::export(DeclKind::Variable, "a")]),
      ("bar.ts", vec![re_export("./foo", "a", "a")]),
      ("baz.ts", vec![Declaration::re_export_all("./foo")]),
      (
        "tar.ts",
        vec![Declaration::import("./foo", vec![ImportBinding::Namespace])],
      ),
      ("index.ts", vec![import("./baz", "a")]),
    ]);
    assert_eq!(
      collect_by_symbol(&graph, &key("foo.ts", "a"), false),
      sorted(&["foo.ts", "tar.ts", "index.ts"])
    );
  }

  #[test]
  fn test_collect_by_symbol_circular() {
    let graph = graph_from_declarations(vec![
      ("foo.ts", vec![Declaration::export(DeclKind::Variable, "a")]),
      (
        "bar.ts",
        vec![re_export("./foo", "a", "a"), re_export("./baz", "b", "b")],
      ),
      ("baz.ts", vec![re_export("./bar", "a", "b")]),
      ("jar.ts", vec![import("./bar", "b")]),
    ]);
    assert_eq!(
      collect_by_symbol(&graph, &key("foo.ts", "a"), true),
      sorted(&["foo.ts", "bar.ts", "baz.ts", "jar.ts"])
    );
    assert_eq!(
      collect_by_symbol(&graph, &key("foo.ts", "a"), false),
      sorted(&["foo.ts", "jar.ts"])
    );
  }

  #[test]
  fn test_collect_by_namespace_symbol() {
    let graph = graph_from_declarations(vec![
      ("foo.ts", vec![Declaration::export(DeclKind::Variable, "a")]),
      ("bar.ts", vec![Declaration::re_export_all("./foo")]),
      ("index.ts", vec![import("./bar", "a")]),
      (
        "main.ts",
        vec![Declaration::import("./bar", vec![ImportBinding::Namespace])],
      ),
      ("other.ts", vec![import("./foo", "a")]),
    ]);
    assert_eq!(
      collect_by_symbol(&graph, &SymbolKey::namespace("bar.ts"), false),
      sorted(&["bar.ts", "index.ts", "main.ts"])
    );
    // the wildcard re-export is followed into bar.ts
    assert_eq!(
      collect_by_symbol(&graph, &SymbolKey::namespace("foo.ts"), true),
      sorted(&["foo.ts", "bar.ts", "index.ts", "main.ts", "other.ts"])
    );
  }

  #[test]
  fn test_collect_through_namespace_reexport() {
    let graph = graph_from_declarations(vec![
      ("foo.ts", vec![Declaration::export(DeclKind::Variable, "a")]),
      (
        "main.ts",
        vec![Declaration::ReExportNamespace {
          specifier: "./foo".to_string(),
          name: "ns".to_string(),
        }],
      ),
      ("index.ts", vec![import("./main", "ns")]),
      ("other.ts", vec![import("./main", "a")]),
    ]);
    assert_eq!(
      collect_by_symbol(&graph, &key("foo.ts", "a"), false),
      sorted(&["foo.ts", "index.ts"])
    );
    assert_eq!(
      collect_by_symbol(&graph, &key("foo.ts", "a"), true),
      sorted(&["foo.ts", "main.ts", "index.ts"])
    );
  }

  #[test]
  fn test_collect_through_explicit_and_wildcard_reexports() {
    let graph = graph_from_declarations(vec![
      ("foo.ts", vec![Declaration::export(DeclKind::Variable, "a")]),
      (
        "bar.ts",
        vec![
          re_export("./foo", "a", "b"),
          Declaration::re_export_all("./foo"),
        ],
      ),
      ("index.ts", vec![import("./bar", "b")]),
      ("main.ts", vec![import("./bar", "a")]),
    ]);
    // `a` is still exported under its own name by the wildcard
    assert_eq!(
      collect_by_symbol(&graph, &key("foo.ts", "a"), false),
      sorted(&["foo.ts", "index.ts", "main.ts"])
    );
  }
}
