// Copyright 2018-2024 the Deno authors. MIT license.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::collect::collect_by_file;
use crate::collect::collect_by_symbol;
use crate::graph::SymbolGraph;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiffError {
  #[error("File not found: {0}")]
  FileNotFound(String),
}

/// Computes the files that must be type checked again after going from
/// `old_graph` to `new_graph`.
///
/// `changed_files` are the files whose content changed, including files that
/// were added or removed. The result always contains the changed files that
/// are still part of the new graph, and never a file that is not.
///
/// Files that are invalid in either graph are always returned together with
/// everything downstream of them, since an invalid file may have started
/// resolving a specifier that did not resolve before.
pub fn diff_symbol_graphs<S: AsRef<str>>(
  old_graph: &SymbolGraph,
  new_graph: &SymbolGraph,
  changed_files: impl IntoIterator<Item = S>,
) -> Result<BTreeSet<String>, DiffError> {
  let mut affected = BTreeSet::new();
  for file_name in changed_files {
    let file_name = file_name.as_ref();
    affected.insert(file_name.to_string());
    let old_node = old_graph.get(file_name);
    let new_node = new_graph.get(file_name);
    match (old_node, new_node) {
      (None, None) => {
        return Err(DiffError::FileNotFound(file_name.to_string()));
      }
      // a removed file turns its importers invalid
      (Some(_), None) => {
        affected.extend(collect_by_file(old_graph, file_name));
      }
      // an added file can only turn invalid importers valid, and those are
      // rechecked below
      (None, Some(_)) => {}
      (Some(old_node), Some(new_node)) => {
        match (old_node.surface(), new_node.surface()) {
          (Some(old_surface), Some(new_surface)) => {
            let new_symbols = new_surface.public_symbols();
            for symbol in old_surface.public_symbols() {
              // a removed symbol may break the modules re-exporting it,
              // while a changed one only affects the modules using it
              let include_reexports = !new_symbols.contains(symbol);
              affected.extend(collect_by_symbol(
                old_graph,
                symbol,
                include_reexports,
              ));
            }
            // added symbols can only fix invalid files, which are rechecked
            // below
          }
          // ambient declarations are visible everywhere
          _ => {
            log::debug!(
              "{} is or was ambient, every file is affected.",
              file_name
            );
            affected.extend(new_graph.file_names().map(ToString::to_string));
          }
        }
      }
    }
  }

  // only the fact that a module has unresolved specifiers is tracked, not
  // which ones, so any of them may have started resolving
  for new_node in new_graph.modules() {
    let file_name = new_node.file_name();
    let was_invalid = old_graph
      .get(file_name)
      .map(|old_node| !old_node.is_valid())
      .unwrap_or(false);
    if was_invalid || !new_node.is_valid() {
      affected.extend(collect_by_file(old_graph, file_name));
    }
  }

  affected.retain(|file_name| new_graph.contains(file_name));
  log::debug!(
    "{} of {} files are affected by the changes.",
    affected.len(),
    new_graph.len()
  );
  Ok(affected)
}
