// Copyright 2018-2024 the Deno authors. All rights reserved. MIT license.

use std::collections::BTreeSet;

mod test_builder;

use symbol_graph::SymbolKey;
pub use test_builder::*;

pub fn file_set(files: &[&str]) -> BTreeSet<String> {
  files.iter().map(|f| f.to_string()).collect()
}

pub fn keys<'a>(
  keys: impl IntoIterator<Item = &'a SymbolKey>,
) -> Vec<&'a str> {
  keys.into_iter().map(|k| k.as_str()).collect()
}
