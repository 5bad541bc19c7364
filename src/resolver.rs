// Copyright 2018-2024 the Deno authors. MIT license.

use std::collections::BTreeMap;

use url::Url;

/// The extensions tried by `FileSetResolver` when a specifier omits one.
pub const DEFAULT_EXTENSIONS: &[&str] =
  &[".ts", ".tsx", ".d.ts", ".js", ".jsx", ".mjs", ".cjs"];

/// Resolves the module specifier of an import or export to the file name it
/// refers to. This is where tsconfig paths, import maps or node resolution
/// plug into the graph.
///
/// Implementations must be pure: the graph may call `resolve` for many files
/// at the same time and expects the same answer for the same input.
pub trait Resolver: Sync {
  /// Given a specifier and the file it was written in, returns the resolved
  /// file name or `None` when it cannot be resolved.
  fn resolve(&self, specifier: &str, containing_file: &str) -> Option<String>;
}

impl<F> Resolver for F
where
  F: Fn(&str, &str) -> Option<String> + Sync,
{
  fn resolve(&self, specifier: &str, containing_file: &str) -> Option<String> {
    self(specifier, containing_file)
  }
}

/// Resolves relative and absolute specifiers against a known set of files.
///
/// Specifiers are joined to the containing file the way URLs are, with file
/// names taken as paths below `file:///`. Bare specifiers (ex. `"react"`)
/// are never resolved.
#[derive(Debug, Clone, Default)]
pub struct FileSetResolver {
  /// file url -> file name
  files: BTreeMap<String, String>,
  extensions: Vec<String>,
}

impl FileSetResolver {
  pub fn new<S: Into<String>>(files: impl IntoIterator<Item = S>) -> Self {
    let mut by_url = BTreeMap::<String, String>::new();
    for file_name in files {
      let file_name = file_name.into();
      match file_url(&file_name) {
        Some(url) => {
          by_url.entry(url.into()).or_insert(file_name);
        }
        None => {
          log::debug!("Cannot resolve to {}, it is not a path.", file_name);
        }
      }
    }
    Self {
      files: by_url,
      extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
    }
  }

  /// Replaces the extensions tried for extensionless specifiers. Order
  /// matters: the first extension that matches an existing file wins.
  pub fn with_extensions<S: Into<String>>(
    mut self,
    extensions: impl IntoIterator<Item = S>,
  ) -> Self {
    self.extensions = extensions.into_iter().map(Into::into).collect();
    self
  }

  pub fn contains(&self, file_name: &str) -> bool {
    file_url(file_name)
      .map(|url| self.files.contains_key(url.as_str()))
      .unwrap_or(false)
  }

  fn candidates(&self, url: &Url) -> Vec<String> {
    let url = url.as_str();
    let mut candidates = Vec::with_capacity(self.extensions.len() * 2 + 1);
    if self.extensions.iter().any(|ext| url.ends_with(ext.as_str())) {
      candidates.push(url.to_string());
    }
    for ext in &self.extensions {
      candidates.push(format!("{}{}", url, ext));
    }
    let index_prefix = if url.ends_with('/') {
      url.to_string()
    } else {
      format!("{}/", url)
    };
    for ext in &self.extensions {
      candidates.push(format!("{}index{}", index_prefix, ext));
    }
    candidates
  }
}

impl Resolver for FileSetResolver {
  fn resolve(&self, specifier: &str, containing_file: &str) -> Option<String> {
    let is_path = specifier.starts_with('/')
      || specifier.starts_with("./")
      || specifier.starts_with("../")
      || specifier == "."
      || specifier == "..";
    if !is_path {
      return None;
    }
    let url = file_url(containing_file)?.join(specifier).ok()?;
    self
      .candidates(&url)
      .into_iter()
      .find_map(|candidate| self.files.get(&candidate).cloned())
  }
}

/// The `file:///` URL of a file name. Relative file names are rooted at `/`.
pub(crate) fn file_url(file_name: &str) -> Option<Url> {
  Url::parse("file:///").ok()?.join(file_name).ok()
}

#[cfg(test)]
mod test {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn test_file_set_resolver() {
    let resolver = FileSetResolver::new([
      "foo.ts",
      "node.d.ts",
      "lib/index.ts",
      "lib/util.js",
      "/abs/mod.tsx",
      "dir name/foo.ts",
    ]);
    let cases = [
      ("./foo", "index.ts", Some("foo.ts")),
      ("./foo.ts", "index.ts", Some("foo.ts")),
      ("./node", "index.ts", Some("node.d.ts")),
      ("./lib", "index.ts", Some("lib/index.ts")),
      ("./util", "lib/index.ts", Some("lib/util.js")),
      ("../foo", "lib/index.ts", Some("foo.ts")),
      ("/abs/mod", "index.ts", Some("/abs/mod.tsx")),
      ("./mod", "/abs/other.ts", Some("/abs/mod.tsx")),
      ("./a/../util", "lib/index.ts", Some("lib/util.js")),
      (".", "lib/util.js", Some("lib/index.ts")),
      ("./foo", "dir name/bar.ts", Some("dir name/foo.ts")),
      ("./dir name/foo", "index.ts", Some("dir name/foo.ts")),
      ("./non-existent", "index.ts", None),
      ("foo", "index.ts", None),
    ];
    for (specifier, containing_file, expected) in cases {
      assert_eq!(
        resolver.resolve(specifier, containing_file).as_deref(),
        expected,
        "{} from {}",
        specifier,
        containing_file
      );
    }
  }

  #[test]
  fn test_contains() {
    let resolver = FileSetResolver::new(["foo.ts", "dir name/bar.ts"]);
    assert!(resolver.contains("foo.ts"));
    assert!(resolver.contains("./foo.ts"));
    assert!(resolver.contains("dir name/bar.ts"));
    assert!(!resolver.contains("bar.ts"));
  }

  #[test]
  fn test_custom_extensions() {
    let resolver =
      FileSetResolver::new(["foo.ts", "foo.js"]).with_extensions([".js"]);
    assert_eq!(resolver.resolve("./foo", "a.ts").as_deref(), Some("foo.js"));
  }

  #[test]
  fn test_closure_resolver() {
    let resolver = |specifier: &str, _: &str| {
      (specifier == "x").then(|| "x.ts".to_string())
    };
    assert_eq!(
      Resolver::resolve(&resolver, "x", "a.ts").as_deref(),
      Some("x.ts")
    );
    assert_eq!(Resolver::resolve(&resolver, "y", "a.ts"), None);
  }
}
