// Copyright 2018-2024 the Deno authors. MIT license.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Separates the file name from the identifier in an encoded key.
const SEPARATOR: char = '%';

/// The identifier that stands for a whole module namespace
/// (`import * as m from`, `export * from`).
pub const NAMESPACE_IDENTIFIER: &str = "*";

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKeyError {
  #[error("Identifiers cannot be empty (file: {file_name}).")]
  EmptyIdentifier { file_name: String },
  #[error("Identifier \"{identifier}\" in {file_name} contains the reserved '%' character.")]
  ReservedCharacter {
    file_name: String,
    identifier: String,
  },
  #[error("Invalid symbol key: {0}")]
  Malformed(String),
}

/// A hashable value that references an identifier in a module.
///
/// The key is stored in its encoded form `<file name>%<identifier>`. The
/// file name may contain `%` because decoding splits at the last separator.
/// Identifiers starting with `__` are stored with an additional leading
/// underscore, the same way TypeScript escapes its internal names, so
/// `__new` is stored as `___new`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolKey {
  text: Arc<str>,
  separator: usize,
}

impl SymbolKey {
  /// Encodes a file name and identifier into a key.
  pub fn new(
    file_name: &str,
    identifier: &str,
  ) -> Result<Self, SymbolKeyError> {
    if identifier.is_empty() {
      return Err(SymbolKeyError::EmptyIdentifier {
        file_name: file_name.to_string(),
      });
    }
    if identifier.contains(SEPARATOR) {
      return Err(SymbolKeyError::ReservedCharacter {
        file_name: file_name.to_string(),
        identifier: identifier.to_string(),
      });
    }
    Ok(Self::from_parts(file_name, identifier))
  }

  /// The key for the namespace of a whole module.
  pub fn namespace(file_name: &str) -> Self {
    Self::from_parts(file_name, NAMESPACE_IDENTIFIER)
  }

  /// Decodes the text produced by `as_str()` or `to_string()`.
  pub fn parse(text: &str) -> Result<Self, SymbolKeyError> {
    let malformed = || SymbolKeyError::Malformed(text.to_string());
    let separator = text.rfind(SEPARATOR).ok_or_else(malformed)?;
    let stored = &text[separator + 1..];
    if stored.is_empty() {
      return Err(malformed());
    }
    // an unescaped identifier never starts with exactly two underscores
    if stored.starts_with("__") && !stored.starts_with("___") {
      return Err(malformed());
    }
    Ok(Self {
      text: text.into(),
      separator,
    })
  }

  fn from_parts(file_name: &str, identifier: &str) -> Self {
    let mut text =
      String::with_capacity(file_name.len() + identifier.len() + 2);
    text.push_str(file_name);
    text.push(SEPARATOR);
    if identifier.starts_with("__") {
      text.push('_');
    }
    text.push_str(identifier);
    Self {
      text: text.into(),
      separator: file_name.len(),
    }
  }

  pub fn file_name(&self) -> &str {
    &self.text[..self.separator]
  }

  /// The unescaped identifier.
  pub fn identifier(&self) -> &str {
    let stored = &self.text[self.separator + 1..];
    if stored.starts_with("___") {
      &stored[1..]
    } else {
      stored
    }
  }

  pub fn is_namespace(&self) -> bool {
    self.identifier() == NAMESPACE_IDENTIFIER
  }

  /// The same identifier, but in another file.
  ///
  /// Used when a wildcard re-export carries a symbol into the re-exporting
  /// module under its original name.
  pub fn with_file_name(&self, file_name: &str) -> Self {
    Self::from_parts(file_name, self.identifier())
  }

  /// Decodes the key into its file name and identifier.
  pub fn decode(&self) -> (&str, &str) {
    (self.file_name(), self.identifier())
  }

  pub fn as_str(&self) -> &str {
    &self.text
  }
}

impl fmt::Display for SymbolKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.text)
  }
}

impl fmt::Debug for SymbolKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("SymbolKey").field(&self.as_str()).finish()
  }
}

impl Serialize for SymbolKey {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(self.as_str())
  }
}

impl<'de> Deserialize<'de> for SymbolKey {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    let text = String::deserialize(deserializer)?;
    SymbolKey::parse(&text).map_err(serde::de::Error::custom)
  }
}
