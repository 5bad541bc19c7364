// Copyright 2018-2024 the Deno authors. MIT license.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// An opaque token describing the content of a file in a build.
///
/// Two builds that record the same fingerprint for a file are allowed to
/// share that file's module node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
  pub fn new(value: impl Into<String>) -> Self {
    Self(value.into())
  }

  /// A SHA-256 checksum of the content.
  pub fn from_content(content: &[u8]) -> Self {
    use sha2::Digest;
    use sha2::Sha256;
    let mut hasher = Sha256::new();
    hasher.update(content);
    Self(format!("{:x}", hasher.finalize()))
  }

  /// A version number handed out by an editor or file watcher.
  pub fn from_version(version: u64) -> Self {
    Self(format!("v{}", version))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn test_from_content() {
    assert_eq!(
      Fingerprint::from_content(b"export const a = 1;"),
      Fingerprint::from_content(b"export const a = 1;")
    );
    assert_ne!(
      Fingerprint::from_content(b"export const a = 1;"),
      Fingerprint::from_content(b"export function a() {}")
    );
    assert_eq!(
      Fingerprint::from_content(b"").as_str(),
      "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
  }

  #[test]
  fn test_from_version() {
    assert_eq!(Fingerprint::from_version(3).as_str(), "v3");
    assert_ne!(Fingerprint::from_version(3), Fingerprint::from_version(4));
  }
}
