//! Extension-suffix rules and file classification.
//!
//! A [`FolderRules`] value is an ordered list of destination folders, each with
//! an ordered list of filename suffixes. Classification is a literal,
//! case-sensitive suffix comparison: the first folder (in declaration order)
//! owning a suffix the filename ends with wins.
//!
//! # Example
//!
//! ```
//! use filefix::classifier::FolderRules;
//!
//! let rules = FolderRules::new(vec![
//!     ("archives".to_string(), vec![".tar.gz".to_string()]),
//!     ("compressed".to_string(), vec![".gz".to_string()]),
//! ]);
//!
//! assert_eq!(rules.classify("backup.tar.gz"), Some("archives"));
//! assert_eq!(rules.classify("notes.gz"), Some("compressed"));
//! assert_eq!(rules.classify("notes.GZ"), None);
//! ```

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fmt;

/// A destination folder together with the suffixes routed into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRule {
    /// Folder name, relative to the download directory.
    pub folder: String,
    /// Filename suffixes, compared literally (e.g. `".jpg"`, `".tar.gz"`).
    pub suffixes: Vec<String>,
}

impl FolderRule {
    /// Returns true if `file_name` ends with any of this folder's suffixes.
    fn matches(&self, file_name: &[u8]) -> bool {
        self.suffixes
            .iter()
            .any(|suffix| file_name.ends_with(suffix.as_bytes()))
    }
}

/// Ordered mapping from folder name to extension suffixes.
///
/// Order is significant: when two folders could both claim a file, the one
/// declared first wins. The rules are immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderRules {
    rules: Vec<FolderRule>,
}

impl FolderRules {
    /// Builds rules from `(folder, suffixes)` pairs, keeping their order.
    ///
    /// Later duplicates of a folder name are ignored so that folder names stay
    /// unique. Configuration loading rejects duplicates outright before this
    /// point is reached.
    pub fn new(rules: Vec<(String, Vec<String>)>) -> Self {
        let mut seen = HashSet::new();
        let rules = rules
            .into_iter()
            .filter(|(folder, _)| seen.insert(folder.clone()))
            .map(|(folder, suffixes)| FolderRule { folder, suffixes })
            .collect();
        Self { rules }
    }

    /// Returns the destination folder for `file_name`, if any rule matches.
    ///
    /// Matching works on the raw encoded bytes of the name, so filenames that
    /// are not valid UTF-8 are still compared exactly.
    pub fn classify(&self, file_name: impl AsRef<OsStr>) -> Option<&str> {
        let name = file_name.as_ref().as_encoded_bytes();
        self.rules
            .iter()
            .find(|rule| rule.matches(name))
            .map(|rule| rule.folder.as_str())
    }

    /// Iterates over the folder names in declaration order.
    pub fn folder_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.folder.as_str())
    }

    /// Iterates over the rules in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FolderRule> {
        self.rules.iter()
    }

    /// Number of configured folders.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no folders are configured.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'de> Deserialize<'de> for FolderRules {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(FolderRulesVisitor)
    }
}

/// Reads a map in document order and refuses repeated folder names.
struct FolderRulesVisitor;

impl<'de> Visitor<'de> for FolderRulesVisitor {
    type Value = FolderRules;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of folder names to lists of extension suffixes")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(access.size_hint().unwrap_or(0));

        while let Some((folder, suffixes)) = access.next_entry::<String, Vec<String>>()? {
            if !seen.insert(folder.clone()) {
                return Err(de::Error::custom(format!(
                    "duplicate folder '{}'",
                    folder
                )));
            }
            rules.push(FolderRule { folder, suffixes });
        }

        Ok(FolderRules { rules })
    }
}
