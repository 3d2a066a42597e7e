//! Class label table.
//!
//! A label file holds one class name per line; the line order defines the class
//! index used by the score tensor. The table is immutable once loaded.

use crate::util::{DetPostError, DetPostResult};
use std::io::BufRead;
use std::path::Path;

/// Ordered, read-only list of class names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelTable {
    names: Vec<String>,
}

impl LabelTable {
    /// Creates a table from class names in index order.
    pub fn new<I, S>(names: I) -> DetPostResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(DetPostError::EmptyLabels);
        }
        if let Some(idx) = names.iter().position(|name| name.trim().is_empty()) {
            return Err(DetPostError::MalformedLabel { line: idx + 1 });
        }
        Ok(Self { names })
    }

    /// Parses a label file body. `\r\n` line endings are accepted.
    pub fn parse(text: &str) -> DetPostResult<Self> {
        Self::new(text.lines().map(|line| line.trim_end_matches('\r')))
    }

    /// Reads labels line by line from a buffered reader.
    pub fn from_reader<R: BufRead>(reader: R) -> DetPostResult<Self> {
        let mut names = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|err| DetPostError::LabelIo {
                reason: err.to_string(),
            })?;
            names.push(line.trim_end_matches('\r').to_owned());
        }
        Self::new(names)
    }

    /// Loads a label file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> DetPostResult<Self> {
        let file = std::fs::File::open(path.as_ref()).map_err(|err| DetPostError::LabelIo {
            reason: format!("{}: {err}", path.as_ref().display()),
        })?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false for a constructed table; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the name for `class_index`.
    pub fn get(&self, class_index: usize) -> Option<&str> {
        self.names.get(class_index).map(String::as_str)
    }

    /// Returns the index of the first class called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Iterates names in class-index order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
