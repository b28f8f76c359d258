//! In-memory file tree the descriptor importer reads from.
//!
//! All schema content arrives as byte buffers inside the compilation unit;
//! nothing is ever read from disk.

use tracing::debug;

use super::search_path::{join_path, PathSubstitution, SubstitutionCache};
use super::SchemaError;
use std::collections::HashMap;

/// Registered schema files, keyed by the path the compilation unit used.
#[derive(Debug, Default)]
pub struct SourceTree {
    files: HashMap<String, Vec<u8>>,
}

impl SourceTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file. Registering the same path twice is a hard error.
    pub fn add_file(&mut self, path: &str, content: Vec<u8>) -> Result<(), SchemaError> {
        if self.files.contains_key(path) {
            return Err(SchemaError::DuplicateFile {
                path: path.to_string(),
            });
        }
        debug!("added file to source tree: {path}");
        self.files.insert(path.to_string(), content);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Open a file by importer-relative path.
    ///
    /// Tries the substitution cache, then the path verbatim, then each
    /// substitution in order (recording a hit in the cache). `import`
    /// statements inside schema files resolve through here.
    pub fn open(
        &self,
        rel_path: &str,
        substitutions: &[PathSubstitution],
        cache: &mut SubstitutionCache,
    ) -> Option<&[u8]> {
        if let Some(full) = cache.get(rel_path) {
            return self.files.get(full).map(Vec::as_slice);
        }
        if let Some(content) = self.files.get(rel_path) {
            return Some(content);
        }
        for sub in substitutions {
            let rest = if sub.virtual_prefix.is_empty() {
                rel_path
            } else {
                match rel_path.strip_prefix(&format!("{}/", sub.virtual_prefix)) {
                    Some(rest) => rest,
                    None => continue,
                }
            };
            let full = join_path(&sub.real_prefix, rest);
            if self.files.contains_key(&full) {
                cache.insert(rel_path.to_string(), full.clone());
                return self.files.get(&full).map(Vec::as_slice);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(virtual_prefix: &str, real_prefix: &str) -> PathSubstitution {
        PathSubstitution {
            virtual_prefix: virtual_prefix.to_string(),
            real_prefix: real_prefix.to_string(),
        }
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut tree = SourceTree::new();
        tree.add_file("a.proto", b"x".to_vec()).unwrap();
        assert!(matches!(
            tree.add_file("a.proto", b"y".to_vec()),
            Err(SchemaError::DuplicateFile { .. })
        ));
    }

    #[test]
    fn test_open_direct_path() {
        let mut tree = SourceTree::new();
        tree.add_file("dir/a.proto", b"content".to_vec()).unwrap();
        let mut cache = SubstitutionCache::new();
        assert_eq!(tree.open("dir/a.proto", &[], &mut cache), Some(&b"content"[..]));
        assert_eq!(tree.open("missing.proto", &[], &mut cache), None);
    }

    #[test]
    fn test_open_through_substitution_populates_cache() {
        let mut tree = SourceTree::new();
        tree.add_file("real/dir/a.proto", b"content".to_vec()).unwrap();
        let subs = vec![sub("virt", "real/dir")];
        let mut cache = SubstitutionCache::new();
        assert!(tree.open("virt/a.proto", &subs, &mut cache).is_some());
        assert_eq!(cache.get("virt/a.proto").unwrap(), "real/dir/a.proto");
        // Second open hits the cache path.
        assert!(tree.open("virt/a.proto", &subs, &mut cache).is_some());
    }

    #[test]
    fn test_open_empty_virtual_prefix() {
        let mut tree = SourceTree::new();
        tree.add_file("search/root/a.proto", b"content".to_vec()).unwrap();
        let subs = vec![sub("", "search/root")];
        let mut cache = SubstitutionCache::new();
        assert!(tree.open("a.proto", &subs, &mut cache).is_some());
    }
}
