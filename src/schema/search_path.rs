//! Search-path substitutions mapping full file paths to importer-relative
//! paths.
//!
//! Compilation units describe schema files by full path, but `import`
//! statements inside `.proto` files resolve against the compiler search
//! path. Substitutions rewrite between the two forms; a shared cache keeps
//! the mapping bidirectional so the analyzer can recover the full path (and
//! from it the file's VName) for any relative path seen during import.

use std::collections::HashMap;

/// One `virtual=real` directory mapping from a `--proto_path` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSubstitution {
    /// Prefix as seen by `import` statements; may be empty.
    pub virtual_prefix: String,
    /// Prefix of the path the compilation unit uses.
    pub real_prefix: String,
}

/// Maps relative path → full path for every substitution applied so far.
pub type SubstitutionCache = HashMap<String, String>;

/// Extract path substitutions from compilation-unit arguments.
///
/// Recognized forms: `--proto_path v=r`, `--proto_path=v=r`, `-I v=r`,
/// `-Iv=r`, and the same forms with a bare path (empty virtual prefix).
/// Everything unrecognized is returned untouched, in order.
pub fn parse_substitution_args(args: &[String]) -> (Vec<PathSubstitution>, Vec<String>) {
    let mut substitutions = Vec::new();
    let mut rest = Vec::new();
    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        let value = if arg == "--proto_path" || arg == "-I" {
            match iter.next() {
                Some(v) => v.clone(),
                None => {
                    rest.push(arg.clone());
                    continue;
                }
            }
        } else if let Some(v) = arg.strip_prefix("--proto_path=") {
            v.to_string()
        } else if let Some(v) = arg.strip_prefix("-I") {
            if v.is_empty() {
                rest.push(arg.clone());
                continue;
            }
            v.to_string()
        } else {
            rest.push(arg.clone());
            continue;
        };

        let (virtual_prefix, real_prefix) = match value.split_once('=') {
            Some((v, r)) => (v.to_string(), r.to_string()),
            None => (String::new(), value),
        };
        substitutions.push(PathSubstitution {
            virtual_prefix,
            real_prefix,
        });
    }
    (substitutions, rest)
}

/// Join two path segments with exactly one separator.
pub(crate) fn join_path(prefix: &str, rest: &str) -> String {
    if prefix.is_empty() {
        rest.to_string()
    } else {
        format!("{}/{}", prefix.trim_end_matches('/'), rest)
    }
}

/// Rewrite a full path into its search-path-relative form.
///
/// Consults the inverse of `cache` first; otherwise the first substitution
/// whose real prefix contains `full_path` wins and the mapping is cached.
/// Paths no substitution matches are returned unchanged and never cached.
pub fn full_to_relative(
    full_path: &str,
    substitutions: &[PathSubstitution],
    cache: &mut SubstitutionCache,
) -> String {
    if let Some((rel, _)) = cache.iter().find(|(_, full)| *full == full_path) {
        return rel.clone();
    }

    for sub in substitutions {
        let mut dir = sub.real_prefix.clone();
        if !dir.ends_with('/') {
            dir.push('/');
        }
        if let Some(rest) = full_path.strip_prefix(&dir) {
            let rel = join_path(&sub.virtual_prefix, rest);
            cache.insert(rel.clone(), full_path.to_string());
            return rel;
        }
    }

    full_path.to_string()
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
    fn test_parse_substitution_args_forms() {
        let args: Vec<String> = [
            "--proto_path",
            "proto=src/proto",
            "--proto_path=gen",
            "-Ithird_party",
            "-I",
            "v=r",
            "--proto_message",
            "pkg.M",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let (subs, rest) = parse_substitution_args(&args);
        assert_eq!(
            subs,
            vec![
                sub("proto", "src/proto"),
                sub("", "gen"),
                sub("", "third_party"),
                sub("v", "r"),
            ]
        );
        assert_eq!(rest, vec!["--proto_message", "pkg.M"]);
    }

    #[test]
    fn test_full_to_relative_first_match_wins() {
        let subs = vec![sub("a", "root"), sub("b", "root")];
        let mut cache = SubstitutionCache::new();
        assert_eq!(full_to_relative("root/x.proto", &subs, &mut cache), "a/x.proto");
    }

    #[test]
    fn test_full_to_relative_empty_virtual_prefix() {
        let subs = vec![sub("", "src/protos")];
        let mut cache = SubstitutionCache::new();
        assert_eq!(
            full_to_relative("src/protos/foo.proto", &subs, &mut cache),
            "foo.proto"
        );
        assert_eq!(cache.get("foo.proto").unwrap(), "src/protos/foo.proto");
    }

    #[test]
    fn test_full_to_relative_round_trip_invariant() {
        let subs = vec![sub("virt", "real/dir")];
        let mut cache = SubstitutionCache::new();
        let rel = full_to_relative("real/dir/sub/m.proto", &subs, &mut cache);
        assert_eq!(rel, "virt/sub/m.proto");
        assert_eq!(cache.get(&rel).unwrap(), "real/dir/sub/m.proto");
    }

    #[test]
    fn test_full_to_relative_no_match_uncached() {
        let subs = vec![sub("v", "elsewhere")];
        let mut cache = SubstitutionCache::new();
        assert_eq!(full_to_relative("root/x.proto", &subs, &mut cache), "root/x.proto");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_full_to_relative_prefers_cache() {
        let subs = vec![sub("v", "root")];
        let mut cache = SubstitutionCache::new();
        cache.insert("cached.proto".to_string(), "root/x.proto".to_string());
        assert_eq!(full_to_relative("root/x.proto", &subs, &mut cache), "cached.proto");
    }
}
