//! Line parsers for git query output.
//!
//! Every parser is lenient: a line that does not match its format is skipped
//! and parsing carries on. Git occasionally interleaves diagnostics with
//! regular output and one stray line must not cost the whole listing.

use std::sync::OnceLock;

use regex::Regex;

use super::commands::GitCli;
use super::types::{ObjectType, RepositoryObject, Tag};
use crate::error::GitError;

/// Incrementally builds a result from streamed output lines.
pub trait LineParser {
    type Output;

    fn parse_line(&mut self, line: &str);

    fn finish(self) -> Self::Output;
}

/// Run git and feed its stdout through `parser`.
pub async fn run_query<P: LineParser>(
    git: &GitCli,
    args: &[String],
    mut parser: P,
) -> Result<P::Output, GitError> {
    git.exec_lines(args, |line| parser.parse_line(line)).await?;
    Ok(parser.finish())
}

/// Parses `ls-tree` output: `<mode> <type> <sha>\t<path>`.
#[derive(Debug, Default)]
pub struct TreeListingParser {
    objects: Vec<RepositoryObject>,
}

impl TreeListingParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LineParser for TreeListingParser {
    type Output = Vec<RepositoryObject>;

    fn parse_line(&mut self, line: &str) {
        static TREE_ENTRY: OnceLock<Regex> = OnceLock::new();
        let re = TREE_ENTRY.get_or_init(|| {
            Regex::new(r"^\d+\s+(\w+)\s+([0-9a-f]+)\s+(.*)$").expect("valid regex")
        });

        let Some(caps) = re.captures(line) else {
            log::trace!("skipping ls-tree line: {line}");
            return;
        };

        self.objects.push(RepositoryObject {
            sha: caps[2].to_string(),
            object_type: ObjectType::from_token(&caps[1]),
            path: caps[3].to_string(),
        });
    }

    fn finish(self) -> Self::Output {
        self.objects
    }
}

const TAG_REF_PREFIX: &str = "refs/tags/";

/// Parses `tag -l --format=$%(refname)$%(objectname)$%(*objectname)`.
#[derive(Debug, Default)]
pub struct TagListingParser {
    tags: Vec<Tag>,
}

impl TagListingParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LineParser for TagListingParser {
    type Output = Vec<Tag>;

    fn parse_line(&mut self, line: &str) {
        let fields: Vec<&str> = line.split('$').filter(|s| !s.is_empty()).collect();

        // Lightweight tags have no peeled object; annotated ones resolve to it.
        let (refname, sha) = match fields.as_slice() {
            [refname, direct] => (*refname, *direct),
            [refname, _, peeled] => (*refname, *peeled),
            _ => {
                log::trace!("skipping tag line: {line}");
                return;
            }
        };

        let name = refname.strip_prefix(TAG_REF_PREFIX).unwrap_or(refname);
        self.tags.push(Tag {
            name: name.to_string(),
            sha: sha.to_string(),
        });
    }

    fn finish(self) -> Self::Output {
        self.tags
    }
}

/// Parses `ls-tree -l` output for a single path and yields its size.
///
/// Trees and submodules report `-` and count as zero, as does no output.
#[derive(Debug, Default)]
pub struct FileSizeParser {
    size: u64,
}

impl FileSizeParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LineParser for FileSizeParser {
    type Output = u64;

    fn parse_line(&mut self, line: &str) {
        static SIZED_ENTRY: OnceLock<Regex> = OnceLock::new();
        let re = SIZED_ENTRY.get_or_init(|| {
            Regex::new(r"^\d+\s+\w+\s+[0-9a-f]+\s+(\d+|-)\s+.*$").expect("valid regex")
        });

        if let Some(caps) = re.captures(line) {
            self.size = caps[1].parse().unwrap_or(0);
        }
    }

    fn finish(self) -> Self::Output {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_all<P: LineParser>(mut parser: P, lines: &[&str]) -> P::Output {
        for line in lines {
            parser.parse_line(line);
        }
        parser.finish()
    }

    #[test]
    fn test_tree_listing_blob() {
        let objects = parse_all(
            TreeListingParser::new(),
            &["100644 blob 9daeafb9864cf43055ae93beb0afd6c7d144bfa9\tREADME.md"],
        );
        assert_eq!(
            objects,
            vec![RepositoryObject {
                sha: "9daeafb9864cf43055ae93beb0afd6c7d144bfa9".into(),
                object_type: ObjectType::Blob,
                path: "README.md".into(),
            }]
        );
    }

    #[test]
    fn test_tree_listing_keeps_order_and_types() {
        let objects = parse_all(
            TreeListingParser::new(),
            &[
                "040000 tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\tsrc",
                "160000 commit 1111111111111111111111111111111111111111\tvendor/lib",
                "100644 blob 2222222222222222222222222222222222222222\tmy file.txt",
            ],
        );
        let summary: Vec<_> = objects
            .iter()
            .map(|o| (o.object_type, o.path.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (ObjectType::Tree, "src"),
                (ObjectType::Commit, "vendor/lib"),
                (ObjectType::Blob, "my file.txt"),
            ]
        );
    }

    #[test]
    fn test_tree_listing_unknown_type_defaults_to_blob() {
        let objects = parse_all(
            TreeListingParser::new(),
            &["100644 weird abcdef0123\tthing"],
        );
        assert_eq!(objects[0].object_type, ObjectType::Blob);
    }

    #[test]
    fn test_tree_listing_skips_malformed_lines() {
        let objects = parse_all(
            TreeListingParser::new(),
            &[
                "",
                "warning: something odd",
                "blob 9daeafb9 README.md",
                "100644 blob NOTHEX\tREADME.md",
                "100644 blob",
            ],
        );
        assert!(objects.is_empty());
    }

    #[test]
    fn test_tag_lightweight_uses_direct_sha() {
        let tags = parse_all(TagListingParser::new(), &["$refs/tags/v1.0.0$abc123$"]);
        assert_eq!(
            tags,
            vec![Tag {
                name: "v1.0.0".into(),
                sha: "abc123".into(),
            }]
        );
    }

    #[test]
    fn test_tag_annotated_uses_peeled_sha() {
        let tags = parse_all(
            TagListingParser::new(),
            &["$refs/tags/v1.0.0$abc123$def456"],
        );
        assert_eq!(tags[0].name, "v1.0.0");
        assert_eq!(tags[0].sha, "def456");
    }

    #[test]
    fn test_tag_drops_malformed_lines_and_keeps_order() {
        let tags = parse_all(
            TagListingParser::new(),
            &[
                "$refs/tags/v2$aaa$bbb",
                "garbage",
                "$refs/tags/x$1$2$3",
                "",
                "$refs/tags/v1$ccc$",
            ],
        );
        let names: Vec<_> = tags
            .iter()
            .map(|t| (t.name.as_str(), t.sha.as_str()))
            .collect();
        assert_eq!(names, vec![("v2", "bbb"), ("v1", "ccc")]);
    }

    #[test]
    fn test_file_size() {
        let size = parse_all(
            FileSizeParser::new(),
            &["100644 blob 9daeafb9864cf43055ae93beb0afd6c7d144bfa9    1234\tlogo.png"],
        );
        assert_eq!(size, 1234);
    }

    #[test]
    fn test_file_size_tree_and_empty_are_zero() {
        let size = parse_all(
            FileSizeParser::new(),
            &["040000 tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904       -\tsrc"],
        );
        assert_eq!(size, 0);
        assert_eq!(parse_all(FileSizeParser::new(), &[]), 0);
    }
}
