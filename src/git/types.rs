use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Blob,
    Tree,
    Tag,
    Commit,
}

impl ObjectType {
    /// Map a git object type token. Unknown tokens fall back to `Blob`.
    pub fn from_token(token: &str) -> Self {
        match token {
            "tree" => ObjectType::Tree,
            "tag" => ObjectType::Tag,
            "commit" => ObjectType::Commit,
            _ => ObjectType::Blob,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Tag => "tag",
            ObjectType::Commit => "commit",
        }
    }
}

/// One entry of a tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryObject {
    pub sha: String,
    #[serde(rename = "type")]
    pub object_type: ObjectType,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub name: String,
    /// The commit the tag points at (peeled for annotated tags).
    pub sha: String,
}

/// What a diff compares against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffTarget {
    /// Working tree against the index, or the index against HEAD when `staged`.
    WorkingCopy { staged: bool },
    /// One revision against the working tree.
    Revision(String),
    /// Two explicit revisions.
    Revisions { old: String, new: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOption {
    pub path: String,
    /// Rename origin, when the file was moved.
    pub orig_path: Option<String>,
    pub target: DiffTarget,
}

impl DiffOption {
    pub fn working_copy(path: impl Into<String>, staged: bool) -> Self {
        Self {
            path: path.into(),
            orig_path: None,
            target: DiffTarget::WorkingCopy { staged },
        }
    }

    pub fn between(
        path: impl Into<String>,
        old: impl Into<String>,
        new: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            orig_path: None,
            target: DiffTarget::Revisions {
                old: old.into(),
                new: new.into(),
            },
        }
    }

    pub fn with_orig_path(mut self, orig_path: impl Into<String>) -> Self {
        self.orig_path = Some(orig_path.into());
        self
    }

    /// The rename origin, if it names a real file other than `path`.
    ///
    /// Added and untracked files carry `/dev/null` as their origin.
    pub fn rename_origin(&self) -> Option<&str> {
        self.orig_path
            .as_deref()
            .filter(|p| !p.trim().is_empty() && *p != "/dev/null" && *p != self.path)
    }

    /// The rename origin if there is one, else the current path.
    pub fn old_path(&self) -> &str {
        self.rename_origin().unwrap_or(&self.path)
    }

    pub fn is_unstaged(&self) -> bool {
        matches!(self.target, DiffTarget::WorkingCopy { staged: false })
    }

    /// Revision selector arguments followed by the `--` pathspec.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        match &self.target {
            DiffTarget::WorkingCopy { staged: false } => {}
            DiffTarget::WorkingCopy { staged: true } => args.push("--cached".to_string()),
            DiffTarget::Revision(rev) => args.push(rev.clone()),
            DiffTarget::Revisions { old, new } => {
                args.push(old.clone());
                args.push(new.clone());
            }
        }
        args.push("--".to_string());
        if let Some(orig) = self.rename_origin() {
            args.push(orig.to_string());
        }
        args.push(self.path.clone());
        args
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffLineOrigin {
    Context,
    Addition,
    Deletion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub origin: DiffLineOrigin,
    pub old_lineno: Option<u32>,
    pub new_lineno: Option<u32>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hunk {
    pub header: String,
    pub old_start: u32,
    pub new_start: u32,
    pub lines: Vec<DiffLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextDiff {
    /// Display path, always the new side of a rename.
    pub file: String,
    pub hunks: Vec<Hunk>,
}

impl TextDiff {
    pub fn additions(&self) -> usize {
        self.count(DiffLineOrigin::Addition)
    }

    pub fn deletions(&self) -> usize {
        self.count(DiffLineOrigin::Deletion)
    }

    fn count(&self, origin: DiffLineOrigin) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| l.origin == origin)
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LfsObject {
    pub oid: String,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LfsDiff {
    pub old: LfsObject,
    pub new: LfsObject,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BinaryDiff {
    pub old_size: u64,
    pub new_size: u64,
}

/// The classified outcome of one diff request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiffContent {
    Binary(BinaryDiff),
    Lfs(LfsDiff),
    Text(TextDiff),
    /// Identical content, or only line endings differ.
    NoChange,
}

impl DiffContent {
    pub fn is_text(&self) -> bool {
        matches!(self, DiffContent::Text(_))
    }

    pub fn is_no_change(&self) -> bool {
        matches!(self, DiffContent::NoChange)
    }
}
