use crate::git::types::{DiffContent, DiffOption};

#[derive(Debug, Clone)]
pub struct DiffRequest {
    pub generation: u64,
    pub option: DiffOption,
}

/// Completion of one classification, addressed to the session that asked for it.
#[derive(Debug)]
pub struct SessionUpdate {
    pub generation: u64,
    pub content: Result<DiffContent, String>,
}
