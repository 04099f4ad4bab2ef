use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Fixed envelope returned by the delete-project route regardless of what
/// the upstream body contained.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct DeleteOutcome {
    pub success: bool,
    pub message: String,
}

impl DeleteOutcome {
    pub fn file_deleted() -> Self {
        Self { success: true, message: "delete file".to_string() }
    }
}
