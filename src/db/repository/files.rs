//! File attachment repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{FileId, GoalFile, GoalId, NewGoalFile};

/// Repository trait for goal file attachments.
///
/// The content bytes live with the row; listings return metadata only
/// so they stay cheap. Count and size limits are enforced by the
/// service layer before insertion.
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Store a file attachment and return its metadata.
    async fn insert_file(&self, new: NewGoalFile) -> RepositoryResult<GoalFile>;

    /// Fetch attachment metadata by id.
    async fn fetch_file(&self, id: FileId) -> RepositoryResult<Option<GoalFile>>;

    /// Fetch the content bytes of an attachment.
    async fn fetch_file_content(&self, id: FileId) -> RepositoryResult<Option<Vec<u8>>>;

    /// Attachments of a goal, newest first.
    async fn list_files_for_goal(&self, goal: GoalId) -> RepositoryResult<Vec<GoalFile>>;

    /// Number of attachments a goal currently has.
    async fn count_files_for_goal(&self, goal: GoalId) -> RepositoryResult<usize>;

    /// Delete an attachment.
    async fn delete_file(&self, id: FileId) -> RepositoryResult<bool>;
}
