//! File attachments on goals.
//!
//! Upload rights follow write access to the goal; reading follows read
//! access. Deletion is reserved for the uploader and the goal's owner.

use crate::api::{
    is_valid_length, FileId, Goal, GoalFile, GoalId, NewGoalFile, MAX_FILES_PER_GOAL,
    MAX_FILE_NAME_LEN, MAX_FILE_SIZE_BYTES, MAX_MIME_TYPE_LEN,
};
use crate::auth::AuthenticatedUser;
use crate::db::repository::FullRepository;

use super::{goal_read_access, goal_write_access, ServiceError, ServiceResult};

async fn existing_goal(repo: &dyn FullRepository, id: GoalId) -> ServiceResult<Goal> {
    repo.fetch_goal(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Goal not found".to_string()))
}

/// Attach a file to a goal.
pub async fn upload_file(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    goal_id: GoalId,
    file_name: &str,
    mime_type: Option<String>,
    content: Vec<u8>,
) -> ServiceResult<GoalFile> {
    let goal = existing_goal(repo, goal_id).await?;
    if !goal_write_access(repo, &goal, user.user_id).await? {
        return Err(ServiceError::Forbidden(
            "You don't have permission to upload files to this goal".to_string(),
        ));
    }

    if !is_valid_length(file_name, 1, MAX_FILE_NAME_LEN) {
        return Err(ServiceError::Validation(
            "File name must be between 1 and 255 characters".to_string(),
        ));
    }
    if let Some(ref mime) = mime_type {
        if mime.len() > MAX_MIME_TYPE_LEN {
            return Err(ServiceError::Validation(
                "MIME type must be at most 127 characters".to_string(),
            ));
        }
    }
    if repo.count_files_for_goal(goal_id).await? >= MAX_FILES_PER_GOAL {
        return Err(ServiceError::Validation(
            "Maximum of 10 files per goal exceeded".to_string(),
        ));
    }
    if content.is_empty() {
        return Err(ServiceError::Validation("File is empty".to_string()));
    }
    if content.len() > MAX_FILE_SIZE_BYTES {
        return Err(ServiceError::Validation(
            "File size exceeds 10MB limit".to_string(),
        ));
    }

    Ok(repo
        .insert_file(NewGoalFile {
            goal_id,
            file_name: file_name.to_string(),
            mime_type,
            uploaded_by: user.user_id,
            content,
        })
        .await?)
}

/// Attachment metadata for a goal, newest first.
pub async fn list_files(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    goal_id: GoalId,
) -> ServiceResult<Vec<GoalFile>> {
    let goal = existing_goal(repo, goal_id).await?;
    if !goal_read_access(repo, &goal, user.user_id).await? {
        return Err(ServiceError::Forbidden(
            "You don't have access to this goal".to_string(),
        ));
    }
    Ok(repo.list_files_for_goal(goal_id).await?)
}

/// Fetch an attachment with its content bytes.
pub async fn download_file(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    goal_id: GoalId,
    file_id: FileId,
) -> ServiceResult<(GoalFile, Vec<u8>)> {
    let goal = existing_goal(repo, goal_id).await?;
    if !goal_read_access(repo, &goal, user.user_id).await? {
        return Err(ServiceError::Forbidden(
            "You don't have access to this goal".to_string(),
        ));
    }

    let file = match repo.fetch_file(file_id).await? {
        Some(file) if file.goal_id == goal_id => file,
        _ => return Err(ServiceError::NotFound("File not found".to_string())),
    };
    let content = repo
        .fetch_file_content(file_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("File not found".to_string()))?;
    Ok((file, content))
}

/// Delete an attachment. Uploader or goal owner only.
pub async fn delete_file(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    goal_id: GoalId,
    file_id: FileId,
) -> ServiceResult<()> {
    let goal = existing_goal(repo, goal_id).await?;

    let file = match repo.fetch_file(file_id).await? {
        Some(file) if file.goal_id == goal_id => file,
        _ => return Err(ServiceError::NotFound("File not found".to_string())),
    };
    if file.uploaded_by != user.user_id && goal.owner_id != user.user_id {
        return Err(ServiceError::Forbidden(
            "You don't have permission to delete this file".to_string(),
        ));
    }

    repo.delete_file(file_id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{NewGoal, NewTeam, TeamRole, UserId};
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::{GoalRepository, TeamRepository};
    use crate::services::testing::{acting, user};

    async fn private_goal(repo: &LocalRepository, owner: UserId) -> Goal {
        repo.insert_goal(
            owner,
            NewGoal {
                title: "with files".to_string(),
                description: None,
                status: None,
                visibility: None,
                target_date: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn upload_list_download_delete() {
        let repo = LocalRepository::new();
        let alice = user(&repo, "alice@example.com").await;
        let goal = private_goal(&repo, alice.id).await;

        let stored = upload_file(
            &repo,
            &acting(&alice),
            goal.id,
            "notes.txt",
            Some("text/plain".to_string()),
            b"remember the milk".to_vec(),
        )
        .await
        .unwrap();
        assert_eq!(stored.file_size, 17);

        let listed = list_files(&repo, &acting(&alice), goal.id).await.unwrap();
        assert_eq!(listed.len(), 1);

        let (meta, bytes) = download_file(&repo, &acting(&alice), goal.id, stored.id)
            .await
            .unwrap();
        assert_eq!(meta.file_name, "notes.txt");
        assert_eq!(bytes, b"remember the milk");

        delete_file(&repo, &acting(&alice), goal.id, stored.id)
            .await
            .unwrap();
        assert!(list_files(&repo, &acting(&alice), goal.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn size_count_and_empty_limits() {
        let repo = LocalRepository::new();
        let alice = user(&repo, "alice@example.com").await;
        let goal = private_goal(&repo, alice.id).await;
        let actor = acting(&alice);

        let err = upload_file(&repo, &actor, goal.id, "empty.bin", None, Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m.contains("empty")));

        let oversized = vec![0u8; MAX_FILE_SIZE_BYTES + 1];
        let err = upload_file(&repo, &actor, goal.id, "huge.bin", None, oversized)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m.contains("10MB")));

        for i in 0..MAX_FILES_PER_GOAL {
            upload_file(
                &repo,
                &actor,
                goal.id,
                &format!("file-{i}.txt"),
                None,
                vec![1],
            )
            .await
            .unwrap();
        }
        let err = upload_file(&repo, &actor, goal.id, "one-too-many.txt", None, vec![1])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m.contains("Maximum")));
    }

    #[tokio::test]
    async fn access_follows_the_goal() {
        let repo = LocalRepository::new();
        let alice = user(&repo, "alice@example.com").await;
        let bob = user(&repo, "bob@example.com").await;
        let goal = private_goal(&repo, alice.id).await;

        // No access at all while the goal is private to Alice.
        let err = list_files(&repo, &acting(&bob), goal.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        let err = upload_file(&repo, &acting(&bob), goal.id, "a.txt", None, vec![1])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        // Team assignment grants both read and write.
        let team = repo
            .insert_team(
                alice.id,
                NewTeam {
                    name: "shared".to_string(),
                    description: None,
                    color_theme: None,
                    parent_team_id: None,
                },
                0,
            )
            .await
            .unwrap();
        repo.insert_member(team.id, bob.id, TeamRole::Member, Some(alice.id))
            .await
            .unwrap();
        repo.assign_goal_to_team(goal.id, team.id, alice.id)
            .await
            .unwrap();

        let stored = upload_file(&repo, &acting(&bob), goal.id, "b.txt", None, vec![2])
            .await
            .unwrap();

        // A fellow member cannot delete what Bob uploaded, but the goal
        // owner can.
        let carol = user(&repo, "carol@example.com").await;
        repo.insert_member(team.id, carol.id, TeamRole::Member, Some(alice.id))
            .await
            .unwrap();
        let err = delete_file(&repo, &acting(&carol), goal.id, stored.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        delete_file(&repo, &acting(&alice), goal.id, stored.id)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn file_ids_are_scoped_to_their_goal() {
        let repo = LocalRepository::new();
        let alice = user(&repo, "alice@example.com").await;
        let goal_a = private_goal(&repo, alice.id).await;
        let goal_b = private_goal(&repo, alice.id).await;

        let stored = upload_file(&repo, &acting(&alice), goal_a.id, "a.txt", None, vec![1])
            .await
            .unwrap();

        let err = download_file(&repo, &acting(&alice), goal_b.id, stored.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
