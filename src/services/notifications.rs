//! Notification listing and read-marking, plus the fan-out writer the
//! other services use.

use crate::api::{NewNotification, Notification, NotificationId};
use crate::auth::AuthenticatedUser;
use crate::db::repository::FullRepository;

use super::{ServiceError, ServiceResult};

/// Insert a notification, swallowing failures.
///
/// Fan-out is best effort: a failed insert must never fail the operation
/// that triggered it. There is no retry and no delivery guarantee.
pub(crate) async fn notify_quietly(repo: &dyn FullRepository, new: NewNotification) {
    if let Err(e) = repo.insert_notification(new).await {
        log::warn!("notification insert failed: {}", e);
    }
}

/// List the caller's notifications, newest first.
pub async fn list_notifications(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    unread_only: bool,
) -> ServiceResult<Vec<Notification>> {
    Ok(repo.list_notifications(user.user_id, unread_only).await?)
}

/// Mark one of the caller's notifications as read.
///
/// Rows belonging to other users are reported as missing.
pub async fn mark_read(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    id: NotificationId,
) -> ServiceResult<Notification> {
    repo.mark_notification_read(id, user.user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Notification not found".to_string()))
}

/// Mark all of the caller's notifications as read. Returns how many changed.
pub async fn mark_all_read(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
) -> ServiceResult<usize> {
    Ok(repo.mark_all_notifications_read(user.user_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::NotificationKind;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::NotificationRepository;
    use crate::services::testing::{acting, user};

    async fn seed(repo: &LocalRepository, target: crate::api::UserId, n: usize) {
        for i in 0..n {
            repo.insert_notification(NewNotification {
                user_id: target,
                kind: NotificationKind::TeamMemberAdded,
                title: format!("note {i}"),
                message: "hello".to_string(),
                related_id: None,
            })
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn read_marking_is_scoped_to_the_owner() {
        let repo = LocalRepository::new();
        let alice = user(&repo, "alice@example.com").await;
        let bob = user(&repo, "bob@example.com").await;
        seed(&repo, alice.id, 1).await;

        let note = list_notifications(&repo, &acting(&alice), false)
            .await
            .unwrap()
            .remove(0);

        // Bob cannot mark Alice's notification.
        let err = mark_read(&repo, &acting(&bob), note.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let marked = mark_read(&repo, &acting(&alice), note.id).await.unwrap();
        assert!(marked.read);
    }

    #[tokio::test]
    async fn unread_filter_and_mark_all() {
        let repo = LocalRepository::new();
        let alice = user(&repo, "alice@example.com").await;
        seed(&repo, alice.id, 3).await;

        let all = list_notifications(&repo, &acting(&alice), false)
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        mark_read(&repo, &acting(&alice), all[0].id).await.unwrap();
        let unread = list_notifications(&repo, &acting(&alice), true)
            .await
            .unwrap();
        assert_eq!(unread.len(), 2);

        let changed = mark_all_read(&repo, &acting(&alice)).await.unwrap();
        assert_eq!(changed, 2);
        assert!(list_notifications(&repo, &acting(&alice), true)
            .await
            .unwrap()
            .is_empty());
    }
}
