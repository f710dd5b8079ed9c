//! Behavior tests for the in-memory repository: constraints, cascades and
//! ordering guarantees the service layer depends on.

use chrono::{Duration, Utc};

use goal_tracker::api::{
    CategoryId, GoalId, GoalPatch, NewCategory, NewGoal, NewGoalFile, NewInvitation,
    NewNotification, NewSession, NewStatus, NewTeam, NewUser, NotificationKind, TeamId, TeamRole,
    User,
};
use goal_tracker::db::repositories::local::constraints;
use goal_tracker::db::repositories::LocalRepository;
use goal_tracker::db::repository::{
    FileRepository, GoalRepository, NotificationRepository, RepositoryError, StatusRepository,
    TeamRepository, UserRepository,
};

async fn user(repo: &LocalRepository, email: &str) -> User {
    repo.insert_user(NewUser {
        email: email.to_string(),
        display_name: email.split('@').next().unwrap().to_string(),
        role: None,
    })
    .await
    .unwrap()
}

fn goal_named(title: &str) -> NewGoal {
    NewGoal {
        title: title.to_string(),
        description: None,
        status: None,
        visibility: None,
        target_date: None,
    }
}

fn assert_violates(err: RepositoryError, constraint: &str) {
    match err {
        RepositoryError::ValidationError { ref context, .. } => {
            let details = context.details.as_deref().unwrap_or_default();
            assert!(
                details.contains(&format!("constraint={}", constraint)),
                "expected constraint {} in {:?}",
                constraint,
                details
            );
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_email_uniqueness_is_case_insensitive() {
    let repo = LocalRepository::new();
    user(&repo, "Ada@Example.com").await;

    let err = repo
        .insert_user(NewUser {
            email: "ada@example.com".to_string(),
            display_name: "Other Ada".to_string(),
            role: None,
        })
        .await
        .unwrap_err();
    assert_violates(err, constraints::USERS_EMAIL);

    // Lookup is case-insensitive too.
    let found = repo.find_user_by_email("ADA@EXAMPLE.COM").await.unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn test_goal_update_is_partial_and_bumps_updated_at() {
    let repo = LocalRepository::new();
    let ada = user(&repo, "ada@example.com").await;
    let goal = repo
        .insert_goal(
            ada.id,
            NewGoal {
                title: "Original".to_string(),
                description: Some("keep me".to_string()),
                status: None,
                visibility: None,
                target_date: None,
            },
        )
        .await
        .unwrap();

    let updated = repo
        .update_goal(
            goal.id,
            GoalPatch {
                title: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.description.as_deref(), Some("keep me"));
    assert_eq!(updated.status, goal.status);
    assert!(updated.updated_at >= goal.updated_at);
}

#[tokio::test]
async fn test_update_missing_goal_is_not_found() {
    let repo = LocalRepository::new();
    let err = repo
        .update_goal(GoalId::new(404), GoalPatch::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_goal_delete_cascades_to_attachments_and_junctions() {
    let repo = LocalRepository::new();
    let ada = user(&repo, "ada@example.com").await;

    let goal = repo.insert_goal(ada.id, goal_named("Doomed")).await.unwrap();
    let category = repo
        .insert_category(
            ada.id,
            NewCategory {
                name: "Chores".to_string(),
                color: None,
                icon: None,
            },
        )
        .await
        .unwrap();
    let team = repo
        .insert_team(
            ada.id,
            NewTeam {
                name: "Crew".to_string(),
                description: None,
                color_theme: None,
                parent_team_id: None,
            },
            0,
        )
        .await
        .unwrap();

    repo.attach_category(goal.id, category.id).await.unwrap();
    repo.assign_goal_to_team(goal.id, team.id, ada.id).await.unwrap();
    repo.insert_file(NewGoalFile {
        goal_id: goal.id,
        file_name: "plan.txt".to_string(),
        mime_type: None,
        uploaded_by: ada.id,
        content: b"step one".to_vec(),
    })
    .await
    .unwrap();

    assert!(repo.delete_goal(goal.id).await.unwrap());

    assert_eq!(repo.count_files_for_goal(goal.id).await.unwrap(), 0);
    assert!(repo.list_goal_categories(goal.id).await.unwrap().is_empty());
    assert!(repo.list_goals_for_team(team.id).await.unwrap().is_empty());
    // The category itself survives.
    assert!(repo.fetch_category(category.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_team_delete_cascades_but_goals_survive() {
    let repo = LocalRepository::new();
    let ada = user(&repo, "ada@example.com").await;
    let bob = user(&repo, "bob@example.com").await;

    let team = repo
        .insert_team(
            ada.id,
            NewTeam {
                name: "Doomed".to_string(),
                description: None,
                color_theme: None,
                parent_team_id: None,
            },
            0,
        )
        .await
        .unwrap();
    let child = repo
        .insert_team(
            ada.id,
            NewTeam {
                name: "Child".to_string(),
                description: None,
                color_theme: None,
                parent_team_id: Some(team.id),
            },
            1,
        )
        .await
        .unwrap();

    repo.insert_member(team.id, ada.id, TeamRole::Owner, None)
        .await
        .unwrap();
    repo.insert_member(team.id, bob.id, TeamRole::Member, Some(ada.id))
        .await
        .unwrap();
    repo.insert_invitation(NewInvitation {
        team_id: team.id,
        email: "carol@example.com".to_string(),
        invite_code: "CODE12345678".to_string(),
        invited_by: ada.id,
        expires_at: Utc::now() + Duration::days(7),
    })
    .await
    .unwrap();
    repo.insert_team_status(
        team.id,
        ada.id,
        NewStatus {
            name: "blocked".to_string(),
            color: None,
            icon: None,
            display_order: None,
        },
    )
    .await
    .unwrap();
    let goal = repo.insert_goal(ada.id, goal_named("Shared")).await.unwrap();
    repo.assign_goal_to_team(goal.id, team.id, ada.id).await.unwrap();

    assert!(repo.delete_team(team.id).await.unwrap());

    assert!(repo.list_members(team.id).await.unwrap().is_empty());
    assert!(repo
        .list_invitations_for_team(team.id)
        .await
        .unwrap()
        .is_empty());
    assert!(repo.list_team_statuses(team.id).await.unwrap().is_empty());
    assert!(repo.list_goal_team_ids(goal.id).await.unwrap().is_empty());
    // The goal and the child team live on; the child is re-rooted.
    assert!(repo.fetch_goal(goal.id).await.unwrap().is_some());
    let orphan = repo.fetch_team(child.id).await.unwrap().unwrap();
    assert_eq!(orphan.parent_team_id, None);
}

#[tokio::test]
async fn test_membership_is_unique_per_team() {
    let repo = LocalRepository::new();
    let ada = user(&repo, "ada@example.com").await;
    let team = repo
        .insert_team(
            ada.id,
            NewTeam {
                name: "Once".to_string(),
                description: None,
                color_theme: None,
                parent_team_id: None,
            },
            0,
        )
        .await
        .unwrap();

    repo.insert_member(team.id, ada.id, TeamRole::Owner, None)
        .await
        .unwrap();
    let err = repo
        .insert_member(team.id, ada.id, TeamRole::Member, None)
        .await
        .unwrap_err();
    assert_violates(err, constraints::TEAM_MEMBERSHIP);
}

#[tokio::test]
async fn test_goal_team_assignment_reports_novelty() {
    let repo = LocalRepository::new();
    let ada = user(&repo, "ada@example.com").await;
    let team = repo
        .insert_team(
            ada.id,
            NewTeam {
                name: "Crew".to_string(),
                description: None,
                color_theme: None,
                parent_team_id: None,
            },
            0,
        )
        .await
        .unwrap();
    let goal = repo.insert_goal(ada.id, goal_named("Shared")).await.unwrap();

    assert!(repo.assign_goal_to_team(goal.id, team.id, ada.id).await.unwrap());
    assert!(!repo.assign_goal_to_team(goal.id, team.id, ada.id).await.unwrap());
    assert!(repo.unassign_goal_from_team(goal.id, team.id).await.unwrap());
    assert!(!repo.unassign_goal_from_team(goal.id, team.id).await.unwrap());
}

#[tokio::test]
async fn test_goals_list_newest_first_categories_alphabetical() {
    let repo = LocalRepository::new();
    let ada = user(&repo, "ada@example.com").await;

    repo.insert_goal(ada.id, goal_named("first")).await.unwrap();
    repo.insert_goal(ada.id, goal_named("second")).await.unwrap();
    repo.insert_goal(ada.id, goal_named("third")).await.unwrap();

    let goals = repo.list_goals_for_owner(ada.id).await.unwrap();
    let titles: Vec<&str> = goals.iter().map(|g| g.title.as_str()).collect();
    assert_eq!(titles, vec!["third", "second", "first"]);

    for name in ["zeta", "alpha", "midway"] {
        repo.insert_category(
            ada.id,
            NewCategory {
                name: name.to_string(),
                color: None,
                icon: None,
            },
        )
        .await
        .unwrap();
    }
    let categories = repo.list_categories_for_owner(ada.id).await.unwrap();
    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "midway", "zeta"]);
}

#[tokio::test]
async fn test_invite_codes_are_unique() {
    let repo = LocalRepository::new();
    let ada = user(&repo, "ada@example.com").await;
    let team = repo
        .insert_team(
            ada.id,
            NewTeam {
                name: "Crew".to_string(),
                description: None,
                color_theme: None,
                parent_team_id: None,
            },
            0,
        )
        .await
        .unwrap();

    let invitation = NewInvitation {
        team_id: team.id,
        email: "carol@example.com".to_string(),
        invite_code: "SAMECODE1234".to_string(),
        invited_by: ada.id,
        expires_at: Utc::now() + Duration::days(7),
    };
    repo.insert_invitation(invitation.clone()).await.unwrap();
    let err = repo.insert_invitation(invitation).await.unwrap_err();
    assert_violates(err, constraints::INVITE_CODE);
}

#[tokio::test]
async fn test_status_names_are_unique_per_scope() {
    let repo = LocalRepository::new();
    let ada = user(&repo, "ada@example.com").await;
    let bob = user(&repo, "bob@example.com").await;

    let label = NewStatus {
        name: "waiting".to_string(),
        color: None,
        icon: None,
        display_order: None,
    };

    repo.insert_user_status(ada.id, label.clone()).await.unwrap();
    let err = repo
        .insert_user_status(ada.id, label.clone())
        .await
        .unwrap_err();
    assert_violates(err, constraints::USER_STATUS_NAME);

    // A different user may reuse the name.
    repo.insert_user_status(bob.id, label).await.unwrap();
}

#[tokio::test]
async fn test_sessions_find_delete_and_expire() {
    let repo = LocalRepository::new();
    let ada = user(&repo, "ada@example.com").await;

    repo.insert_session(NewSession {
        user_id: ada.id,
        token_digest: "live-digest".to_string(),
        expires_at: Utc::now() + Duration::hours(1),
    })
    .await
    .unwrap();
    repo.insert_session(NewSession {
        user_id: ada.id,
        token_digest: "stale-digest".to_string(),
        expires_at: Utc::now() - Duration::hours(1),
    })
    .await
    .unwrap();

    assert!(repo
        .find_session_by_digest("live-digest")
        .await
        .unwrap()
        .is_some());
    assert_eq!(repo.delete_expired_sessions().await.unwrap(), 1);
    assert!(repo
        .find_session_by_digest("stale-digest")
        .await
        .unwrap()
        .is_none());

    assert!(repo.delete_session("live-digest").await.unwrap());
    assert!(!repo.delete_session("live-digest").await.unwrap());
}

#[tokio::test]
async fn test_notifications_filter_and_mark_all() {
    let repo = LocalRepository::new();
    let ada = user(&repo, "ada@example.com").await;

    for n in 0..3 {
        repo.insert_notification(NewNotification {
            user_id: ada.id,
            kind: NotificationKind::TeamMemberAdded,
            title: format!("note {n}"),
            message: "hello".to_string(),
            related_id: None,
        })
        .await
        .unwrap();
    }

    let all = repo.list_notifications(ada.id, false).await.unwrap();
    assert_eq!(all.len(), 3);
    // Newest first.
    assert_eq!(all[0].title, "note 2");

    repo.mark_notification_read(all[2].id, ada.id).await.unwrap();
    assert_eq!(repo.list_notifications(ada.id, true).await.unwrap().len(), 2);

    assert_eq!(repo.mark_all_notifications_read(ada.id).await.unwrap(), 2);
    assert!(repo.list_notifications(ada.id, true).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_detach_category_reports_whether_it_was_attached() {
    let repo = LocalRepository::new();
    let ada = user(&repo, "ada@example.com").await;
    let goal = repo.insert_goal(ada.id, goal_named("Tagged")).await.unwrap();
    let category = repo
        .insert_category(
            ada.id,
            NewCategory {
                name: "Tags".to_string(),
                color: None,
                icon: None,
            },
        )
        .await
        .unwrap();

    assert!(!repo.detach_category(goal.id, category.id).await.unwrap());
    repo.attach_category(goal.id, category.id).await.unwrap();
    assert!(repo.detach_category(goal.id, category.id).await.unwrap());
    assert!(!repo.detach_category(goal.id, CategoryId::new(999)).await.unwrap());
}

#[tokio::test]
async fn test_fetch_missing_rows_return_none() {
    let repo = LocalRepository::new();
    assert!(repo.fetch_goal(GoalId::new(1)).await.unwrap().is_none());
    assert!(repo.fetch_team(TeamId::new(1)).await.unwrap().is_none());
    assert!(repo
        .find_invitation_by_code("NOSUCHCODE12")
        .await
        .unwrap()
        .is_none());
}
