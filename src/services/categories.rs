//! Per-user goal categories.

use crate::api::{
    is_valid_hex_color, is_valid_length, Category, CategoryId, CategoryPatch, Goal, NewCategory,
    MAX_CATEGORY_NAME_LEN,
};
use crate::auth::AuthenticatedUser;
use crate::db::repositories::local::constraints;
use crate::db::repository::FullRepository;

use super::{violates, ServiceError, ServiceResult};

fn validate_input(name: Option<&str>, color: Option<&str>) -> ServiceResult<()> {
    if let Some(name) = name {
        if !is_valid_length(name, 1, MAX_CATEGORY_NAME_LEN) {
            return Err(ServiceError::Validation(
                "Category name must be between 1 and 50 characters".to_string(),
            ));
        }
    }
    if let Some(color) = color {
        if !is_valid_hex_color(color) {
            return Err(ServiceError::Validation(
                "Color must be a hex color like #3B82F6".to_string(),
            ));
        }
    }
    Ok(())
}

fn duplicate_name(name: &str) -> ServiceError {
    ServiceError::Validation(format!("Category with name '{}' already exists", name))
}

/// Fetch a category the caller owns, or report it missing.
async fn owned_category(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    id: CategoryId,
) -> ServiceResult<Category> {
    match repo.fetch_category(id).await? {
        Some(category) if category.user_id == user.user_id => Ok(category),
        _ => Err(ServiceError::NotFound(format!(
            "Category with id {} not found",
            id
        ))),
    }
}

/// Create a category owned by the caller. Names are unique per user.
pub async fn create_category(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    input: NewCategory,
) -> ServiceResult<Category> {
    validate_input(Some(&input.name), input.color.as_deref())?;
    let name = input.name.clone();
    repo.insert_category(user.user_id, input)
        .await
        .map_err(|err| {
            if violates(&err, constraints::CATEGORY_NAME) {
                duplicate_name(&name)
            } else {
                err.into()
            }
        })
}

/// The caller's categories, alphabetical.
pub async fn list_categories(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
) -> ServiceResult<Vec<Category>> {
    Ok(repo.list_categories_for_owner(user.user_id).await?)
}

/// Fetch one of the caller's categories.
pub async fn get_category(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    id: CategoryId,
) -> ServiceResult<Category> {
    owned_category(repo, user, id).await
}

/// Update one of the caller's categories.
pub async fn update_category(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    id: CategoryId,
    patch: CategoryPatch,
) -> ServiceResult<Category> {
    let current = owned_category(repo, user, id).await?;
    validate_input(patch.name.as_deref(), patch.color.as_deref())?;
    if patch.name.is_none() && patch.color.is_none() && patch.icon.is_none() {
        return Ok(current);
    }

    let renamed_to = patch.name.clone();
    repo.update_category(id, patch).await.map_err(|err| {
        match renamed_to {
            Some(ref name) if violates(&err, constraints::CATEGORY_NAME) => duplicate_name(name),
            _ => err.into(),
        }
    })
}

/// Delete one of the caller's categories. Linked goals survive.
pub async fn delete_category(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    id: CategoryId,
) -> ServiceResult<()> {
    owned_category(repo, user, id).await?;
    repo.delete_category(id).await?;
    Ok(())
}

/// Goals linked to one of the caller's categories, newest first.
pub async fn list_category_goals(
    repo: &dyn FullRepository,
    user: &AuthenticatedUser,
    id: CategoryId,
) -> ServiceResult<Vec<Goal>> {
    owned_category(repo, user, id).await?;
    Ok(repo.list_goals_for_category(id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::NewGoal;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::GoalRepository;
    use crate::services::testing::{acting, user};

    fn category_named(name: &str) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            color: None,
            icon: None,
        }
    }

    #[tokio::test]
    async fn names_are_unique_per_user() {
        let repo = LocalRepository::new();
        let alice = user(&repo, "alice@example.com").await;
        let bob = user(&repo, "bob@example.com").await;

        create_category(&repo, &acting(&alice), category_named("health"))
            .await
            .unwrap();
        let err = create_category(&repo, &acting(&alice), category_named("health"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m.contains("already exists")));

        // Bob's namespace is his own.
        create_category(&repo, &acting(&bob), category_named("health"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn access_is_scoped_to_the_owner() {
        let repo = LocalRepository::new();
        let alice = user(&repo, "alice@example.com").await;
        let bob = user(&repo, "bob@example.com").await;

        let cat = create_category(&repo, &acting(&alice), category_named("career"))
            .await
            .unwrap();

        let err = get_category(&repo, &acting(&bob), cat.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        let err = delete_category(&repo, &acting(&bob), cat.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        // And listing is per caller.
        assert_eq!(
            list_categories(&repo, &acting(&alice)).await.unwrap().len(),
            1
        );
        assert!(list_categories(&repo, &acting(&bob)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn updates_are_partial_and_rename_safe() {
        let repo = LocalRepository::new();
        let alice = user(&repo, "alice@example.com").await;
        let actor = acting(&alice);

        create_category(&repo, &actor, category_named("health"))
            .await
            .unwrap();
        let cat = create_category(&repo, &actor, category_named("money"))
            .await
            .unwrap();

        let err = update_category(
            &repo,
            &actor,
            cat.id,
            CategoryPatch {
                name: Some("health".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let updated = update_category(
            &repo,
            &actor,
            cat.id,
            CategoryPatch {
                color: Some("#112233".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "money");
        assert_eq!(updated.color, "#112233");

        // An empty patch reads back unchanged.
        let same = update_category(&repo, &actor, cat.id, CategoryPatch::default())
            .await
            .unwrap();
        assert_eq!(same.color, "#112233");
    }

    #[tokio::test]
    async fn goals_survive_category_deletion() {
        let repo = LocalRepository::new();
        let alice = user(&repo, "alice@example.com").await;
        let actor = acting(&alice);

        let cat = create_category(&repo, &actor, category_named("health"))
            .await
            .unwrap();
        let goal = repo
            .insert_goal(
                alice.id,
                NewGoal {
                    title: "run".to_string(),
                    description: None,
                    status: None,
                    visibility: None,
                    target_date: None,
                },
            )
            .await
            .unwrap();
        repo.attach_category(goal.id, cat.id).await.unwrap();

        let linked = list_category_goals(&repo, &actor, cat.id).await.unwrap();
        assert_eq!(linked.len(), 1);

        delete_category(&repo, &actor, cat.id).await.unwrap();
        assert!(repo.fetch_goal(goal.id).await.unwrap().is_some());
        assert!(repo
            .list_goal_categories(goal.id)
            .await
            .unwrap()
            .is_empty());
    }
}
