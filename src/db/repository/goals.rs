//! Goal, category and assignment repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{
    Category, CategoryId, CategoryPatch, Goal, GoalId, GoalPatch, NewCategory, NewGoal, TeamId,
    UserId,
};

/// Repository trait for goals, their categories and their team
/// assignments.
///
/// Authorization (ownership, membership, visibility) is the service
/// layer's job; these operations only move rows.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait GoalRepository: Send + Sync {
    // ==================== Goals ====================

    /// Insert a goal owned by `owner`.
    async fn insert_goal(&self, owner: UserId, new: NewGoal) -> RepositoryResult<Goal>;

    /// Fetch a goal by id.
    async fn fetch_goal(&self, id: GoalId) -> RepositoryResult<Option<Goal>>;

    /// List all goals owned by `owner`, newest first.
    async fn list_goals_for_owner(&self, owner: UserId) -> RepositoryResult<Vec<Goal>>;

    /// Apply a partial update to a goal and refresh its `updated_at`.
    ///
    /// # Returns
    /// * `Ok(Goal)` - The updated row
    /// * `Err(RepositoryError::NotFound)` - If the goal does not exist
    async fn update_goal(&self, id: GoalId, patch: GoalPatch) -> RepositoryResult<Goal>;

    /// Delete a goal together with its category links, team assignments
    /// and file attachments.
    ///
    /// # Returns
    /// * `Ok(true)` - The goal was removed
    /// * `Ok(false)` - No such goal
    async fn delete_goal(&self, id: GoalId) -> RepositoryResult<bool>;

    // ==================== Categories ====================

    /// Insert a category owned by `owner`.
    ///
    /// # Returns
    /// * `Err(RepositoryError::ValidationError)` - If the owner already
    ///   has a category with the same name
    async fn insert_category(&self, owner: UserId, new: NewCategory) -> RepositoryResult<Category>;

    /// Fetch a category by id.
    async fn fetch_category(&self, id: CategoryId) -> RepositoryResult<Option<Category>>;

    /// List the owner's categories ordered by name.
    async fn list_categories_for_owner(&self, owner: UserId) -> RepositoryResult<Vec<Category>>;

    /// Apply a partial update to a category.
    async fn update_category(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> RepositoryResult<Category>;

    /// Delete a category and its goal links. Goals survive.
    async fn delete_category(&self, id: CategoryId) -> RepositoryResult<bool>;

    /// Link a goal to a category. Idempotent.
    ///
    /// # Returns
    /// * `Ok(true)` - A new link was created
    /// * `Ok(false)` - The link already existed
    async fn attach_category(&self, goal: GoalId, category: CategoryId) -> RepositoryResult<bool>;

    /// Remove a goal/category link.
    async fn detach_category(&self, goal: GoalId, category: CategoryId) -> RepositoryResult<bool>;

    /// Category ids attached to a goal.
    async fn list_goal_categories(&self, goal: GoalId) -> RepositoryResult<Vec<CategoryId>>;

    /// Goals linked to a category, newest first.
    async fn list_goals_for_category(&self, category: CategoryId) -> RepositoryResult<Vec<Goal>>;

    // ==================== Team assignments ====================

    /// Assign a goal to a team. Duplicate assignments are tolerated.
    ///
    /// # Returns
    /// * `Ok(true)` - A new assignment row was created
    /// * `Ok(false)` - The assignment already existed
    async fn assign_goal_to_team(
        &self,
        goal: GoalId,
        team: TeamId,
        assigned_by: UserId,
    ) -> RepositoryResult<bool>;

    /// Remove a goal/team assignment.
    async fn unassign_goal_from_team(&self, goal: GoalId, team: TeamId) -> RepositoryResult<bool>;

    /// Ids of the teams a goal is assigned to.
    async fn list_goal_team_ids(&self, goal: GoalId) -> RepositoryResult<Vec<TeamId>>;

    /// Goals assigned to a team, newest first.
    async fn list_goals_for_team(&self, team: TeamId) -> RepositoryResult<Vec<Goal>>;
}
