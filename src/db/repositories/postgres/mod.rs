//! Postgres repository implementation using Diesel.
//!
//! This module implements the repository traits against a Postgres
//! database. Enum-like fields (roles, statuses, notification kinds) are
//! stored as text and parsed back through the `FromStr` impls on the
//! API types; uniqueness rules live in named constraints so validation
//! errors can be translated by the service layer.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task;

use crate::api::{
    Category, CategoryId, CategoryPatch, FileId, Goal, GoalFile, GoalId, GoalPatch, GoalStatus,
    InvitationId, InvitationStatus, NewCategory, NewGoal, NewGoalFile, NewInvitation,
    NewNotification, NewSession, NewStatus, NewTeam, NewUser, Notification, NotificationId,
    NotificationKind, Session, SessionId, StatusId, StatusPatch, Team, TeamId, TeamInvitation,
    TeamMember, TeamPatch, TeamRole, TeamStatus, User, UserId, UserRole, UserStatus, Visibility,
    DEFAULT_COLOR,
};
use crate::db::repository::{
    ErrorContext, FileRepository, FullRepository, GoalRepository, NotificationRepository,
    RepositoryError, RepositoryResult, StatusRepository, TeamRepository, UserRepository,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// `DATABASE_URL` (or `PG_DATABASE_URL`) is required; the pool and
    /// retry knobs fall back to defaults when unset.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let max_pool_size = std::env::var("PG_POOL_MAX")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let min_pool_size = std::env::var("PG_POOL_MIN")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);

        let connection_timeout_sec = std::env::var("PG_CONN_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let idle_timeout_sec = std::env::var("PG_IDLE_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(600);

        let max_retries = std::env::var("PG_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(3);

        let retry_delay_ms = std::env::var("PG_RETRY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(100);

        Ok(Self {
            database_url,
            max_pool_size,
            min_pool_size,
            connection_timeout_sec,
            idle_timeout_sec,
            max_retries,
            retry_delay_ms,
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
///
/// Provides connection pooling with configurable limits, automatic
/// retry for transient failures, and schema migrations on startup.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: std::sync::Arc<AtomicU64>,
    failed_queries: std::sync::Arc<AtomicU64>,
    retried_operations: std::sync::Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: std::sync::Arc::new(AtomicU64::new(0)),
            failed_queries: std::sync::Arc::new(AtomicU64::new(0)),
            retried_operations: std::sync::Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// Retries the operation up to `max_retries` times when a retryable
    /// error occurs (connection errors, timeouts, serialization failures).
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                // Get connection
                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                // Execute the operation
                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn parse_stored<T>(value: &str, what: &str) -> RepositoryResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .parse::<T>()
        .map_err(|e| RepositoryError::internal(format!("Invalid {what} in database: {e}")))
}

fn row_to_user(row: UserRow) -> RepositoryResult<User> {
    Ok(User {
        id: UserId::new(row.id),
        email: row.email,
        display_name: row.display_name,
        role: parse_stored::<UserRole>(&row.role, "user role")?,
        created_at: row.created_at,
    })
}

fn row_to_session(row: SessionRow) -> Session {
    Session {
        id: SessionId::new(row.id),
        user_id: UserId::new(row.user_id),
        token_digest: row.token_digest,
        created_at: row.created_at,
        expires_at: row.expires_at,
    }
}

fn row_to_goal(row: GoalRow) -> RepositoryResult<Goal> {
    Ok(Goal {
        id: GoalId::new(row.id),
        owner_id: UserId::new(row.user_id),
        title: row.title,
        description: row.description,
        status: parse_stored::<GoalStatus>(&row.status, "goal status")?,
        visibility: parse_stored::<Visibility>(&row.visibility, "goal visibility")?,
        target_date: row.target_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn rows_to_goals(rows: Vec<GoalRow>) -> RepositoryResult<Vec<Goal>> {
    rows.into_iter().map(row_to_goal).collect()
}

fn row_to_category(row: CategoryRow) -> Category {
    Category {
        id: CategoryId::new(row.id),
        user_id: UserId::new(row.user_id),
        name: row.name,
        color: row.color,
        icon: row.icon,
        created_at: row.created_at,
    }
}

fn row_to_team(row: TeamRow) -> Team {
    Team {
        id: TeamId::new(row.id),
        name: row.name,
        description: row.description,
        color_theme: row.color_theme,
        parent_team_id: row.parent_team_id.map(TeamId::new),
        created_by: UserId::new(row.created_by),
        nesting_level: row.nesting_level,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn row_to_member(row: TeamMemberRow) -> RepositoryResult<TeamMember> {
    Ok(TeamMember {
        id: row.id,
        team_id: TeamId::new(row.team_id),
        user_id: UserId::new(row.user_id),
        role: parse_stored::<TeamRole>(&row.role, "team role")?,
        invited_by: row.invited_by.map(UserId::new),
        joined_at: row.joined_at,
    })
}

fn row_to_invitation(row: TeamInvitationRow) -> RepositoryResult<TeamInvitation> {
    Ok(TeamInvitation {
        id: InvitationId::new(row.id),
        team_id: TeamId::new(row.team_id),
        email: row.email,
        invite_code: row.invite_code,
        invited_by: UserId::new(row.invited_by),
        status: parse_stored::<InvitationStatus>(&row.status, "invitation status")?,
        created_at: row.created_at,
        expires_at: row.expires_at,
    })
}

fn row_to_notification(row: NotificationRow) -> RepositoryResult<Notification> {
    Ok(Notification {
        id: NotificationId::new(row.id),
        user_id: UserId::new(row.user_id),
        kind: parse_stored::<NotificationKind>(&row.kind, "notification kind")?,
        title: row.title,
        message: row.message,
        related_id: row.related_id,
        read: row.read,
        created_at: row.created_at,
    })
}

fn row_to_file(row: GoalFileRow) -> GoalFile {
    GoalFile {
        id: FileId::new(row.id),
        goal_id: GoalId::new(row.goal_id),
        file_name: row.file_name,
        file_size: row.file_size,
        mime_type: row.mime_type,
        uploaded_by: UserId::new(row.uploaded_by),
        uploaded_at: row.uploaded_at,
    }
}

fn row_to_user_status(row: UserStatusRow) -> UserStatus {
    UserStatus {
        id: StatusId::new(row.id),
        user_id: UserId::new(row.user_id),
        name: row.name,
        color: row.color,
        icon: row.icon,
        display_order: row.display_order,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn row_to_team_status(row: TeamStatusRow) -> TeamStatus {
    TeamStatus {
        id: StatusId::new(row.id),
        team_id: TeamId::new(row.team_id),
        name: row.name,
        color: row.color,
        icon: row.icon,
        display_order: row.display_order,
        created_by: UserId::new(row.created_by),
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn insert_user(&self, new: NewUser) -> RepositoryResult<User> {
        self.with_conn(move |conn| {
            let row = NewUserRow {
                email: new.email.to_lowercase(),
                display_name: new.display_name.clone(),
                role: new.role.unwrap_or(UserRole::User).as_str().to_string(),
            };
            let inserted: UserRow = diesel::insert_into(users::table)
                .values(&row)
                .returning(UserRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)?;
            row_to_user(inserted)
        })
        .await
    }

    async fn fetch_user(&self, id: UserId) -> RepositoryResult<Option<User>> {
        self.with_conn(move |conn| {
            users::table
                .filter(users::id.eq(id.value()))
                .select(UserRow::as_select())
                .first::<UserRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_user)
                .transpose()
        })
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let email = email.to_lowercase();
        self.with_conn(move |conn| {
            users::table
                .filter(users::email.eq(email.clone()))
                .select(UserRow::as_select())
                .first::<UserRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_user)
                .transpose()
        })
        .await
    }

    async fn list_users(&self) -> RepositoryResult<Vec<User>> {
        self.with_conn(|conn| {
            let rows = users::table
                .select(UserRow::as_select())
                .order((users::created_at.asc(), users::email.asc()))
                .load::<UserRow>(conn)
                .map_err(map_diesel_error)?;
            rows.into_iter().map(row_to_user).collect()
        })
        .await
    }

    async fn insert_session(&self, new: NewSession) -> RepositoryResult<Session> {
        self.with_conn(move |conn| {
            let row = NewSessionRow {
                user_id: new.user_id.value(),
                token_digest: new.token_digest.clone(),
                expires_at: new.expires_at,
            };
            let inserted: SessionRow = diesel::insert_into(sessions::table)
                .values(&row)
                .returning(SessionRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)?;
            Ok(row_to_session(inserted))
        })
        .await
    }

    async fn find_session_by_digest(&self, digest: &str) -> RepositoryResult<Option<Session>> {
        let digest = digest.to_string();
        self.with_conn(move |conn| {
            Ok(sessions::table
                .filter(sessions::token_digest.eq(digest.clone()))
                .select(SessionRow::as_select())
                .first::<SessionRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_session))
        })
        .await
    }

    async fn delete_session(&self, digest: &str) -> RepositoryResult<bool> {
        let digest = digest.to_string();
        self.with_conn(move |conn| {
            let deleted =
                diesel::delete(sessions::table.filter(sessions::token_digest.eq(digest.clone())))
                    .execute(conn)
                    .map_err(map_diesel_error)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn delete_expired_sessions(&self) -> RepositoryResult<usize> {
        self.with_conn(|conn| {
            diesel::delete(sessions::table.filter(sessions::expires_at.lt(Utc::now())))
                .execute(conn)
                .map_err(map_diesel_error)
        })
        .await
    }
}

#[async_trait]
impl GoalRepository for PostgresRepository {
    async fn insert_goal(&self, owner: UserId, new: NewGoal) -> RepositoryResult<Goal> {
        self.with_conn(move |conn| {
            let row = NewGoalRow {
                user_id: owner.value(),
                title: new.title.clone(),
                description: new.description.clone(),
                status: new
                    .status
                    .unwrap_or(GoalStatus::Pending)
                    .as_str()
                    .to_string(),
                visibility: new
                    .visibility
                    .unwrap_or(Visibility::Private)
                    .as_str()
                    .to_string(),
                target_date: new.target_date,
            };
            let inserted: GoalRow = diesel::insert_into(goals::table)
                .values(&row)
                .returning(GoalRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)?;
            row_to_goal(inserted)
        })
        .await
    }

    async fn fetch_goal(&self, id: GoalId) -> RepositoryResult<Option<Goal>> {
        self.with_conn(move |conn| {
            goals::table
                .filter(goals::id.eq(id.value()))
                .select(GoalRow::as_select())
                .first::<GoalRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_goal)
                .transpose()
        })
        .await
    }

    async fn list_goals_for_owner(&self, owner: UserId) -> RepositoryResult<Vec<Goal>> {
        self.with_conn(move |conn| {
            let rows = goals::table
                .filter(goals::user_id.eq(owner.value()))
                .select(GoalRow::as_select())
                .order((goals::created_at.desc(), goals::id.desc()))
                .load::<GoalRow>(conn)
                .map_err(map_diesel_error)?;
            rows_to_goals(rows)
        })
        .await
    }

    async fn update_goal(&self, id: GoalId, patch: GoalPatch) -> RepositoryResult<Goal> {
        self.with_conn(move |conn| {
            let changeset = GoalChangeset {
                title: patch.title.clone(),
                description: patch.description.clone(),
                status: patch.status.map(|s| s.as_str().to_string()),
                visibility: patch.visibility.map(|v| v.as_str().to_string()),
                target_date: patch.target_date,
                updated_at: Utc::now(),
            };
            let updated: GoalRow = diesel::update(goals::table.filter(goals::id.eq(id.value())))
                .set(&changeset)
                .returning(GoalRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)?;
            row_to_goal(updated)
        })
        .await
    }

    async fn delete_goal(&self, id: GoalId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            // Links, assignments and files go with the goal via ON DELETE CASCADE.
            let deleted = diesel::delete(goals::table.filter(goals::id.eq(id.value())))
                .execute(conn)
                .map_err(map_diesel_error)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn insert_category(&self, owner: UserId, new: NewCategory) -> RepositoryResult<Category> {
        self.with_conn(move |conn| {
            let row = NewCategoryRow {
                user_id: owner.value(),
                name: new.name.clone(),
                color: new
                    .color
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
                icon: new.icon.clone(),
            };
            let inserted: CategoryRow = diesel::insert_into(categories::table)
                .values(&row)
                .returning(CategoryRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)?;
            Ok(row_to_category(inserted))
        })
        .await
    }

    async fn fetch_category(&self, id: CategoryId) -> RepositoryResult<Option<Category>> {
        self.with_conn(move |conn| {
            Ok(categories::table
                .filter(categories::id.eq(id.value()))
                .select(CategoryRow::as_select())
                .first::<CategoryRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_category))
        })
        .await
    }

    async fn list_categories_for_owner(&self, owner: UserId) -> RepositoryResult<Vec<Category>> {
        self.with_conn(move |conn| {
            let rows = categories::table
                .filter(categories::user_id.eq(owner.value()))
                .select(CategoryRow::as_select())
                .order(categories::name.asc())
                .load::<CategoryRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(row_to_category).collect())
        })
        .await
    }

    async fn update_category(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> RepositoryResult<Category> {
        self.with_conn(move |conn| {
            if patch.name.is_none() && patch.color.is_none() && patch.icon.is_none() {
                // Nothing to change; behave like a read.
                return categories::table
                    .filter(categories::id.eq(id.value()))
                    .select(CategoryRow::as_select())
                    .first::<CategoryRow>(conn)
                    .map(row_to_category)
                    .map_err(map_diesel_error);
            }
            let changeset = CategoryChangeset {
                name: patch.name.clone(),
                color: patch.color.clone(),
                icon: patch.icon.clone(),
            };
            let updated: CategoryRow =
                diesel::update(categories::table.filter(categories::id.eq(id.value())))
                    .set(&changeset)
                    .returning(CategoryRow::as_returning())
                    .get_result(conn)
                    .map_err(map_diesel_error)?;
            Ok(row_to_category(updated))
        })
        .await
    }

    async fn delete_category(&self, id: CategoryId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(categories::table.filter(categories::id.eq(id.value())))
                .execute(conn)
                .map_err(map_diesel_error)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn attach_category(&self, goal: GoalId, category: CategoryId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            let inserted = diesel::insert_into(goal_categories::table)
                .values((
                    goal_categories::goal_id.eq(goal.value()),
                    goal_categories::category_id.eq(category.value()),
                ))
                .on_conflict_do_nothing()
                .execute(conn)
                .map_err(map_diesel_error)?;
            Ok(inserted > 0)
        })
        .await
    }

    async fn detach_category(&self, goal: GoalId, category: CategoryId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(
                goal_categories::table
                    .filter(goal_categories::goal_id.eq(goal.value()))
                    .filter(goal_categories::category_id.eq(category.value())),
            )
            .execute(conn)
            .map_err(map_diesel_error)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn list_goal_categories(&self, goal: GoalId) -> RepositoryResult<Vec<CategoryId>> {
        self.with_conn(move |conn| {
            let ids: Vec<i64> = goal_categories::table
                .filter(goal_categories::goal_id.eq(goal.value()))
                .select(goal_categories::category_id)
                .order(goal_categories::category_id.asc())
                .load(conn)
                .map_err(map_diesel_error)?;
            Ok(ids.into_iter().map(CategoryId::new).collect())
        })
        .await
    }

    async fn list_goals_for_category(&self, category: CategoryId) -> RepositoryResult<Vec<Goal>> {
        self.with_conn(move |conn| {
            let rows = goals::table
                .inner_join(goal_categories::table.on(goal_categories::goal_id.eq(goals::id)))
                .filter(goal_categories::category_id.eq(category.value()))
                .select(GoalRow::as_select())
                .order((goals::created_at.desc(), goals::id.desc()))
                .load::<GoalRow>(conn)
                .map_err(map_diesel_error)?;
            rows_to_goals(rows)
        })
        .await
    }

    async fn assign_goal_to_team(
        &self,
        goal: GoalId,
        team: TeamId,
        assigned_by: UserId,
    ) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            let row = NewGoalTeamRow {
                goal_id: goal.value(),
                team_id: team.value(),
                assigned_by: assigned_by.value(),
            };
            let inserted = diesel::insert_into(goal_teams::table)
                .values(&row)
                .on_conflict_do_nothing()
                .execute(conn)
                .map_err(map_diesel_error)?;
            Ok(inserted > 0)
        })
        .await
    }

    async fn unassign_goal_from_team(&self, goal: GoalId, team: TeamId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(
                goal_teams::table
                    .filter(goal_teams::goal_id.eq(goal.value()))
                    .filter(goal_teams::team_id.eq(team.value())),
            )
            .execute(conn)
            .map_err(map_diesel_error)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn list_goal_team_ids(&self, goal: GoalId) -> RepositoryResult<Vec<TeamId>> {
        self.with_conn(move |conn| {
            let ids: Vec<i64> = goal_teams::table
                .filter(goal_teams::goal_id.eq(goal.value()))
                .select(goal_teams::team_id)
                .order(goal_teams::team_id.asc())
                .load(conn)
                .map_err(map_diesel_error)?;
            Ok(ids.into_iter().map(TeamId::new).collect())
        })
        .await
    }

    async fn list_goals_for_team(&self, team: TeamId) -> RepositoryResult<Vec<Goal>> {
        self.with_conn(move |conn| {
            let rows = goals::table
                .inner_join(goal_teams::table.on(goal_teams::goal_id.eq(goals::id)))
                .filter(goal_teams::team_id.eq(team.value()))
                .select(GoalRow::as_select())
                .order((goals::created_at.desc(), goals::id.desc()))
                .load::<GoalRow>(conn)
                .map_err(map_diesel_error)?;
            rows_to_goals(rows)
        })
        .await
    }
}

#[async_trait]
impl TeamRepository for PostgresRepository {
    async fn insert_team(
        &self,
        created_by: UserId,
        new: NewTeam,
        nesting_level: i32,
    ) -> RepositoryResult<Team> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let row = NewTeamRow {
                    name: new.name.clone(),
                    description: new.description.clone(),
                    color_theme: new
                        .color_theme
                        .clone()
                        .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
                    parent_team_id: new.parent_team_id.map(|t| t.value()),
                    created_by: created_by.value(),
                    nesting_level,
                };
                let inserted: TeamRow = diesel::insert_into(teams::table)
                    .values(&row)
                    .returning(TeamRow::as_returning())
                    .get_result(tx)
                    .map_err(map_diesel_error)?;

                // The creator starts as the team's owner.
                let owner = NewTeamMemberRow {
                    team_id: inserted.id,
                    user_id: created_by.value(),
                    role: TeamRole::Owner.as_str().to_string(),
                    invited_by: None,
                };
                diesel::insert_into(team_members::table)
                    .values(&owner)
                    .execute(tx)
                    .map_err(map_diesel_error)?;

                Ok(row_to_team(inserted))
            })
        })
        .await
    }

    async fn fetch_team(&self, id: TeamId) -> RepositoryResult<Option<Team>> {
        self.with_conn(move |conn| {
            Ok(teams::table
                .filter(teams::id.eq(id.value()))
                .select(TeamRow::as_select())
                .first::<TeamRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_team))
        })
        .await
    }

    async fn list_teams_for_user(&self, user: UserId) -> RepositoryResult<Vec<Team>> {
        self.with_conn(move |conn| {
            let rows = teams::table
                .inner_join(team_members::table.on(team_members::team_id.eq(teams::id)))
                .filter(team_members::user_id.eq(user.value()))
                .select(TeamRow::as_select())
                .order((teams::created_at.desc(), teams::id.desc()))
                .load::<TeamRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(row_to_team).collect())
        })
        .await
    }

    async fn update_team(&self, id: TeamId, patch: TeamPatch) -> RepositoryResult<Team> {
        self.with_conn(move |conn| {
            let changeset = TeamChangeset {
                name: patch.name.clone(),
                description: patch.description.clone(),
                color_theme: patch.color_theme.clone(),
                updated_at: Utc::now(),
            };
            let updated: TeamRow = diesel::update(teams::table.filter(teams::id.eq(id.value())))
                .set(&changeset)
                .returning(TeamRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)?;
            Ok(row_to_team(updated))
        })
        .await
    }

    async fn delete_team(&self, id: TeamId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            // Memberships, invitations, statuses and assignments cascade;
            // child teams get their parent reference cleared.
            let deleted = diesel::delete(teams::table.filter(teams::id.eq(id.value())))
                .execute(conn)
                .map_err(map_diesel_error)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn list_members(&self, team: TeamId) -> RepositoryResult<Vec<TeamMember>> {
        self.with_conn(move |conn| {
            let rows = team_members::table
                .filter(team_members::team_id.eq(team.value()))
                .select(TeamMemberRow::as_select())
                .order((team_members::joined_at.asc(), team_members::id.asc()))
                .load::<TeamMemberRow>(conn)
                .map_err(map_diesel_error)?;
            rows.into_iter().map(row_to_member).collect()
        })
        .await
    }

    async fn find_member(
        &self,
        team: TeamId,
        user: UserId,
    ) -> RepositoryResult<Option<TeamMember>> {
        self.with_conn(move |conn| {
            team_members::table
                .filter(team_members::team_id.eq(team.value()))
                .filter(team_members::user_id.eq(user.value()))
                .select(TeamMemberRow::as_select())
                .first::<TeamMemberRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_member)
                .transpose()
        })
        .await
    }

    async fn insert_member(
        &self,
        team: TeamId,
        user: UserId,
        role: TeamRole,
        invited_by: Option<UserId>,
    ) -> RepositoryResult<TeamMember> {
        self.with_conn(move |conn| {
            let row = NewTeamMemberRow {
                team_id: team.value(),
                user_id: user.value(),
                role: role.as_str().to_string(),
                invited_by: invited_by.map(|u| u.value()),
            };
            let inserted: TeamMemberRow = diesel::insert_into(team_members::table)
                .values(&row)
                .returning(TeamMemberRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)?;
            row_to_member(inserted)
        })
        .await
    }

    async fn update_member_role(
        &self,
        team: TeamId,
        user: UserId,
        role: TeamRole,
    ) -> RepositoryResult<TeamMember> {
        self.with_conn(move |conn| {
            let updated: TeamMemberRow = diesel::update(
                team_members::table
                    .filter(team_members::team_id.eq(team.value()))
                    .filter(team_members::user_id.eq(user.value())),
            )
            .set(team_members::role.eq(role.as_str().to_string()))
            .returning(TeamMemberRow::as_returning())
            .get_result(conn)
            .map_err(map_diesel_error)?;
            row_to_member(updated)
        })
        .await
    }

    async fn remove_member(&self, team: TeamId, user: UserId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(
                team_members::table
                    .filter(team_members::team_id.eq(team.value()))
                    .filter(team_members::user_id.eq(user.value())),
            )
            .execute(conn)
            .map_err(map_diesel_error)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn insert_invitation(&self, new: NewInvitation) -> RepositoryResult<TeamInvitation> {
        self.with_conn(move |conn| {
            let row = NewTeamInvitationRow {
                team_id: new.team_id.value(),
                email: new.email.to_lowercase(),
                invite_code: new.invite_code.clone(),
                invited_by: new.invited_by.value(),
                status: InvitationStatus::Pending.as_str().to_string(),
                expires_at: new.expires_at,
            };
            let inserted: TeamInvitationRow = diesel::insert_into(team_invitations::table)
                .values(&row)
                .returning(TeamInvitationRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)?;
            row_to_invitation(inserted)
        })
        .await
    }

    async fn fetch_invitation(
        &self,
        id: InvitationId,
    ) -> RepositoryResult<Option<TeamInvitation>> {
        self.with_conn(move |conn| {
            team_invitations::table
                .filter(team_invitations::id.eq(id.value()))
                .select(TeamInvitationRow::as_select())
                .first::<TeamInvitationRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_invitation)
                .transpose()
        })
        .await
    }

    async fn find_invitation_by_code(
        &self,
        code: &str,
    ) -> RepositoryResult<Option<TeamInvitation>> {
        let code = code.to_string();
        self.with_conn(move |conn| {
            team_invitations::table
                .filter(team_invitations::invite_code.eq(code.clone()))
                .select(TeamInvitationRow::as_select())
                .first::<TeamInvitationRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_invitation)
                .transpose()
        })
        .await
    }

    async fn list_invitations_for_team(
        &self,
        team: TeamId,
    ) -> RepositoryResult<Vec<TeamInvitation>> {
        self.with_conn(move |conn| {
            let rows = team_invitations::table
                .filter(team_invitations::team_id.eq(team.value()))
                .select(TeamInvitationRow::as_select())
                .order((
                    team_invitations::created_at.desc(),
                    team_invitations::id.desc(),
                ))
                .load::<TeamInvitationRow>(conn)
                .map_err(map_diesel_error)?;
            rows.into_iter().map(row_to_invitation).collect()
        })
        .await
    }

    async fn list_pending_invitations_for_email(
        &self,
        email: &str,
    ) -> RepositoryResult<Vec<TeamInvitation>> {
        let email = email.to_lowercase();
        self.with_conn(move |conn| {
            let rows = team_invitations::table
                .filter(team_invitations::email.eq(email.clone()))
                .filter(team_invitations::status.eq(InvitationStatus::Pending.as_str()))
                .select(TeamInvitationRow::as_select())
                .order((
                    team_invitations::created_at.desc(),
                    team_invitations::id.desc(),
                ))
                .load::<TeamInvitationRow>(conn)
                .map_err(map_diesel_error)?;
            rows.into_iter().map(row_to_invitation).collect()
        })
        .await
    }

    async fn update_invitation_status(
        &self,
        id: InvitationId,
        status: InvitationStatus,
    ) -> RepositoryResult<TeamInvitation> {
        self.with_conn(move |conn| {
            let updated: TeamInvitationRow =
                diesel::update(team_invitations::table.filter(team_invitations::id.eq(id.value())))
                    .set(team_invitations::status.eq(status.as_str().to_string()))
                    .returning(TeamInvitationRow::as_returning())
                    .get_result(conn)
                    .map_err(map_diesel_error)?;
            row_to_invitation(updated)
        })
        .await
    }
}

#[async_trait]
impl NotificationRepository for PostgresRepository {
    async fn insert_notification(&self, new: NewNotification) -> RepositoryResult<Notification> {
        self.with_conn(move |conn| {
            let row = NewNotificationRow {
                user_id: new.user_id.value(),
                kind: new.kind.as_str().to_string(),
                title: new.title.clone(),
                message: new.message.clone(),
                related_id: new.related_id,
            };
            let inserted: NotificationRow = diesel::insert_into(notifications::table)
                .values(&row)
                .returning(NotificationRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)?;
            row_to_notification(inserted)
        })
        .await
    }

    async fn list_notifications(
        &self,
        user: UserId,
        unread_only: bool,
    ) -> RepositoryResult<Vec<Notification>> {
        self.with_conn(move |conn| {
            let mut query = notifications::table
                .filter(notifications::user_id.eq(user.value()))
                .into_boxed();
            if unread_only {
                query = query.filter(notifications::read.eq(false));
            }
            let rows = query
                .select(NotificationRow::as_select())
                .order((notifications::created_at.desc(), notifications::id.desc()))
                .load::<NotificationRow>(conn)
                .map_err(map_diesel_error)?;
            rows.into_iter().map(row_to_notification).collect()
        })
        .await
    }

    async fn mark_notification_read(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> RepositoryResult<Option<Notification>> {
        self.with_conn(move |conn| {
            diesel::update(
                notifications::table
                    .filter(notifications::id.eq(id.value()))
                    .filter(notifications::user_id.eq(user.value())),
            )
            .set(notifications::read.eq(true))
            .returning(NotificationRow::as_returning())
            .get_result::<NotificationRow>(conn)
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_notification)
            .transpose()
        })
        .await
    }

    async fn mark_all_notifications_read(&self, user: UserId) -> RepositoryResult<usize> {
        self.with_conn(move |conn| {
            diesel::update(
                notifications::table
                    .filter(notifications::user_id.eq(user.value()))
                    .filter(notifications::read.eq(false)),
            )
            .set(notifications::read.eq(true))
            .execute(conn)
            .map_err(map_diesel_error)
        })
        .await
    }
}

#[async_trait]
impl FileRepository for PostgresRepository {
    async fn insert_file(&self, new: NewGoalFile) -> RepositoryResult<GoalFile> {
        self.with_conn(move |conn| {
            let row = NewGoalFileRow {
                goal_id: new.goal_id.value(),
                file_name: new.file_name.clone(),
                file_size: new.content.len() as i64,
                mime_type: new.mime_type.clone(),
                content: new.content.clone(),
                uploaded_by: new.uploaded_by.value(),
            };
            let inserted: GoalFileRow = diesel::insert_into(goal_files::table)
                .values(&row)
                .returning(GoalFileRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)?;
            Ok(row_to_file(inserted))
        })
        .await
    }

    async fn fetch_file(&self, id: FileId) -> RepositoryResult<Option<GoalFile>> {
        self.with_conn(move |conn| {
            Ok(goal_files::table
                .filter(goal_files::id.eq(id.value()))
                .select(GoalFileRow::as_select())
                .first::<GoalFileRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_file))
        })
        .await
    }

    async fn fetch_file_content(&self, id: FileId) -> RepositoryResult<Option<Vec<u8>>> {
        self.with_conn(move |conn| {
            goal_files::table
                .filter(goal_files::id.eq(id.value()))
                .select(goal_files::content)
                .first::<Vec<u8>>(conn)
                .optional()
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn list_files_for_goal(&self, goal: GoalId) -> RepositoryResult<Vec<GoalFile>> {
        self.with_conn(move |conn| {
            let rows = goal_files::table
                .filter(goal_files::goal_id.eq(goal.value()))
                .select(GoalFileRow::as_select())
                .order((goal_files::uploaded_at.desc(), goal_files::id.desc()))
                .load::<GoalFileRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(row_to_file).collect())
        })
        .await
    }

    async fn count_files_for_goal(&self, goal: GoalId) -> RepositoryResult<usize> {
        self.with_conn(move |conn| {
            use diesel::dsl::count_star;
            let count: i64 = goal_files::table
                .filter(goal_files::goal_id.eq(goal.value()))
                .select(count_star())
                .first(conn)
                .map_err(map_diesel_error)?;
            Ok(count as usize)
        })
        .await
    }

    async fn delete_file(&self, id: FileId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(goal_files::table.filter(goal_files::id.eq(id.value())))
                .execute(conn)
                .map_err(map_diesel_error)?;
            Ok(deleted > 0)
        })
        .await
    }
}

#[async_trait]
impl StatusRepository for PostgresRepository {
    async fn insert_user_status(
        &self,
        owner: UserId,
        new: NewStatus,
    ) -> RepositoryResult<UserStatus> {
        self.with_conn(move |conn| {
            let row = NewUserStatusRow {
                user_id: owner.value(),
                name: new.name.clone(),
                color: new
                    .color
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
                icon: new.icon.clone(),
                display_order: new.display_order.unwrap_or(0),
            };
            let inserted: UserStatusRow = diesel::insert_into(user_statuses::table)
                .values(&row)
                .returning(UserStatusRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)?;
            Ok(row_to_user_status(inserted))
        })
        .await
    }

    async fn fetch_user_status(&self, id: StatusId) -> RepositoryResult<Option<UserStatus>> {
        self.with_conn(move |conn| {
            Ok(user_statuses::table
                .filter(user_statuses::id.eq(id.value()))
                .select(UserStatusRow::as_select())
                .first::<UserStatusRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_user_status))
        })
        .await
    }

    async fn list_user_statuses(&self, owner: UserId) -> RepositoryResult<Vec<UserStatus>> {
        self.with_conn(move |conn| {
            let rows = user_statuses::table
                .filter(user_statuses::user_id.eq(owner.value()))
                .select(UserStatusRow::as_select())
                .order((user_statuses::display_order.asc(), user_statuses::id.asc()))
                .load::<UserStatusRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(row_to_user_status).collect())
        })
        .await
    }

    async fn update_user_status(
        &self,
        id: StatusId,
        patch: StatusPatch,
    ) -> RepositoryResult<UserStatus> {
        self.with_conn(move |conn| {
            let changeset = UserStatusChangeset {
                name: patch.name.clone(),
                color: patch.color.clone(),
                icon: patch.icon.clone(),
                display_order: patch.display_order,
                updated_at: Utc::now(),
            };
            let updated: UserStatusRow =
                diesel::update(user_statuses::table.filter(user_statuses::id.eq(id.value())))
                    .set(&changeset)
                    .returning(UserStatusRow::as_returning())
                    .get_result(conn)
                    .map_err(map_diesel_error)?;
            Ok(row_to_user_status(updated))
        })
        .await
    }

    async fn delete_user_status(&self, id: StatusId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            let deleted =
                diesel::delete(user_statuses::table.filter(user_statuses::id.eq(id.value())))
                    .execute(conn)
                    .map_err(map_diesel_error)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn insert_team_status(
        &self,
        team: TeamId,
        created_by: UserId,
        new: NewStatus,
    ) -> RepositoryResult<TeamStatus> {
        self.with_conn(move |conn| {
            let row = NewTeamStatusRow {
                team_id: team.value(),
                name: new.name.clone(),
                color: new
                    .color
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
                icon: new.icon.clone(),
                display_order: new.display_order.unwrap_or(0),
                created_by: created_by.value(),
            };
            let inserted: TeamStatusRow = diesel::insert_into(team_statuses::table)
                .values(&row)
                .returning(TeamStatusRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)?;
            Ok(row_to_team_status(inserted))
        })
        .await
    }

    async fn fetch_team_status(&self, id: StatusId) -> RepositoryResult<Option<TeamStatus>> {
        self.with_conn(move |conn| {
            Ok(team_statuses::table
                .filter(team_statuses::id.eq(id.value()))
                .select(TeamStatusRow::as_select())
                .first::<TeamStatusRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_team_status))
        })
        .await
    }

    async fn list_team_statuses(&self, team: TeamId) -> RepositoryResult<Vec<TeamStatus>> {
        self.with_conn(move |conn| {
            let rows = team_statuses::table
                .filter(team_statuses::team_id.eq(team.value()))
                .select(TeamStatusRow::as_select())
                .order((team_statuses::display_order.asc(), team_statuses::id.asc()))
                .load::<TeamStatusRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(row_to_team_status).collect())
        })
        .await
    }

    async fn update_team_status(
        &self,
        id: StatusId,
        patch: StatusPatch,
    ) -> RepositoryResult<TeamStatus> {
        self.with_conn(move |conn| {
            let changeset = TeamStatusChangeset {
                name: patch.name.clone(),
                color: patch.color.clone(),
                icon: patch.icon.clone(),
                display_order: patch.display_order,
                updated_at: Utc::now(),
            };
            let updated: TeamStatusRow =
                diesel::update(team_statuses::table.filter(team_statuses::id.eq(id.value())))
                    .set(&changeset)
                    .returning(TeamStatusRow::as_returning())
                    .get_result(conn)
                    .map_err(map_diesel_error)?;
            Ok(row_to_team_status(updated))
        })
        .await
    }

    async fn delete_team_status(&self, id: StatusId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            let deleted =
                diesel::delete(team_statuses::table.filter(team_statuses::id.eq(id.value())))
                    .execute(conn)
                    .map_err(map_diesel_error)?;
            Ok(deleted > 0)
        })
        .await
    }
}

#[async_trait]
impl FullRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<()> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| ())
                .map_err(map_diesel_error)
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
