/// Database migration runner
///
/// Schema for users, organizations and memberships lives in
/// `orghub-shared/migrations/` and is applied through sqlx's migrator, which
/// records applied versions and is safe to run on every startup.
///
/// The membership constraints (pair uniqueness and the two cascading foreign
/// keys) are applied afterwards by [`ensure_membership_constraints`]. Each
/// statement is attempted independently and a failure is logged, not
/// returned: on every run after the first the constraints already exist.

use sqlx::postgres::PgPool;
use tracing::{debug, info, warn};

/// Name of the unique constraint over `(user_id, organization_id)`
pub const MEMBERSHIP_UNIQUE_CONSTRAINT: &str = "uq_membership_user_organization";

/// Constraints added after the schema migration, as `(name, statement)`
const MEMBERSHIP_CONSTRAINTS: &[(&str, &str)] = &[
    (
        MEMBERSHIP_UNIQUE_CONSTRAINT,
        "ALTER TABLE organization_memberships \
         ADD CONSTRAINT uq_membership_user_organization UNIQUE (user_id, organization_id)",
    ),
    (
        "fk_membership_user",
        "ALTER TABLE organization_memberships \
         ADD CONSTRAINT fk_membership_user FOREIGN KEY (user_id) \
         REFERENCES users(id) ON DELETE CASCADE",
    ),
    (
        "fk_membership_organization",
        "ALTER TABLE organization_memberships \
         ADD CONSTRAINT fk_membership_organization FOREIGN KEY (organization_id) \
         REFERENCES organizations(id) ON DELETE CASCADE",
    ),
];

/// Runs all pending schema migrations
///
/// # Errors
///
/// Returns an error if a migration file fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    match sqlx::migrate!("./migrations").run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Migration failed");
            Err(e)
        }
    }
}

/// Adds the membership constraints, tolerating ones that already exist
///
/// Returns the number of constraints created by this call.
pub async fn ensure_membership_constraints(pool: &PgPool) -> usize {
    let mut created = 0;

    for &(name, statement) in MEMBERSHIP_CONSTRAINTS {
        match sqlx::query(statement).execute(pool).await {
            Ok(_) => {
                debug!(constraint = name, "Constraint created");
                created += 1;
            }
            Err(e) => {
                warn!(
                    constraint = name,
                    error = %e,
                    "Could not add constraint (it may already exist)"
                );
            }
        }
    }

    info!(created, "Membership constraints ensured");
    created
}

/// Counts successfully applied migrations
///
/// # Errors
///
/// Returns an error if the migrations table cannot be queried.
pub async fn applied_migration_count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public'
            AND table_name = '_sqlx_migrations'
        )",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await?;

    Ok(count)
}
