//! # Staff Repository
//!
//! Cashiers and admins. The ledger only ever asks one question of this
//! table: does this id exist, and is it still allowed to ring up sales?

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use duka_core::{Staff, StaffRole};

const STAFF_COLUMNS: &str = "id, username, full_name, role, is_active, created_at";

/// Repository for staff database operations.
#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: SqlitePool,
}

impl StaffRepository {
    /// Creates a new StaffRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StaffRepository { pool }
    }

    /// Gets a staff member by ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Staff>> {
        let mut conn = self.pool.acquire().await?;
        fetch_staff(&mut conn, id).await
    }

    /// Gets a staff member by login name.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(&format!(
            "SELECT {STAFF_COLUMNS} FROM staff WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(staff)
    }

    /// Creates a new active staff member.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - username already taken
    pub async fn create(
        &self,
        username: &str,
        full_name: Option<&str>,
        role: StaffRole,
    ) -> DbResult<Staff> {
        let staff = Staff {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            full_name: full_name.map(str::to_string),
            role,
            is_active: true,
            created_at: Utc::now(),
        };

        debug!(id = %staff.id, username = %staff.username, "Creating staff member");

        sqlx::query(
            r#"
            INSERT INTO staff (id, username, full_name, role, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&staff.id)
        .bind(&staff.username)
        .bind(&staff.full_name)
        .bind(staff.role)
        .bind(staff.is_active)
        .bind(staff.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, username),
            other => other,
        })?;

        Ok(staff)
    }

    /// Activates or deactivates a staff member.
    ///
    /// Deactivated staff keep their history but can no longer commit
    /// receipts or open shifts.
    pub async fn set_active(&self, id: &str, is_active: bool) -> DbResult<()> {
        debug!(id = %id, is_active, "Updating staff active flag");

        let result = sqlx::query("UPDATE staff SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Staff", id));
        }

        Ok(())
    }
}

// =============================================================================
// Connection-level Operations (run inside ledger transactions)
// =============================================================================

/// Loads a staff member on the given connection.
pub async fn fetch_staff(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Staff>> {
    let staff = sqlx::query_as::<_, Staff>(&format!(
        "SELECT {STAFF_COLUMNS} FROM staff WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(staff)
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use duka_core::StaffRole;

    #[tokio::test]
    async fn test_create_and_deactivate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.staff();

        let staff = repo
            .create("wanjiku", Some("Wanjiku Kamau"), StaffRole::Cashier)
            .await
            .unwrap();
        assert!(staff.is_active);

        let found = repo.get_by_username("wanjiku").await.unwrap().unwrap();
        assert_eq!(found.id, staff.id);
        assert_eq!(found.role, StaffRole::Cashier);

        repo.set_active(&staff.id, false).await.unwrap();
        let found = repo.get_by_id(&staff.id).await.unwrap().unwrap();
        assert!(!found.is_active);
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.staff();

        repo.create("otieno", None, StaffRole::Admin).await.unwrap();
        let err = repo.create("otieno", None, StaffRole::Cashier).await.unwrap_err();
        assert!(matches!(err, crate::DbError::UniqueViolation { .. }));
    }
}
