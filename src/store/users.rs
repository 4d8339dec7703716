//! User account queries

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{expect_affected, invalid_column, Database, StoreResult};
use crate::auth::models::UserRole;
use crate::models::{User, UserStats, UserStatus};

const USER_COLUMNS: &str =
    "id, full_name, email, password_hash, role, status, created_at, updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(4)?;
    let status: String = row.get(5)?;
    Ok(User {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: UserRole::parse(&role).ok_or_else(|| invalid_column(4, role.clone()))?,
        status: UserStatus::parse(&status).ok_or_else(|| invalid_column(5, status.clone()))?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn query_users(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> StoreResult<Vec<User>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let users = stmt
        .query_map(params, user_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

fn select_user(conn: &Connection, id: &str) -> StoreResult<User> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], user_from_row)?)
}

impl Database {
    pub async fn insert_user(&self, user: User) -> StoreResult<User> {
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO users
                 (id, full_name, email, password_hash, role, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    &user.id,
                    &user.full_name,
                    &user.email,
                    &user.password_hash,
                    user.role.as_str(),
                    user.status.as_str(),
                    &user.created_at,
                    &user.updated_at,
                ],
            )?;
            Ok(user)
        })
        .await
    }

    pub async fn user_by_id(&self, id: &str) -> StoreResult<User> {
        let id = id.to_string();
        self.call(move |conn| select_user(conn, &id)).await
    }

    pub async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = email.to_string();
        self.call(move |conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
            Ok(conn
                .query_row(&sql, params![email], user_from_row)
                .optional()?)
        })
        .await
    }

    /// Oldest first, so the approval queue is worked in arrival order.
    pub async fn users_by_status(&self, status: UserStatus) -> StoreResult<Vec<User>> {
        self.call(move |conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users WHERE status = ?1 ORDER BY created_at ASC"
            );
            query_users(conn, &sql, params![status.as_str()])
        })
        .await
    }

    pub async fn all_users(&self) -> StoreResult<Vec<User>> {
        self.call(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
            query_users(conn, &sql, [])
        })
        .await
    }

    pub async fn set_user_status(
        &self,
        id: &str,
        status: UserStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let id = id.to_string();
        self.call(move |conn| {
            let changes = conn.execute(
                "UPDATE users SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), now, id],
            )?;
            expect_affected(changes)
        })
        .await
    }

    /// Replace name, email and role; status and password are untouched.
    pub async fn update_user(
        &self,
        id: &str,
        full_name: String,
        email: String,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> StoreResult<User> {
        let id = id.to_string();
        self.call(move |conn| {
            let changes = conn.execute(
                "UPDATE users SET full_name = ?1, email = ?2, role = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![full_name, email, role.as_str(), now, id],
            )?;
            expect_affected(changes)?;
            select_user(conn, &id)
        })
        .await
    }

    pub async fn delete_user(&self, id: &str) -> StoreResult<()> {
        let id = id.to_string();
        self.call(move |conn| {
            let changes = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
            expect_affected(changes)
        })
        .await
    }

    pub async fn user_stats(&self) -> StoreResult<UserStats> {
        self.call(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0)
                 FROM users",
                [],
                |row| {
                    Ok(UserStats {
                        total_users: row.get(0)?,
                        active_users: row.get(1)?,
                        pending_users: row.get(2)?,
                    })
                },
            )?)
        })
        .await
    }

    pub async fn count_users_with_status(&self, status: UserStatus) -> StoreResult<i64> {
        self.call(move |conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM users WHERE status = ?1",
                params![status.as_str()],
                |row| row.get(0),
            )?)
        })
        .await
    }

    /// Active accounts holding `role`.
    pub async fn count_active_with_role(&self, role: UserRole) -> StoreResult<i64> {
        self.call(move |conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM users WHERE role = ?1 AND status = 'active'",
                params![role.as_str()],
                |row| row.get(0),
            )?)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    fn user(id: &str, email: &str, role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: id.to_string(),
            full_name: format!("User {id}"),
            email: email.to_string(),
            password_hash: "$2b$04$digest".to_string(),
            role,
            status: UserStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = Database::open_in_memory().unwrap();
        db.insert_user(user("u1", "a@x.com", UserRole::Student))
            .await
            .unwrap();

        let by_email = db.user_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, "u1");
        assert_eq!(by_email.status, UserStatus::Pending);
        assert_eq!(by_email.password_hash, "$2b$04$digest");

        assert!(db.user_by_email("b@x.com").await.unwrap().is_none());
        assert!(matches!(
            db.user_by_id("missing").await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let db = Database::open_in_memory().unwrap();
        db.insert_user(user("u1", "a@x.com", UserRole::Student))
            .await
            .unwrap();

        let dup = db
            .insert_user(user("u2", "a@x.com", UserRole::Instructor))
            .await;
        assert!(matches!(dup, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_status_transitions_and_stats() {
        let db = Database::open_in_memory().unwrap();
        for (id, email) in [("u1", "a@x.com"), ("u2", "b@x.com"), ("u3", "c@x.com")] {
            db.insert_user(user(id, email, UserRole::Student))
                .await
                .unwrap();
        }

        db.set_user_status("u1", UserStatus::Active, Utc::now())
            .await
            .unwrap();
        db.set_user_status("u2", UserStatus::Rejected, Utc::now())
            .await
            .unwrap();
        assert!(matches!(
            db.set_user_status("nope", UserStatus::Active, Utc::now())
                .await,
            Err(StoreError::NotFound)
        ));

        let stats = db.user_stats().await.unwrap();
        assert_eq!(
            stats,
            UserStats {
                total_users: 3,
                active_users: 1,
                pending_users: 1,
            }
        );

        let pending = db.users_by_status(UserStatus::Pending).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "u3");
        assert_eq!(
            db.count_users_with_status(UserStatus::Pending).await.unwrap(),
            1
        );
        assert_eq!(db.all_users().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = Database::open_in_memory().unwrap();
        db.insert_user(user("u1", "a@x.com", UserRole::Student))
            .await
            .unwrap();
        db.insert_user(user("u2", "b@x.com", UserRole::Student))
            .await
            .unwrap();

        let updated = db
            .update_user(
                "u1",
                "Renamed".to_string(),
                "new@x.com".to_string(),
                UserRole::Instructor,
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(updated.full_name, "Renamed");
        assert_eq!(updated.role, UserRole::Instructor);
        assert_eq!(updated.status, UserStatus::Pending);

        let clash = db
            .update_user(
                "u2",
                "B".to_string(),
                "new@x.com".to_string(),
                UserRole::Student,
                Utc::now(),
            )
            .await;
        assert!(matches!(clash, Err(StoreError::Conflict(_))));

        assert_eq!(db.count_active_with_role(UserRole::Instructor).await.unwrap(), 0);
        db.set_user_status("u1", UserStatus::Active, Utc::now())
            .await
            .unwrap();
        assert_eq!(db.count_active_with_role(UserRole::Instructor).await.unwrap(), 1);
        assert_eq!(db.count_active_with_role(UserRole::Admin).await.unwrap(), 0);

        db.delete_user("u1").await.unwrap();
        assert!(matches!(
            db.delete_user("u1").await,
            Err(StoreError::NotFound)
        ));
    }
}
