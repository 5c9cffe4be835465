//! User Storage
//! Mission: Securely store and manage staff accounts with SQLite

use crate::auth::models::{Role, User, UserStatus};
use crate::auth::password::{dummy_verify, hash_password, verify_password};
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};

/// Staff account storage with SQLite backend
pub struct UserStore {
    db_path: String,
    bcrypt_cost: u32,
}

impl UserStore {
    /// Create a new user store and initialize the schema.
    pub fn new(db_path: &str, bcrypt_cost: u32) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
            bcrypt_cost,
        };
        store.init_db()?;
        Ok(store)
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path).context("Failed to open user database")
    }

    fn init_db(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'Active',
                last_login_at TEXT,
                created_at TEXT NOT NULL,
                created_by INTEGER,
                updated_at TEXT,
                updated_by INTEGER
            );
            CREATE INDEX IF NOT EXISTS ix_users_username ON users(username);
            CREATE INDEX IF NOT EXISTS ix_users_role ON users(role);
            CREATE INDEX IF NOT EXISTS ix_users_status ON users(status);",
        )?;

        self.create_default_manager(&conn)?;

        Ok(())
    }

    /// Seed a Manager account when the table is empty, for initial setup.
    fn create_default_manager(&self, conn: &Connection) -> Result<()> {
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .context("Failed to count users")?;

        if count == 0 {
            let password_hash =
                hash_password("manager123", self.bcrypt_cost).context("Failed to hash password")?;

            conn.execute(
                "INSERT INTO users (username, password_hash, role, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    "manager",
                    password_hash,
                    Role::Manager.as_str(),
                    UserStatus::Active.as_str(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .context("Failed to insert default manager")?;

            info!("🔐 Default manager created (username: manager, password: manager123)");
            warn!("⚠️  CHANGE DEFAULT PASSWORD IN PRODUCTION!");
        }

        Ok(())
    }

    fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        let role_str: String = row.get(3)?;
        let status_str: String = row.get(4)?;
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            role: Role::from_str(&role_str).unwrap_or(Role::Housekeeping),
            status: UserStatus::from_str(&status_str).unwrap_or(UserStatus::Locked),
            last_login_at: row.get(5)?,
            created_at: row.get(6)?,
            created_by: row.get(7)?,
            updated_at: row.get(8)?,
            updated_by: row.get(9)?,
        })
    }

    const USER_COLUMNS: &'static str = "id, username, password_hash, role, status, \
         last_login_at, created_at, created_by, updated_at, updated_by";

    pub fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.open()?;

        let user = conn
            .query_row(
                &format!(
                    "SELECT {} FROM users WHERE username = ?1",
                    Self::USER_COLUMNS
                ),
                params![username],
                Self::map_user,
            )
            .optional()?;

        Ok(user)
    }

    pub fn get_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let conn = self.open()?;

        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", Self::USER_COLUMNS),
                params![user_id],
                Self::map_user,
            )
            .optional()?;

        Ok(user)
    }

    pub fn count_users(&self) -> Result<i64> {
        let conn = self.open()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Check a username/password pair. Returns the user on a match; the
    /// caller decides what a Locked account means. A missing username
    /// still pays for one hash verification so the failure mode does not
    /// reveal whether the username exists.
    pub fn verify_login(&self, username: &str, password: &str) -> Result<Option<User>> {
        match self.get_by_username(username)? {
            Some(user) => {
                let valid = verify_password(password, &user.password_hash)
                    .context("Failed to verify password")?;
                Ok(valid.then_some(user))
            }
            None => {
                dummy_verify(password);
                Ok(None)
            }
        }
    }

    /// Create a new user with a freshly hashed password.
    pub fn create_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
        created_by: Option<i64>,
    ) -> Result<User> {
        let password_hash =
            hash_password(password, self.bcrypt_cost).context("Failed to hash password")?;

        let conn = self.open()?;
        conn.execute(
            "INSERT INTO users (username, password_hash, role, status, created_at, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                username,
                password_hash,
                role.as_str(),
                UserStatus::Active.as_str(),
                Utc::now().to_rfc3339(),
                created_by,
            ],
        )
        .context("Failed to insert user")?;

        let id = conn.last_insert_rowid();

        info!("✅ Created user: {} ({})", username, role.as_str());

        self.get_by_id(id)?
            .context("User vanished immediately after insert")
    }

    /// List users, optionally filtered by a username substring.
    pub fn list_users(&self, q: Option<&str>, skip: i64, limit: i64) -> Result<Vec<User>> {
        let conn = self.open()?;

        let pattern = q.map(|q| format!("%{}%", q));
        let sql = format!(
            "SELECT {} FROM users
             WHERE (?1 IS NULL OR username LIKE ?1)
             ORDER BY id DESC LIMIT ?2 OFFSET ?3",
            Self::USER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let users = stmt
            .query_map(params![pattern, limit, skip], Self::map_user)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Update username, role and/or status. Fields left as None are kept.
    pub fn update_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        role: Option<Role>,
        status: Option<UserStatus>,
        updated_by: i64,
    ) -> Result<Option<User>> {
        let Some(user) = self.get_by_id(user_id)? else {
            return Ok(None);
        };

        let conn = self.open()?;
        conn.execute(
            "UPDATE users SET username = ?1, role = ?2, status = ?3,
                              updated_at = ?4, updated_by = ?5
             WHERE id = ?6",
            params![
                username.unwrap_or(&user.username),
                role.unwrap_or(user.role).as_str(),
                status.unwrap_or(user.status).as_str(),
                Utc::now().to_rfc3339(),
                updated_by,
                user_id,
            ],
        )
        .context("Failed to update user")?;

        self.get_by_id(user_id)
    }

    /// Replace a user's password hash.
    pub fn set_password(&self, user_id: i64, password: &str, updated_by: i64) -> Result<bool> {
        let password_hash =
            hash_password(password, self.bcrypt_cost).context("Failed to hash password")?;

        let conn = self.open()?;
        let rows = conn.execute(
            "UPDATE users SET password_hash = ?1, updated_at = ?2, updated_by = ?3 WHERE id = ?4",
            params![
                password_hash,
                Utc::now().to_rfc3339(),
                updated_by,
                user_id
            ],
        )?;

        Ok(rows > 0)
    }

    /// Deactivate (or reactivate) an account. Records are never deleted so
    /// the audit columns elsewhere keep their references.
    pub fn set_status(&self, user_id: i64, status: UserStatus, updated_by: i64) -> Result<bool> {
        let conn = self.open()?;
        let rows = conn.execute(
            "UPDATE users SET status = ?1, updated_at = ?2, updated_by = ?3 WHERE id = ?4",
            params![
                status.as_str(),
                Utc::now().to_rfc3339(),
                updated_by,
                user_id
            ],
        )?;

        if rows > 0 {
            info!("🔒 User {} set to {}", user_id, status.as_str());
        }

        Ok(rows > 0)
    }

    pub fn update_last_login(&self, user_id: i64) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "UPDATE users SET last_login_at = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), user_id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    const TEST_COST: u32 = 4;

    fn create_test_store() -> (UserStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        let store = UserStore::new(db_path, TEST_COST).unwrap();
        (store, temp_file)
    }

    #[test]
    fn test_default_manager_created() {
        let (store, _temp) = create_test_store();

        let manager = store.get_by_username("manager").unwrap();
        assert!(manager.is_some());

        let manager = manager.unwrap();
        assert_eq!(manager.role, Role::Manager);
        assert_eq!(manager.status, UserStatus::Active);
    }

    #[test]
    fn test_login_verification() {
        let (store, _temp) = create_test_store();

        // Correct password
        assert!(store.verify_login("manager", "manager123").unwrap().is_some());

        // Incorrect password
        assert!(store.verify_login("manager", "wrongpassword").unwrap().is_none());

        // Non-existent user
        assert!(store.verify_login("nonexistent", "password").unwrap().is_none());
    }

    #[test]
    fn test_create_and_retrieve_user() {
        let (store, _temp) = create_test_store();

        let created = store
            .create_user("frontdesk", "password123", Role::Receptionist, Some(1))
            .unwrap();
        assert_eq!(created.username, "frontdesk");
        assert_eq!(created.role, Role::Receptionist);
        assert_eq!(created.created_by, Some(1));

        let retrieved = store.get_by_username("frontdesk").unwrap().unwrap();
        assert_eq!(retrieved.id, created.id);
        assert_eq!(retrieved.role, Role::Receptionist);
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let (store, _temp) = create_test_store();

        store
            .create_user("frontdesk", "password123", Role::Receptionist, None)
            .unwrap();
        let duplicate = store.create_user("frontdesk", "otherpass", Role::Housekeeping, None);
        assert!(duplicate.is_err());
    }

    #[test]
    fn test_same_password_stored_with_distinct_salts() {
        let (store, _temp) = create_test_store();

        let first = store
            .create_user("alice", "sharedpass", Role::Receptionist, None)
            .unwrap();
        let second = store
            .create_user("bob", "sharedpass", Role::Housekeeping, None)
            .unwrap();

        assert_ne!(first.password_hash, second.password_hash);
        assert!(store.verify_login("alice", "sharedpass").unwrap().is_some());
        assert!(store.verify_login("bob", "sharedpass").unwrap().is_some());
    }

    #[test]
    fn test_list_users_with_filter() {
        let (store, _temp) = create_test_store();

        store
            .create_user("frontdesk1", "pass123", Role::Receptionist, None)
            .unwrap();
        store
            .create_user("cleaner1", "pass123", Role::Housekeeping, None)
            .unwrap();

        let all = store.list_users(None, 0, 50).unwrap();
        assert_eq!(all.len(), 3); // manager + frontdesk1 + cleaner1

        let filtered = store.list_users(Some("front"), 0, 50).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].username, "frontdesk1");
    }

    #[test]
    fn test_update_user_fields() {
        let (store, _temp) = create_test_store();

        let user = store
            .create_user("temp", "pass123", Role::Housekeeping, None)
            .unwrap();

        let updated = store
            .update_user(user.id, Some("renamed"), Some(Role::Accountant), None, 1)
            .unwrap()
            .unwrap();

        assert_eq!(updated.username, "renamed");
        assert_eq!(updated.role, Role::Accountant);
        assert_eq!(updated.status, UserStatus::Active);
        assert!(updated.updated_at.is_some());

        assert!(store.update_user(9999, None, None, None, 1).unwrap().is_none());
    }

    #[test]
    fn test_deactivation_preserves_record() {
        let (store, _temp) = create_test_store();

        let user = store
            .create_user("leaver", "pass123", Role::Receptionist, None)
            .unwrap();

        assert!(store.set_status(user.id, UserStatus::Locked, 1).unwrap());

        // Record still present, status flipped
        let kept = store.get_by_id(user.id).unwrap().unwrap();
        assert_eq!(kept.status, UserStatus::Locked);
        assert_eq!(kept.username, "leaver");
    }

    #[test]
    fn test_set_password_rotates_hash() {
        let (store, _temp) = create_test_store();

        let user = store
            .create_user("rotator", "oldpass1", Role::Receptionist, None)
            .unwrap();

        assert!(store.set_password(user.id, "newpass1", 1).unwrap());

        assert!(store.verify_login("rotator", "oldpass1").unwrap().is_none());
        assert!(store.verify_login("rotator", "newpass1").unwrap().is_some());
    }

    #[test]
    fn test_update_last_login() {
        let (store, _temp) = create_test_store();

        let manager = store.get_by_username("manager").unwrap().unwrap();
        assert!(manager.last_login_at.is_none());

        store.update_last_login(manager.id).unwrap();

        let manager = store.get_by_username("manager").unwrap().unwrap();
        assert!(manager.last_login_at.is_some());
    }
}
