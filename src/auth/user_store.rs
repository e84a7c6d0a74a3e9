//! User Storage
//! Mission: Persist user accounts in SQLite

use crate::auth::models::{Role, User};
use chrono::{DateTime, Utc};
use parking_lot::Mutex; // Faster than std::sync::Mutex
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use std::sync::Arc;
use tracing::{info, warn};

const SCHEMA_SQL: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'USER',
    active INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, active, created_at, updated_at";

#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    #[error("email already registered: {0}")]
    EmailTaken(String),
    #[error("user not found: {0}")]
    NotFound(i64),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, UserStoreError>;

/// Fields for a new account; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
}

/// Fields replaced by an update; `password_hash` is kept when `None`
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
}

/// User storage with SQLite backend
pub struct UserStore {
    conn: Arc<Mutex<Connection>>,
}

impl UserStore {
    /// Open (or create) the store at `db_path` and initialize the schema
    pub fn new(db_path: &str) -> StoreResult<Self> {
        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    /// Store backed by a private in-memory database
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an admin account if the store is empty. Returns true when one was created.
    pub fn ensure_admin(&self, name: &str, email: &str, password_hash: &str) -> StoreResult<bool> {
        let users: i64 = {
            let conn = self.conn.lock();
            conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?
        };

        if users > 0 {
            return Ok(false);
        }

        let created = self.create_user(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role: Role::Admin,
            active: true,
        });

        match created {
            Ok(_) => {
                info!("🔐 Default admin user created: {}", email);
                Ok(true)
            }
            Err(UserStoreError::EmailTaken(_)) => {
                warn!("Admin seed skipped, {} is already registered", email);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Get user by email
    pub fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let conn = self.conn.lock();
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Get user by id
    pub fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let conn = self.conn.lock();
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let conn = self.conn.lock();
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
            params![email],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// List all users ordered by id
    pub fn list_users(&self) -> StoreResult<Vec<User>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Create a new user
    pub fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let now = Utc::now();
        let conn = self.conn.lock();

        let inserted = conn.execute(
            "INSERT INTO users (name, email, password_hash, role, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                new_user.name,
                new_user.email,
                new_user.password_hash,
                new_user.role.as_str(),
                new_user.active,
                now.to_rfc3339(),
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(UserStoreError::EmailTaken(new_user.email));
            }
            Err(e) => return Err(e.into()),
        }

        let user = User {
            id: conn.last_insert_rowid(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            active: new_user.active,
            created_at: now,
            updated_at: now,
        };

        info!("✅ Created user: {} ({})", user.email, user.role);
        Ok(user)
    }

    /// Replace name, email and optionally the password hash of an existing user
    pub fn update_user(&self, id: i64, update: UserUpdate) -> StoreResult<User> {
        let mut user = self.find_by_id(id)?.ok_or(UserStoreError::NotFound(id))?;

        if update.email != user.email && self.email_exists(&update.email)? {
            return Err(UserStoreError::EmailTaken(update.email));
        }

        user.name = update.name;
        user.email = update.email;
        if let Some(password_hash) = update.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = Utc::now();

        let conn = self.conn.lock();
        let updated = conn.execute(
            "UPDATE users SET name = ?1, email = ?2, password_hash = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                user.name,
                user.email,
                user.password_hash,
                user.updated_at.to_rfc3339(),
                id,
            ],
        );

        match updated {
            Ok(0) => Err(UserStoreError::NotFound(id)),
            Ok(_) => Ok(user),
            Err(e) if is_unique_violation(&e) => Err(UserStoreError::EmailTaken(user.email)),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a user by id. Returns false if no such user existed.
    pub fn delete_user(&self, id: i64) -> StoreResult<bool> {
        let conn = self.conn.lock();
        let rows_affected = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;

        if rows_affected == 0 {
            warn!("Delete requested for missing user {}", id);
            return Ok(false);
        }

        info!("🗑️  Deleted user: {}", id);
        Ok(true)
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role_str: String = row.get(4)?;
    let role = Role::parse(&role_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            Type::Text,
            format!("unknown role {role_str:?}").into(),
        )
    })?;

    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role,
        active: row.get(5)?,
        created_at: parse_timestamp(row, 6)?,
        updated_at: parse_timestamp(row, 7)?,
    })
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
