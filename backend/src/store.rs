//! SQLite persistence for users and work logs.

use std::path::Path;
use std::sync::Mutex;

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{Error, Result};
use crate::models::{Role, User, WorkLogEntry, WorkLogStatus};

/// SQLite-backed store. The connection mutex serializes writes; callers get
/// at-most-one in-flight mutation per row, which is the transaction boundary
/// the domain services rely on.
pub struct Store {
    conn: Mutex<Connection>,
}

/// Fields a user is allowed to change after registration. Username, email
/// and role are fixed at creation.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    pub position: String,
    pub hourly_rate: f64,
}

pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub department: String,
    pub position: String,
    pub hourly_rate: f64,
}

impl Store {
    pub fn open(database_url: &str) -> Result<Self> {
        let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::Internal(format!("IO error: {}", e)))?;
            }
            Connection::open(path)?
        };

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                role TEXT NOT NULL,
                department TEXT NOT NULL,
                position TEXT NOT NULL,
                hourly_rate REAL NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS work_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                hours_worked REAL NOT NULL,
                remarks TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'PENDING',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (user_id, date),
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_work_logs_user_date ON work_logs(user_id, date)",
            [],
        )?;

        tracing::info!("Store initialized with database: {}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::Internal(format!("Database lock poisoned: {}", e)))
    }

    // -- users --

    pub fn create_user(&self, new_user: NewUser) -> Result<User> {
        let conn = self.lock()?;
        let now = Utc::now();

        // Checked up front so the caller gets the field-specific message.
        let username_taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
            params![new_user.username],
            |row| row.get(0),
        )?;
        if username_taken {
            return Err(Error::Duplicate("Username is already taken".to_string()));
        }

        let email_taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
            params![new_user.email],
            |row| row.get(0),
        )?;
        if email_taken {
            return Err(Error::Duplicate("Email is already registered".to_string()));
        }

        conn.execute(
            "INSERT INTO users (username, email, password_hash, first_name, last_name,
                                role, department, position, hourly_rate, enabled,
                                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10, ?10)",
            params![
                new_user.username,
                new_user.email,
                new_user.password_hash,
                new_user.first_name,
                new_user.last_name,
                new_user.role.as_str(),
                new_user.department,
                new_user.position,
                new_user.hourly_rate,
                now.to_rfc3339(),
            ],
        )?;
        let id = conn.last_insert_rowid();

        tracing::info!(username = %new_user.username, id, "created user");

        Ok(User {
            id,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            role: new_user.role,
            department: new_user.department,
            position: new_user.position,
            hourly_rate: new_user.hourly_rate,
            enabled: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("{} WHERE id = ?1", SELECT_USER),
            params![id],
            row_to_user,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("{} WHERE username = ?1", SELECT_USER),
            params![username],
            row_to_user,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_USER))?;
        let users = stmt
            .query_map([], row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    pub fn exists_by_username(&self, username: &str) -> Result<bool> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
            params![username],
            |row| row.get(0),
        )
        .map_err(Into::into)
    }

    pub fn exists_by_email(&self, email: &str) -> Result<bool> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
            params![email],
            |row| row.get(0),
        )
        .map_err(Into::into)
    }

    pub fn update_user(&self, id: i64, update: &UserUpdate) -> Result<User> {
        {
            let conn = self.lock()?;
            let changed = conn.execute(
                "UPDATE users SET first_name = ?1, last_name = ?2, department = ?3,
                                  position = ?4, hourly_rate = ?5, updated_at = ?6
                 WHERE id = ?7",
                params![
                    update.first_name,
                    update.last_name,
                    update.department,
                    update.position,
                    update.hourly_rate,
                    Utc::now().to_rfc3339(),
                    id,
                ],
            )?;
            if changed == 0 {
                return Err(user_not_found(id));
            }
        }
        self.find_user_by_id(id)?.ok_or_else(|| user_not_found(id))
    }

    pub fn set_user_enabled(&self, id: i64, enabled: bool) -> Result<User> {
        {
            let conn = self.lock()?;
            let changed = conn.execute(
                "UPDATE users SET enabled = ?1, updated_at = ?2 WHERE id = ?3",
                params![enabled, Utc::now().to_rfc3339(), id],
            )?;
            if changed == 0 {
                return Err(user_not_found(id));
            }
        }
        self.find_user_by_id(id)?.ok_or_else(|| user_not_found(id))
    }

    pub fn delete_user(&self, id: i64) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM work_logs WHERE user_id = ?1", params![id])?;
        let changed = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(user_not_found(id));
        }
        tracing::info!(id, "deleted user");
        Ok(())
    }

    // -- work logs --

    pub fn insert_work_log(
        &self,
        user_id: i64,
        date: NaiveDate,
        hours_worked: f64,
        remarks: &str,
    ) -> Result<WorkLogEntry> {
        let conn = self.lock()?;
        let now = Utc::now();

        let result = conn.execute(
            "INSERT INTO work_logs (user_id, date, hours_worked, remarks, status,
                                    created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 'PENDING', ?5, ?5)",
            params![
                user_id,
                date.to_string(),
                hours_worked,
                remarks,
                now.to_rfc3339()
            ],
        );

        match result {
            Ok(_) => Ok(WorkLogEntry {
                id: conn.last_insert_rowid(),
                user_id,
                date,
                hours_worked,
                remarks: remarks.to_string(),
                status: WorkLogStatus::Pending,
                created_at: now,
                updated_at: now,
            }),
            Err(e) if is_unique_violation(&e) => Err(Error::Duplicate(format!(
                "Work log already exists for date {}",
                date
            ))),
            Err(e) => Err(e.into()),
        }
    }

    pub fn find_work_log(&self, id: i64) -> Result<Option<WorkLogEntry>> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("{} WHERE id = ?1", SELECT_WORK_LOG),
            params![id],
            row_to_work_log,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_work_logs_for_user(&self, user_id: i64) -> Result<Vec<WorkLogEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE user_id = ?1 ORDER BY date DESC",
            SELECT_WORK_LOG
        ))?;
        let entries = stmt
            .query_map(params![user_id], row_to_work_log)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn list_work_logs_between(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WorkLogEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE user_id = ?1 AND date >= ?2 AND date <= ?3 ORDER BY date DESC",
            SELECT_WORK_LOG
        ))?;
        let entries = stmt
            .query_map(
                params![user_id, start.to_string(), end.to_string()],
                row_to_work_log,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn update_work_log_content(
        &self,
        id: i64,
        hours_worked: f64,
        remarks: &str,
    ) -> Result<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE work_logs SET hours_worked = ?1, remarks = ?2, updated_at = ?3
             WHERE id = ?4",
            params![hours_worked, remarks, Utc::now().to_rfc3339(), id],
        )?;
        if changed == 0 {
            return Err(work_log_not_found(id));
        }
        Ok(())
    }

    pub fn update_work_log_status(&self, id: i64, status: WorkLogStatus) -> Result<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE work_logs SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), Utc::now().to_rfc3339(), id],
        )?;
        if changed == 0 {
            return Err(work_log_not_found(id));
        }
        Ok(())
    }
}

const SELECT_USER: &str = "SELECT id, username, email, password_hash, first_name, last_name, \
     role, department, position, hourly_rate, enabled, created_at, updated_at FROM users";

const SELECT_WORK_LOG: &str =
    "SELECT id, user_id, date, hours_worked, remarks, status, created_at, updated_at \
     FROM work_logs";

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let role_str: String = row.get(6)?;
    let created_at: String = row.get(11)?;
    let updated_at: String = row.get(12)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        role: Role::parse(&role_str).unwrap_or(Role::Employee),
        department: row.get(7)?,
        position: row.get(8)?,
        hourly_rate: row.get(9)?,
        enabled: row.get::<_, i64>(10)? != 0,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    })
}

fn row_to_work_log(row: &Row<'_>) -> rusqlite::Result<WorkLogEntry> {
    let date: String = row.get(2)?;
    let status_str: String = row.get(5)?;
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;
    Ok(WorkLogEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: date.parse().unwrap_or_default(),
        hours_worked: row.get(3)?,
        remarks: row.get(4)?,
        status: WorkLogStatus::parse(&status_str).unwrap_or(WorkLogStatus::Pending),
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    })
}

fn parse_timestamp(s: &str) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn user_not_found(id: i64) -> Error {
    Error::NotFound(format!("User not found with id: {}", id))
}

fn work_log_not_found(id: i64) -> Error {
    Error::NotFound(format!("Work log not found with id: {}", id))
}
