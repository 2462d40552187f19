use crate::models::{MessageRow, ProfileRow, UserRow};
use crate::{Database, DbError, DbResult};
use chrono::Utc;
use rusqlite::Connection;

impl Database {
    // -- Users --

    /// Insert a new user. `password_hash` is the argon2 PHC string, hashed
    /// by the caller. Both account timestamps start at the creation instant:
    /// registration doubles as the first authentication.
    pub fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
        phone: &str,
    ) -> DbResult<UserRow> {
        let now = now();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, password, first_name, last_name, phone, joined_at, last_login_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                rusqlite::params![username, password_hash, first_name, last_name, phone, now],
            )
            .map_err(map_unique_violation)?;

            Ok(UserRow {
                username: username.to_string(),
                password: password_hash.to_string(),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                phone: phone.to_string(),
                joined_at: now.clone(),
                last_login_at: now.clone(),
            })
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> DbResult<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    /// Stamp `last_login_at` with the current instant.
    pub fn touch_login(&self, username: &str) -> DbResult<()> {
        let now = now();
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET last_login_at = ?2 WHERE username = ?1",
                rusqlite::params![username, now],
            )?;
            Ok(())
        })
    }

    pub fn list_users(&self) -> DbResult<Vec<ProfileRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT username, first_name, last_name, phone FROM users ORDER BY username",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(ProfileRow {
                        username: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        phone: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Messages --

    /// Insert a message with `read_at` null and `sent_at` = now. The id is
    /// assigned by SQLite (AUTOINCREMENT, monotonic). A sender or recipient
    /// unknown to the users table trips the foreign key and surfaces as
    /// `UnknownRecipient`; nothing is persisted in that case.
    pub fn insert_message(&self, from: &str, to: &str, body: &str) -> DbResult<MessageRow> {
        let now = now();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (from_username, to_username, body, sent_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![from, to, body, now],
            )
            .map_err(map_fk_violation)?;

            Ok(MessageRow {
                id: conn.last_insert_rowid(),
                from_username: from.to_string(),
                to_username: to.to_string(),
                body: body.to_string(),
                sent_at: now.clone(),
                read_at: None,
            })
        })
    }

    pub fn get_message(&self, id: i64) -> DbResult<Option<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, from_username, to_username, body, sent_at, read_at
                 FROM messages WHERE id = ?1",
            )?;

            stmt.query_row([id], message_from_row).optional()
        })
    }

    /// Fetch a message with both parties' profiles in one query.
    /// Returns (message, sender profile, recipient profile).
    pub fn get_message_with_parties(
        &self,
        id: i64,
    ) -> DbResult<Option<(MessageRow, ProfileRow, ProfileRow)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.from_username, m.to_username, m.body, m.sent_at, m.read_at,
                        f.first_name, f.last_name, f.phone,
                        t.first_name, t.last_name, t.phone
                 FROM messages m
                 JOIN users f ON m.from_username = f.username
                 JOIN users t ON m.to_username = t.username
                 WHERE m.id = ?1",
            )?;

            stmt.query_row([id], |row| {
                let message = message_from_row(row)?;
                let from_user = ProfileRow {
                    username: message.from_username.clone(),
                    first_name: row.get(6)?,
                    last_name: row.get(7)?,
                    phone: row.get(8)?,
                };
                let to_user = ProfileRow {
                    username: message.to_username.clone(),
                    first_name: row.get(9)?,
                    last_name: row.get(10)?,
                    phone: row.get(11)?,
                };
                Ok((message, from_user, to_user))
            })
            .optional()
        })
    }

    /// Overwrite `read_at` unconditionally. This is the single place the
    /// read-state transition is written; switching to first-write-wins
    /// would change only this statement.
    pub fn set_read(&self, id: i64, read_at: &str) -> DbResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE messages SET read_at = ?2 WHERE id = ?1",
                rusqlite::params![id, read_at],
            )?;
            Ok(())
        })
    }

    /// Messages addressed to `username`, oldest first, each paired with the
    /// sender's profile (JOIN avoids an N+1 lookup).
    pub fn list_by_recipient(&self, username: &str) -> DbResult<Vec<(MessageRow, ProfileRow)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.from_username, m.to_username, m.body, m.sent_at, m.read_at,
                        u.first_name, u.last_name, u.phone
                 FROM messages m
                 JOIN users u ON m.from_username = u.username
                 WHERE m.to_username = ?1
                 ORDER BY m.sent_at ASC, m.id ASC",
            )?;

            let rows = stmt
                .query_map([username], |row| {
                    let message = message_from_row(row)?;
                    let peer = ProfileRow {
                        username: message.from_username.clone(),
                        first_name: row.get(6)?,
                        last_name: row.get(7)?,
                        phone: row.get(8)?,
                    };
                    Ok((message, peer))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Messages sent by `username`, oldest first, paired with the
    /// recipient's profile.
    pub fn list_by_sender(&self, username: &str) -> DbResult<Vec<(MessageRow, ProfileRow)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.from_username, m.to_username, m.body, m.sent_at, m.read_at,
                        u.first_name, u.last_name, u.phone
                 FROM messages m
                 JOIN users u ON m.to_username = u.username
                 WHERE m.from_username = ?1
                 ORDER BY m.sent_at ASC, m.id ASC",
            )?;

            let rows = stmt
                .query_map([username], |row| {
                    let message = message_from_row(row)?;
                    let peer = ProfileRow {
                        username: message.to_username.clone(),
                        first_name: row.get(6)?,
                        last_name: row.get(7)?,
                        phone: row.get(8)?,
                    };
                    Ok((message, peer))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

fn message_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<MessageRow, rusqlite::Error> {
    Ok(MessageRow {
        id: row.get(0)?,
        from_username: row.get(1)?,
        to_username: row.get(2)?,
        body: row.get(3)?,
        sent_at: row.get(4)?,
        read_at: row.get(5)?,
    })
}

fn query_user_by_username(conn: &Connection, username: &str) -> DbResult<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT username, password, first_name, last_name, phone, joined_at, last_login_at
         FROM users WHERE username = ?1",
    )?;

    stmt.query_row([username], |row| {
        Ok(UserRow {
            username: row.get(0)?,
            password: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            phone: row.get(4)?,
            joined_at: row.get(5)?,
            last_login_at: row.get(6)?,
        })
    })
    .optional()
}

fn map_unique_violation(err: rusqlite::Error) -> DbError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            DbError::DuplicateUsername
        }
        _ => DbError::Sqlite(err),
    }
}

fn map_fk_violation(err: rusqlite::Error) -> DbError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            DbError::UnknownRecipient
        }
        _ => DbError::Sqlite(err),
    }
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> DbResult<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> DbResult<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with_users() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_user("alice", "hash-a", "Alice", "Anders", "+15550001111")
            .unwrap();
        db.create_user("bob", "hash-b", "Bob", "Baker", "+15550002222")
            .unwrap();
        db
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let db = db_with_users();
        let err = db
            .create_user("alice", "other-hash", "Alice", "Again", "+15550009999")
            .unwrap_err();
        assert!(matches!(err, DbError::DuplicateUsername));

        // the original row is untouched
        let row = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(row.password, "hash-a");
    }

    #[test]
    fn message_ids_are_assigned_in_order() {
        let db = db_with_users();
        let m1 = db.insert_message("alice", "bob", "first").unwrap();
        let m2 = db.insert_message("bob", "alice", "second").unwrap();
        assert!(m2.id > m1.id);
        assert!(m1.read_at.is_none());
    }

    #[test]
    fn unknown_recipient_persists_nothing() {
        let db = db_with_users();
        let err = db.insert_message("alice", "ghost", "hello?").unwrap_err();
        assert!(matches!(err, DbError::UnknownRecipient));
        assert!(db.list_by_sender("alice").unwrap().is_empty());
    }

    #[test]
    fn set_read_overwrites_previous_timestamp() {
        let db = db_with_users();
        let m = db.insert_message("alice", "bob", "hi").unwrap();

        db.set_read(m.id, "2026-01-01T10:00:00+00:00").unwrap();
        db.set_read(m.id, "2026-01-02T10:00:00+00:00").unwrap();

        let row = db.get_message(m.id).unwrap().unwrap();
        assert_eq!(row.read_at.as_deref(), Some("2026-01-02T10:00:00+00:00"));
    }

    #[test]
    fn recipient_listing_is_oldest_first_with_sender_profile() {
        let db = db_with_users();
        db.create_user("carol", "hash-c", "Carol", "Chen", "+15550003333")
            .unwrap();

        db.insert_message("alice", "bob", "one").unwrap();
        db.insert_message("carol", "bob", "two").unwrap();
        db.insert_message("bob", "alice", "not for bob").unwrap();

        let inbox = db.list_by_recipient("bob").unwrap();
        let bodies: Vec<&str> = inbox.iter().map(|(m, _)| m.body.as_str()).collect();
        assert_eq!(bodies, ["one", "two"]);

        let (_, sender) = &inbox[1];
        assert_eq!(sender.username, "carol");
        assert_eq!(sender.first_name, "Carol");
    }

    #[test]
    fn touch_login_moves_last_login_only() {
        let db = db_with_users();
        let before = db.get_user_by_username("alice").unwrap().unwrap();

        db.touch_login("alice").unwrap();

        let after = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(after.joined_at, before.joined_at);
        assert!(after.last_login_at >= before.last_login_at);
    }
}
