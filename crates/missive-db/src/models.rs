/// Database row types — these map directly to SQLite rows.
/// Distinct from the missive-types API models so the storage layer stays
/// independent of the wire format. Timestamps are RFC 3339 strings as
/// stored; the API layer parses them.

#[derive(Debug)]
pub struct UserRow {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub joined_at: String,
    pub last_login_at: String,
}

#[derive(Debug)]
pub struct MessageRow {
    pub id: i64,
    pub from_username: String,
    pub to_username: String,
    pub body: String,
    pub sent_at: String,
    pub read_at: Option<String>,
}

/// Public profile projection, credential material never selected.
pub struct ProfileRow {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}
