//! User accounts.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::persistence::{decode, Database, DbError};
use crate::security::PasswordHasher;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: String,
}

pub struct User<'a> {
    db: &'a dyn Database,
}

impl<'a> User<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// True when an account already uses this email.
    pub fn find_by_email(&self, email: &str) -> Result<bool, DbError> {
        let mut stmt = self.db.query("SELECT * FROM users WHERE email = :email");
        stmt.bind(":email", json!(email));
        stmt.single()?;
        Ok(stmt.row_count() > 0)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, DbError> {
        let mut stmt = self.db.query("SELECT * FROM users WHERE id = :id");
        stmt.bind(":id", json!(id));
        stmt.single()?.map(decode).transpose()
    }

    /// Insert a new account; `password_hash` must already be hashed.
    pub fn register(&self, name: &str, email: &str, password_hash: &str) -> Result<Option<i64>, DbError> {
        let mut stmt = self
            .db
            .query("INSERT INTO users (name, email, password) VALUES (:name, :email, :password)");
        stmt.bind(":name", json!(name));
        stmt.bind(":email", json!(email));
        stmt.bind(":password", json!(password_hash));
        stmt.execute()?;
        Ok(stmt.last_insert_id())
    }

    /// The account matching the credentials, if any.
    pub fn login(
        &self,
        email: &str,
        password: &str,
        hasher: &dyn PasswordHasher,
    ) -> Result<Option<UserRecord>, DbError> {
        let mut stmt = self.db.query("SELECT * FROM users WHERE email = :email");
        stmt.bind(":email", json!(email));
        let Some(row) = stmt.single()? else {
            return Ok(None);
        };
        let user: UserRecord = decode(row)?;
        Ok(hasher.verify(password, &user.password).then_some(user))
    }
}
