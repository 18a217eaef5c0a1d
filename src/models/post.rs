//! Posts written by users.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::persistence::{decode, Database, DbError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub created_at: String,
}

/// A post joined with its author's name, for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub created_at: String,
    pub author: String,
}

pub struct Post<'a> {
    db: &'a dyn Database,
}

impl<'a> Post<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// Every post, newest first.
    pub fn all(&self) -> Result<Vec<PostSummary>, DbError> {
        let mut stmt = self.db.query(
            "SELECT posts.id, posts.user_id, posts.title, posts.body, posts.created_at, \
                    users.name AS author \
             FROM posts INNER JOIN users ON users.id = posts.user_id \
             ORDER BY posts.created_at DESC, posts.id DESC",
        );
        stmt.result_set()?.into_iter().map(decode).collect()
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, DbError> {
        let mut stmt = self.db.query("SELECT * FROM posts WHERE id = :id");
        stmt.bind(":id", json!(id));
        stmt.single()?.map(decode).transpose()
    }

    pub fn add(&self, user_id: i64, title: &str, body: &str) -> Result<Option<i64>, DbError> {
        let mut stmt = self
            .db
            .query("INSERT INTO posts (user_id, title, body) VALUES (:user_id, :title, :body)");
        stmt.bind(":user_id", json!(user_id));
        stmt.bind(":title", json!(title));
        stmt.bind(":body", json!(body));
        stmt.execute()?;
        Ok(stmt.last_insert_id())
    }

    /// Returns true when a row was updated.
    pub fn update(&self, id: i64, title: &str, body: &str) -> Result<bool, DbError> {
        let mut stmt = self
            .db
            .query("UPDATE posts SET title = :title, body = :body WHERE id = :id");
        stmt.bind(":id", json!(id));
        stmt.bind(":title", json!(title));
        stmt.bind(":body", json!(body));
        stmt.execute()?;
        Ok(stmt.row_count() > 0)
    }

    /// Returns true when a row was deleted.
    pub fn delete(&self, id: i64) -> Result<bool, DbError> {
        let mut stmt = self.db.query("DELETE FROM posts WHERE id = :id");
        stmt.bind(":id", json!(id));
        stmt.execute()?;
        Ok(stmt.row_count() > 0)
    }
}
