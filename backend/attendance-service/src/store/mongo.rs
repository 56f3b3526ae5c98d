/// MongoDB store backend
///
/// One collection per entity (`users`, `tokens`, `sessions`); documents are
/// independently read-modify-written, no cross-document transactions.
use crate::error::Result;
use crate::models::{Session, Token, User};
use crate::store::{SessionStore, TokenStore, UserStore};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures_util::TryStreamExt;
use mongodb::{Collection, Database};

fn assign_id(id: &mut String) {
    if id.is_empty() {
        *id = ObjectId::new().to_hex();
    }
}

pub struct MongoUserStore {
    collection: Collection<User>,
}

impl MongoUserStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .collection
            .find_one(doc! { "username": username })
            .await?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn save(&self, mut user: User) -> Result<User> {
        assign_id(&mut user.id);
        self.collection
            .replace_one(doc! { "_id": user.id.as_str() }, &user)
            .upsert(true)
            .await?;
        Ok(user)
    }
}

pub struct MongoTokenStore {
    collection: Collection<Token>,
}

impl MongoTokenStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("tokens"),
        }
    }
}

#[async_trait]
impl TokenStore for MongoTokenStore {
    async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<Option<Token>> {
        Ok(self
            .collection
            .find_one(doc! { "refresh_token": refresh_token })
            .await?)
    }

    async fn save(&self, mut token: Token) -> Result<Token> {
        assign_id(&mut token.id);
        self.collection
            .replace_one(doc! { "_id": token.id.as_str() }, &token)
            .upsert(true)
            .await?;
        Ok(token)
    }

    async fn revoke_all(&self, user_id: &str) -> Result<()> {
        self.collection
            .update_many(
                doc! { "user_id": user_id, "revoked": false },
                doc! { "$set": { "revoked": true } },
            )
            .await?;
        Ok(())
    }
}

pub struct MongoSessionStore {
    collection: Collection<Session>,
}

impl MongoSessionStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("sessions"),
        }
    }
}

#[async_trait]
impl SessionStore for MongoSessionStore {
    async fn find_active_by_user_id(&self, user_id: &str) -> Result<Vec<Session>> {
        let cursor = self
            .collection
            .find(doc! { "user_id": user_id, "active": true })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn save(&self, mut session: Session) -> Result<Session> {
        assign_id(&mut session.id);
        self.collection
            .replace_one(doc! { "_id": session.id.as_str() }, &session)
            .upsert(true)
            .await?;
        Ok(session)
    }

    async fn invalidate_all(&self, user_id: &str) -> Result<()> {
        self.collection
            .update_many(
                doc! { "user_id": user_id, "active": true },
                doc! { "$set": { "active": false } },
            )
            .await?;
        Ok(())
    }
}
