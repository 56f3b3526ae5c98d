/// Credential store contracts and backends
///
/// The orchestrator owns no durable state; users, tokens, and sessions
/// live behind these traits. Two backends exist, selected at construction
/// time: `memory` for tests and lightweight deployments, `mongo` for
/// production. `save` upserts by id and assigns one when blank.
pub mod memory;
pub mod mongo;

use crate::error::Result;
use crate::models::{Session, Token, User};
use async_trait::async_trait;

pub use memory::{MemorySessionStore, MemoryTokenStore, MemoryUserStore};
pub use mongo::{MongoSessionStore, MongoTokenStore, MongoUserStore};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;
    async fn save(&self, user: User) -> Result<User>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Lookup by refresh-token value; revoked records are still returned
    /// so the caller can distinguish "revoked" from "never issued".
    async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<Option<Token>>;
    async fn save(&self, token: Token) -> Result<Token>;
    /// Mark every non-revoked token of this user revoked
    async fn revoke_all(&self, user_id: &str) -> Result<()>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find_active_by_user_id(&self, user_id: &str) -> Result<Vec<Session>>;
    async fn save(&self, session: Session) -> Result<Session>;
    /// Deactivate every active session of this user; rows stay as history
    async fn invalidate_all(&self, user_id: &str) -> Result<()>;
}
