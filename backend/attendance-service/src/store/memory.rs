/// In-memory store backend for tests and lightweight deployments
use crate::error::Result;
use crate::models::{Session, Token, User};
use crate::store::{SessionStore, TokenStore, UserStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

fn assign_id(id: &mut String) {
    if id.is_empty() {
        *id = Uuid::new_v4().to_string();
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.lock().expect("user store lock poisoned");
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let users = self.users.lock().expect("user store lock poisoned");
        Ok(users.get(id).cloned())
    }

    async fn save(&self, mut user: User) -> Result<User> {
        assign_id(&mut user.id);
        let mut users = self.users.lock().expect("user store lock poisoned");
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }
}

#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<HashMap<String, Token>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<Option<Token>> {
        let tokens = self.tokens.lock().expect("token store lock poisoned");
        Ok(tokens
            .values()
            .find(|t| t.refresh_token == refresh_token)
            .cloned())
    }

    async fn save(&self, mut token: Token) -> Result<Token> {
        assign_id(&mut token.id);
        let mut tokens = self.tokens.lock().expect("token store lock poisoned");
        tokens.insert(token.id.clone(), token.clone());
        Ok(token)
    }

    async fn revoke_all(&self, user_id: &str) -> Result<()> {
        let mut tokens = self.tokens.lock().expect("token store lock poisoned");
        for token in tokens.values_mut() {
            if token.user_id == user_id {
                token.revoked = true;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn find_active_by_user_id(&self, user_id: &str) -> Result<Vec<Session>> {
        let sessions = self.sessions.lock().expect("session store lock poisoned");
        Ok(sessions
            .values()
            .filter(|s| s.user_id == user_id && s.active)
            .cloned()
            .collect())
    }

    async fn save(&self, mut session: Session) -> Result<Session> {
        assign_id(&mut session.id);
        let mut sessions = self.sessions.lock().expect("session store lock poisoned");
        sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn invalidate_all(&self, user_id: &str) -> Result<()> {
        let mut sessions = self.sessions.lock().expect("session store lock poisoned");
        for session in sessions.values_mut() {
            if session.user_id == user_id {
                session.active = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_user_save_assigns_id_and_upserts() {
        let store = MemoryUserStore::new();
        let saved = store
            .save(User::new("alice", "hash".to_string()))
            .await
            .expect("save succeeds");
        assert!(!saved.id.is_empty());

        let mut updated = saved.clone();
        updated.email = "alice@example.com".to_string();
        let updated = store.save(updated).await.expect("save succeeds");
        assert_eq!(updated.id, saved.id);

        let found = store
            .find_by_username("alice")
            .await
            .expect("lookup succeeds")
            .expect("user exists");
        assert_eq!(found.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_revoke_all_marks_every_token() {
        let store = MemoryTokenStore::new();
        let expiry = Utc::now() + Duration::days(7);
        store
            .save(Token::new("u1", "a1", "r1", expiry))
            .await
            .expect("save succeeds");
        store
            .save(Token::new("u1", "a2", "r2", expiry))
            .await
            .expect("save succeeds");
        store
            .save(Token::new("u2", "a3", "r3", expiry))
            .await
            .expect("save succeeds");

        store.revoke_all("u1").await.expect("revoke succeeds");

        for rt in ["r1", "r2"] {
            let token = store
                .find_by_refresh_token(rt)
                .await
                .expect("lookup succeeds")
                .expect("token exists");
            assert!(token.revoked);
        }
        let other = store
            .find_by_refresh_token("r3")
            .await
            .expect("lookup succeeds")
            .expect("token exists");
        assert!(!other.revoked);
    }

    #[tokio::test]
    async fn test_invalidate_all_keeps_history() {
        let store = MemorySessionStore::new();
        store
            .save(Session::new("u1", "browser", None))
            .await
            .expect("save succeeds");
        store
            .save(Session::new("u1", "phone", None))
            .await
            .expect("save succeeds");

        assert_eq!(
            store
                .find_active_by_user_id("u1")
                .await
                .expect("lookup succeeds")
                .len(),
            2
        );

        store.invalidate_all("u1").await.expect("invalidate succeeds");
        assert!(store
            .find_active_by_user_id("u1")
            .await
            .expect("lookup succeeds")
            .is_empty());
    }
}
