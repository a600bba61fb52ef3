//! Password reset token issuance.
//!
//! Reset tokens are opaque single-use values with a short lifetime,
//! unrelated to the JWT session tokens. The raw value is handed to the
//! mailer exactly once and never logged at the issuing site.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::auth::models::ResetTokenRecord;
use crate::domain::{ResetTokenId, UserId};
use crate::errors::Result;
use crate::storage::repositories::ResetTokenRepository;

/// Entropy of a reset token value before encoding.
const RESET_TOKEN_BYTES: usize = 32;

/// Issues password reset tokens.
#[derive(Clone)]
pub struct ResetTokenService {
    repository: Arc<dyn ResetTokenRepository>,
    ttl_minutes: i64,
}

impl ResetTokenService {
    pub fn new(repository: Arc<dyn ResetTokenRepository>, ttl_minutes: i64) -> Self {
        Self { repository, ttl_minutes }
    }

    /// Generate and persist a fresh token for the given account, returning
    /// the raw value. Outstanding tokens for the same account stay valid;
    /// each is independently single-use.
    pub async fn issue(&self, user_id: &UserId) -> Result<String> {
        let mut secret_bytes = [0u8; RESET_TOKEN_BYTES];
        OsRng.fill_bytes(&mut secret_bytes);
        let token = URL_SAFE_NO_PAD.encode(secret_bytes);

        let now = Utc::now();
        let record = ResetTokenRecord {
            id: ResetTokenId::new(),
            user_id: user_id.clone(),
            token: token.clone(),
            expires_at: now + Duration::minutes(self.ttl_minutes),
            used: false,
            created_at: now,
        };

        self.repository.insert_token(record).await?;
        Ok(token)
    }

    /// Consume a token and set the owner's password hash. Delegates the
    /// atomicity guarantee to the repository.
    pub async fn consume(&self, token: &str, password_hash: &str) -> Result<()> {
        self.repository.consume_and_update_password(token, password_hash).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use std::sync::Mutex;

    struct RecordingRepository {
        inserted: Mutex<Vec<ResetTokenRecord>>,
    }

    #[async_trait::async_trait]
    impl ResetTokenRepository for RecordingRepository {
        async fn insert_token(&self, record: ResetTokenRecord) -> Result<()> {
            self.inserted.lock().unwrap().push(record);
            Ok(())
        }

        async fn get_token(&self, _token: &str) -> Result<Option<ResetTokenRecord>> {
            Ok(None)
        }

        async fn consume_and_update_password(
            &self,
            _token: &str,
            _password_hash: &str,
        ) -> Result<()> {
            Err(Error::internal("not under test"))
        }
    }

    #[tokio::test]
    async fn issued_tokens_are_unique_and_url_safe() {
        let repo = Arc::new(RecordingRepository { inserted: Mutex::new(Vec::new()) });
        let service = ResetTokenService::new(repo.clone(), 60);
        let user = UserId::new();

        let a = service.issue(&user).await.unwrap();
        let b = service.issue(&user).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(URL_SAFE_NO_PAD.decode(&a).unwrap().len(), RESET_TOKEN_BYTES);
        assert!(!a.contains('+') && !a.contains('/') && !a.contains('='));
    }

    #[tokio::test]
    async fn issued_record_carries_ttl_and_owner() {
        let repo = Arc::new(RecordingRepository { inserted: Mutex::new(Vec::new()) });
        let service = ResetTokenService::new(repo.clone(), 60);
        let user = UserId::new();

        let token = service.issue(&user).await.unwrap();

        let inserted = repo.inserted.lock().unwrap();
        let record = &inserted[0];
        assert_eq!(record.token, token);
        assert_eq!(record.user_id, user);
        assert!(!record.used);

        let ttl = (record.expires_at - record.created_at).num_minutes();
        assert_eq!(ttl, 60);
    }
}
