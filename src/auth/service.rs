//! Credential and session lifecycle orchestration.
//!
//! `AuthService` owns the end-to-end flows: registration, login, token
//! refresh, password change, and the two halves of the reset flow. It leans
//! on the repositories for persistence, the token codec for JWTs, and the
//! mailer for reset delivery.
//!
//! Enumeration posture: login returns one `invalid_credentials` failure for
//! both unknown accounts and wrong passwords (with a dummy hash verification
//! to level timing), and forgot-password acknowledges identically whether or
//! not the address exists.

use std::sync::{Arc, LazyLock};

use tracing::{info, instrument, warn};
use validator::Validate;

use crate::auth::hashing;
use crate::auth::jwt::{TokenCodec, TokenKind, TokenPair};
use crate::auth::models::{
    normalize_email, Account, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest,
    NewAccount, RefreshTokenRequest, RegisterRequest, ResetPasswordRequest,
};
use crate::auth::reset::ResetTokenService;
use crate::config::AppConfig;
use crate::errors::{AuthErrorType, Error, Result};
use crate::mailer::{self, ResetMailer};
use crate::observability;
use crate::storage::repositories::{
    AccountRepository, RoleRepository, SqlxAccountRepository, SqlxResetTokenRepository,
    SqlxRoleRepository,
};
use crate::storage::DbPool;

/// Role assigned to self-registered accounts.
pub const DEFAULT_ROLE: &str = "client";

/// Pre-computed dummy hash for timing-safe account enumeration prevention.
/// When a non-existent email is used, we still run Argon2 verification
/// against this hash so the response time matches real verification.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    hashing::hash_password("dummy_startup_value")
        .unwrap_or_else(|_| "$argon2id$v=19$m=768,t=1,p=1$dW5rbm93bg$dW5rbm93bg".to_string())
});

/// Service for the credential and session lifecycle.
#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountRepository>,
    roles: Arc<dyn RoleRepository>,
    reset_tokens: ResetTokenService,
    codec: Arc<TokenCodec>,
    mailer: Arc<dyn ResetMailer>,
    frontend_url: String,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        roles: Arc<dyn RoleRepository>,
        reset_tokens: ResetTokenService,
        codec: Arc<TokenCodec>,
        mailer: Arc<dyn ResetMailer>,
        frontend_url: String,
    ) -> Self {
        Self { accounts, roles, reset_tokens, codec, mailer, frontend_url }
    }

    /// Wire the service against SQLite-backed repositories.
    pub fn with_sqlx(pool: DbPool, config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            Arc::new(SqlxAccountRepository::new(pool.clone())),
            Arc::new(SqlxRoleRepository::new(pool.clone())),
            ResetTokenService::new(
                Arc::new(SqlxResetTokenRepository::new(pool)),
                config.auth.reset_token_expire_minutes,
            ),
            Arc::new(TokenCodec::new(&config.auth)),
            mailer::build_mailer(&config.mail)?,
            config.mail.frontend_url.clone(),
        ))
    }

    /// Register a new account.
    ///
    /// The account starts inactive and unvalidated; an administrator flips
    /// those flags before the first login can succeed. The password is
    /// checked against the policy before anything is stored.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<Account> {
        request.validate().map_err(Error::from)?;

        let email = normalize_email(&request.email);

        if self.accounts.get_account_by_email(&email).await?.is_some() {
            warn!(email = %email, "registration attempt for existing email");
            return Err(Error::conflict("Email is already registered", "account"));
        }

        let role = self
            .roles
            .get_role_by_name(DEFAULT_ROLE)
            .await?
            .ok_or_else(|| Error::config(format!("Missing '{}' role seed data", DEFAULT_ROLE)))?;

        let password_hash = hashing::hash_password(&request.password)?;

        let account = self
            .accounts
            .create_account(NewAccount {
                email,
                name: request.name.trim().to_string(),
                phone: request.phone,
                password_hash,
                role_id: role.id,
                is_active: false,
                is_validated: false,
            })
            .await?;

        info!(account_id = %account.id, "account registered, awaiting validation");
        Ok(account)
    }

    /// Authenticate with email and password, returning a fresh token pair.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<TokenPair> {
        request.validate().map_err(Error::from)?;

        let email = normalize_email(&request.email);

        let account = match self.accounts.get_account_by_email(&email).await? {
            Some(account) => account,
            None => {
                // Level response timing against real verification so absent
                // accounts are indistinguishable from wrong passwords.
                let _ = hashing::verify_password(&request.password, &DUMMY_HASH);
                warn!(email = %email, "login attempt for non-existent account");
                observability::record_authentication("invalid_credentials");
                return Err(Error::auth(
                    "Invalid email or password",
                    AuthErrorType::InvalidCredentials,
                ));
            }
        };

        if !hashing::verify_password(&request.password, &account.password_hash) {
            warn!(account_id = %account.id, "login attempt with incorrect password");
            observability::record_authentication("invalid_credentials");
            return Err(Error::auth(
                "Invalid email or password",
                AuthErrorType::InvalidCredentials,
            ));
        }

        if !account.can_login() {
            warn!(account_id = %account.id, "login attempt for inactive account");
            observability::record_authentication("account_inactive");
            return Err(Error::auth(
                "Account is awaiting validation",
                AuthErrorType::AccountInactive,
            ));
        }

        observability::record_authentication("success");
        info!(account_id = %account.id, "login succeeded");
        self.codec.issue_pair(&account.email)
    }

    /// Exchange a refresh token for a fresh token pair.
    ///
    /// The refresh token is not revoked; it stays valid until its own
    /// expiry. Account state is re-checked so deactivation cuts the session
    /// chain at the next rotation.
    #[instrument(skip(self, request))]
    pub async fn refresh(&self, request: RefreshTokenRequest) -> Result<TokenPair> {
        request.validate().map_err(Error::from)?;

        let claims = self
            .codec
            .decode(&request.refresh_token)
            .filter(|claims| claims.kind == TokenKind::Refresh)
            .ok_or_else(|| {
                observability::record_authentication("invalid_token");
                Error::auth("Invalid or expired refresh token", AuthErrorType::InvalidOrExpiredToken)
            })?;

        let account =
            self.accounts.get_account_by_email(&claims.sub).await?.ok_or_else(|| {
                observability::record_authentication("invalid_token");
                Error::auth("Invalid or expired refresh token", AuthErrorType::InvalidOrExpiredToken)
            })?;

        if !account.can_login() {
            observability::record_authentication("account_inactive");
            return Err(Error::auth(
                "Account is not active",
                AuthErrorType::AccountInactive,
            ));
        }

        self.codec.issue_pair(&account.email)
    }

    /// Resolve an access token to its account, for protected endpoints.
    #[instrument(skip(self, token))]
    pub async fn authenticate_access(&self, token: &str) -> Result<Account> {
        let claims = self
            .codec
            .decode(token)
            .filter(|claims| claims.kind == TokenKind::Access)
            .ok_or_else(|| {
                Error::auth("Invalid or expired access token", AuthErrorType::InvalidOrExpiredToken)
            })?;

        let account = self.accounts.get_account_by_email(&claims.sub).await?.ok_or_else(|| {
            Error::auth("Invalid or expired access token", AuthErrorType::InvalidOrExpiredToken)
        })?;

        if !account.can_login() {
            return Err(Error::auth("Account is not active", AuthErrorType::AccountInactive));
        }

        Ok(account)
    }

    /// Change the password of an authenticated account.
    #[instrument(skip(self, account, request), fields(account_id = %account.id))]
    pub async fn change_password(
        &self,
        account: &Account,
        request: ChangePasswordRequest,
    ) -> Result<()> {
        request.validate().map_err(Error::from)?;

        if !hashing::verify_password(&request.current_password, &account.password_hash) {
            warn!(account_id = %account.id, "password change with incorrect current password");
            return Err(Error::auth(
                "Current password is incorrect",
                AuthErrorType::CurrentPasswordIncorrect,
            ));
        }

        let password_hash = hashing::hash_password(&request.new_password)?;
        self.accounts.update_password(&account.id, password_hash).await?;

        info!(account_id = %account.id, "password changed");
        Ok(())
    }

    /// Begin a password reset.
    ///
    /// Succeeds identically whether or not the address belongs to an
    /// account; the existence signal never leaves this method. Mail delivery
    /// runs detached so its latency cannot distinguish the two paths either.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn request_password_reset(&self, request: ForgotPasswordRequest) -> Result<()> {
        request.validate().map_err(Error::from)?;

        let email = normalize_email(&request.email);
        observability::record_password_reset("requested");

        let Some(account) = self.accounts.get_account_by_email(&email).await? else {
            info!("password reset requested for unknown address");
            return Ok(());
        };

        let token = self.reset_tokens.issue(&account.id).await?;
        let link = mailer::reset_link(&self.frontend_url, &token);

        let mailer = self.mailer.clone();
        let recipient = account.email.clone();
        tokio::spawn(async move {
            if let Err(err) = mailer.deliver_reset(&recipient, &link).await {
                warn!(error = %err, "failed to deliver password reset mail");
            }
        });

        Ok(())
    }

    /// Complete a password reset with a token from the mail link.
    #[instrument(skip(self, request))]
    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<()> {
        request.validate().map_err(Error::from)?;

        let password_hash = hashing::hash_password(&request.new_password)?;

        match self.reset_tokens.consume(&request.token, &password_hash).await {
            Ok(()) => {
                observability::record_password_reset("completed");
                info!("password reset completed");
                Ok(())
            }
            Err(err) => {
                if matches!(err, Error::Auth { .. }) {
                    observability::record_password_reset("rejected");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{ResetTokenRecord, Role};
    use crate::config::AuthConfig;
    use crate::domain::{RoleId, UserId};
    use crate::mailer::LogMailer;
    use crate::storage::repositories::ResetTokenRepository;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryAccounts {
        by_email: Mutex<HashMap<String, Account>>,
    }

    #[async_trait::async_trait]
    impl AccountRepository for MemoryAccounts {
        async fn create_account(&self, new: NewAccount) -> Result<Account> {
            let account = Account {
                id: UserId::new(),
                email: new.email.clone(),
                name: new.name,
                phone: new.phone,
                password_hash: new.password_hash,
                role_id: new.role_id,
                role_name: DEFAULT_ROLE.to_string(),
                is_active: new.is_active,
                is_validated: new.is_validated,
                must_change_password: false,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            self.by_email.lock().unwrap().insert(new.email, account.clone());
            Ok(account)
        }

        async fn get_account(&self, id: &UserId) -> Result<Option<Account>> {
            Ok(self.by_email.lock().unwrap().values().find(|a| &a.id == id).cloned())
        }

        async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
            Ok(self.by_email.lock().unwrap().get(email).cloned())
        }

        async fn update_password(&self, id: &UserId, password_hash: String) -> Result<()> {
            let mut accounts = self.by_email.lock().unwrap();
            if let Some(account) = accounts.values_mut().find(|a| &a.id == id) {
                account.password_hash = password_hash;
            }
            Ok(())
        }

        async fn set_active(&self, id: &UserId, is_active: bool) -> Result<()> {
            let mut accounts = self.by_email.lock().unwrap();
            if let Some(account) = accounts.values_mut().find(|a| &a.id == id) {
                account.is_active = is_active;
            }
            Ok(())
        }

        async fn set_validated(&self, id: &UserId, is_validated: bool) -> Result<()> {
            let mut accounts = self.by_email.lock().unwrap();
            if let Some(account) = accounts.values_mut().find(|a| &a.id == id) {
                account.is_validated = is_validated;
            }
            Ok(())
        }

        async fn count_by_role(&self, role_id: &RoleId) -> Result<i64> {
            Ok(self.by_email.lock().unwrap().values().filter(|a| &a.role_id == role_id).count()
                as i64)
        }

        async fn delete_account(&self, id: &UserId) -> Result<()> {
            self.by_email.lock().unwrap().retain(|_, a| &a.id != id);
            Ok(())
        }
    }

    struct MemoryRoles;

    #[async_trait::async_trait]
    impl RoleRepository for MemoryRoles {
        async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>> {
            if name == DEFAULT_ROLE {
                Ok(Some(Role { id: RoleId::new(), name: name.to_string(), description: None }))
            } else {
                Ok(None)
            }
        }
    }

    #[derive(Default)]
    struct MemoryResetTokens {
        tokens: Mutex<Vec<ResetTokenRecord>>,
    }

    #[async_trait::async_trait]
    impl ResetTokenRepository for MemoryResetTokens {
        async fn insert_token(&self, record: ResetTokenRecord) -> Result<()> {
            self.tokens.lock().unwrap().push(record);
            Ok(())
        }

        async fn get_token(&self, token: &str) -> Result<Option<ResetTokenRecord>> {
            Ok(self.tokens.lock().unwrap().iter().find(|t| t.token == token).cloned())
        }

        async fn consume_and_update_password(
            &self,
            token: &str,
            _password_hash: &str,
        ) -> Result<()> {
            let mut tokens = self.tokens.lock().unwrap();
            let Some(record) = tokens.iter_mut().find(|t| t.token == token) else {
                return Err(Error::auth("Invalid reset token", AuthErrorType::InvalidResetToken));
            };
            if record.used {
                return Err(Error::auth("already used", AuthErrorType::UsedResetToken));
            }
            record.used = true;
            Ok(())
        }
    }

    fn service() -> (AuthService, Arc<MemoryAccounts>, Arc<MemoryResetTokens>) {
        let accounts = Arc::new(MemoryAccounts::default());
        let reset_repo = Arc::new(MemoryResetTokens::default());
        let auth_config = AuthConfig {
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            ..AuthConfig::default()
        };
        let service = AuthService::new(
            accounts.clone(),
            Arc::new(MemoryRoles),
            ResetTokenService::new(reset_repo.clone(), 60),
            Arc::new(TokenCodec::new(&auth_config)),
            Arc::new(LogMailer),
            "http://localhost:5173".to_string(),
        );
        (service, accounts, reset_repo)
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            name: "Ada Lovelace".to_string(),
            password: "Abc12345".to_string(),
            phone: None,
        }
    }

    #[tokio::test]
    async fn register_stores_digest_not_plaintext() {
        let (service, accounts, _) = service();
        let account = service.register(register_request("ada@example.com")).await.unwrap();

        assert!(!account.is_active);
        assert!(!account.is_validated);

        let stored = accounts.get_account_by_email("ada@example.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "Abc12345");
        assert!(stored.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn register_trims_email_and_rejects_duplicates() {
        let (service, _, _) = service();
        service.register(register_request("ada@example.com")).await.unwrap();

        let err = service.register(register_request("  ada@example.com ")).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[tokio::test]
    async fn email_case_distinguishes_accounts() {
        let (service, accounts, _) = service();
        service.register(register_request("ada@example.com")).await.unwrap();
        service.register(register_request("Ada@example.com")).await.unwrap();

        assert!(accounts.get_account_by_email("ada@example.com").await.unwrap().is_some());
        assert!(accounts.get_account_by_email("Ada@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn register_rejects_weak_password_before_storing() {
        let (service, accounts, _) = service();
        let mut request = register_request("ada@example.com");
        request.password = "weak".to_string();

        assert!(matches!(
            service.register(request).await.unwrap_err(),
            Error::Validation { .. }
        ));
        assert!(accounts.get_account_by_email("ada@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn login_before_activation_is_rejected() {
        let (service, accounts, _) = service();
        let account = service.register(register_request("ada@example.com")).await.unwrap();

        let request = LoginRequest {
            email: "ada@example.com".to_string(),
            password: "Abc12345".to_string(),
        };
        let err = service.login(request.clone()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Auth { error_type: AuthErrorType::AccountInactive, .. }
        ));

        accounts.set_active(&account.id, true).await.unwrap();
        let pair = service.login(request).await.unwrap();
        assert_eq!(pair.token_type, "bearer");
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_are_indistinguishable() {
        let (service, accounts, _) = service();
        let account = service.register(register_request("ada@example.com")).await.unwrap();
        accounts.set_active(&account.id, true).await.unwrap();

        let unknown = service
            .login(LoginRequest {
                email: "ghost@example.com".to_string(),
                password: "Abc12345".to_string(),
            })
            .await
            .unwrap_err();
        let wrong = service
            .login(LoginRequest {
                email: "ada@example.com".to_string(),
                password: "Wrong1234".to_string(),
            })
            .await
            .unwrap_err();

        let (Error::Auth { message: m1, error_type: t1 }, Error::Auth { message: m2, error_type: t2 }) =
            (unknown, wrong)
        else {
            panic!("expected auth errors");
        };
        assert_eq!(m1, m2);
        assert_eq!(t1, t2);
        assert_eq!(t1, AuthErrorType::InvalidCredentials);
    }

    #[tokio::test]
    async fn refresh_rejects_access_tokens() {
        let (service, accounts, _) = service();
        let account = service.register(register_request("ada@example.com")).await.unwrap();
        accounts.set_active(&account.id, true).await.unwrap();

        let pair = service
            .login(LoginRequest {
                email: "ada@example.com".to_string(),
                password: "Abc12345".to_string(),
            })
            .await
            .unwrap();

        let err = service
            .refresh(RefreshTokenRequest { refresh_token: pair.access_token })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Auth { error_type: AuthErrorType::InvalidOrExpiredToken, .. }
        ));

        assert!(service
            .refresh(RefreshTokenRequest { refresh_token: pair.refresh_token })
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn deactivation_cuts_refresh_chain() {
        let (service, accounts, _) = service();
        let account = service.register(register_request("ada@example.com")).await.unwrap();
        accounts.set_active(&account.id, true).await.unwrap();

        let pair = service
            .login(LoginRequest {
                email: "ada@example.com".to_string(),
                password: "Abc12345".to_string(),
            })
            .await
            .unwrap();

        accounts.set_active(&account.id, false).await.unwrap();
        let err = service
            .refresh(RefreshTokenRequest { refresh_token: pair.refresh_token })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Auth { error_type: AuthErrorType::AccountInactive, .. }
        ));
    }

    #[tokio::test]
    async fn change_password_requires_current_password() {
        let (service, accounts, _) = service();
        let account = service.register(register_request("ada@example.com")).await.unwrap();
        accounts.set_active(&account.id, true).await.unwrap();
        let account = accounts.get_account(&account.id).await.unwrap().unwrap();

        let err = service
            .change_password(
                &account,
                ChangePasswordRequest {
                    current_password: "Wrong1234".to_string(),
                    new_password: "Newpass12".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Auth { error_type: AuthErrorType::CurrentPasswordIncorrect, .. }
        ));

        service
            .change_password(
                &account,
                ChangePasswordRequest {
                    current_password: "Abc12345".to_string(),
                    new_password: "Newpass12".to_string(),
                },
            )
            .await
            .unwrap();

        let pair = service
            .login(LoginRequest {
                email: "ada@example.com".to_string(),
                password: "Newpass12".to_string(),
            })
            .await;
        assert!(pair.is_ok());
    }

    #[tokio::test]
    async fn forgot_password_acknowledges_unknown_addresses() {
        let (service, _, reset_repo) = service();

        service
            .request_password_reset(ForgotPasswordRequest {
                email: "ghost@example.com".to_string(),
            })
            .await
            .unwrap();

        assert!(reset_repo.tokens.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn forgot_password_issues_token_for_known_account() {
        let (service, _, reset_repo) = service();
        service.register(register_request("ada@example.com")).await.unwrap();

        service
            .request_password_reset(ForgotPasswordRequest { email: "ada@example.com".to_string() })
            .await
            .unwrap();

        assert_eq!(reset_repo.tokens.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reset_password_is_single_use() {
        let (service, _, reset_repo) = service();
        service.register(register_request("ada@example.com")).await.unwrap();
        service
            .request_password_reset(ForgotPasswordRequest { email: "ada@example.com".to_string() })
            .await
            .unwrap();

        let token = reset_repo.tokens.lock().unwrap()[0].token.clone();

        service
            .reset_password(ResetPasswordRequest {
                token: token.clone(),
                new_password: "Newpass12".to_string(),
            })
            .await
            .unwrap();

        let err = service
            .reset_password(ResetPasswordRequest { token, new_password: "Other1234".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Auth { error_type: AuthErrorType::UsedResetToken, .. }
        ));
    }

    #[tokio::test]
    async fn reset_password_enforces_policy_before_consuming() {
        let (service, _, reset_repo) = service();
        service.register(register_request("ada@example.com")).await.unwrap();
        service
            .request_password_reset(ForgotPasswordRequest { email: "ada@example.com".to_string() })
            .await
            .unwrap();

        let token = reset_repo.tokens.lock().unwrap()[0].token.clone();

        let err = service
            .reset_password(ResetPasswordRequest {
                token: token.clone(),
                new_password: "weak".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        // The token survived the rejected attempt.
        assert!(!reset_repo.tokens.lock().unwrap()[0].used);
    }
}
