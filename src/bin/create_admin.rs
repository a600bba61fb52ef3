//! Bootstrap the administrator account.
//!
//! Registration only creates inactive `client` accounts, so the first
//! administrator has to come from outside the API. This binary inserts it
//! directly, already active and validated. It refuses to run if an
//! administrator exists.

use std::sync::Arc;

use clap::Parser;

use authcore::auth::models::NewAccount;
use authcore::auth::validation::validate_password;
use authcore::auth::{hashing, models::normalize_email};
use authcore::config::AppConfig;
use authcore::errors::{Error, Result};
use authcore::storage::repositories::{
    AccountRepository, RoleRepository, SqlxAccountRepository, SqlxRoleRepository,
};
use authcore::{observability, storage};

#[derive(Parser, Debug)]
#[command(name = "create_admin", about = "Create the initial administrator account")]
struct Args {
    /// Email address for the administrator
    #[arg(long)]
    email: String,

    /// Display name for the administrator
    #[arg(long)]
    name: String,

    /// Password (must satisfy the password policy)
    #[arg(long)]
    password: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    observability::init_tracing()?;

    let args = Args::parse();
    let config = AppConfig::from_env()?;

    validate_password(&args.password)
        .map_err(|e| Error::validation(format!("Invalid password: {}", e)))?;

    let pool = storage::create_pool(&config.database).await?;
    storage::run_migrations(&pool).await?;

    let accounts: Arc<dyn AccountRepository> = Arc::new(SqlxAccountRepository::new(pool.clone()));
    let roles = SqlxRoleRepository::new(pool);

    let admin_role = roles
        .get_role_by_name("admin")
        .await?
        .ok_or_else(|| Error::config("Missing 'admin' role seed data"))?;

    if accounts.count_by_role(&admin_role.id).await? > 0 {
        return Err(Error::conflict("An administrator account already exists", "account"));
    }

    let email = normalize_email(&args.email);
    if accounts.get_account_by_email(&email).await?.is_some() {
        return Err(Error::conflict("Email is already registered", "account"));
    }

    let account = accounts
        .create_account(NewAccount {
            email,
            name: args.name.trim().to_string(),
            phone: None,
            password_hash: hashing::hash_password(&args.password)?,
            role_id: admin_role.id,
            is_active: true,
            is_validated: true,
        })
        .await?;

    println!("Administrator account created: {} <{}>", account.name, account.email);
    Ok(())
}
