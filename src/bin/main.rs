use std::sync::Arc;

use account_service::accounts::RegisterRequest;
use account_service::{
    AccountService, AuthConfig, DatabaseConfig, PasswordHasher, TokenService, UserStore,
};
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "account-service")]
#[command(about = "User registration, login and bearer-token gated account API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Bind address, e.g. 0.0.0.0:8000
        #[arg(long, default_value = "127.0.0.1:8000", env = "ACCOUNTS_BIND")]
        bind: String,
        #[command(flatten)]
        db: DbArgs,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Initialize the database schema
    Init {
        #[command(flatten)]
        db: DbArgs,
    },
    /// Create a user directly in the store
    CreateUser {
        username: String,
        /// Plaintext password; hashed before it is stored
        #[arg(long, env = "ACCOUNTS_NEW_PASSWORD")]
        password: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        /// bcrypt work factor for the new hash
        #[arg(long, default_value_t = bcrypt::DEFAULT_COST, env = "BCRYPT_COST")]
        bcrypt_cost: u32,
        #[command(flatten)]
        db: DbArgs,
    },
    /// List all users
    ListUsers {
        #[command(flatten)]
        db: DbArgs,
    },
}

#[derive(Args)]
struct DbArgs {
    #[arg(long, default_value = "memory", env = "ACCOUNTS_DB_URL")]
    db_url: String,
}

impl DbArgs {
    fn into_config(self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.db_url,
            ..Default::default()
        }
    }
}

#[derive(Args)]
struct AuthArgs {
    /// HMAC secret used to sign access tokens
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    secret_key: String,
    /// Token signing algorithm (HS256, HS384, HS512)
    #[arg(long, default_value = "HS256", env = "ALGORITHM")]
    algorithm: String,
    /// Access token lifetime in minutes
    #[arg(long, default_value_t = 30, env = "ACCESS_TOKEN_EXPIRE_MINUTES")]
    access_token_expire_minutes: i64,
    /// bcrypt work factor for new password hashes
    #[arg(long, default_value_t = bcrypt::DEFAULT_COST, env = "BCRYPT_COST")]
    bcrypt_cost: u32,
}

impl AuthArgs {
    fn into_config(self) -> Result<AuthConfig> {
        let config = AuthConfig {
            secret_key: self.secret_key,
            algorithm: self.algorithm,
            access_token_expire_minutes: self.access_token_expire_minutes,
            bcrypt_cost: self.bcrypt_cost,
        };
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("account_service=info".parse()?)
                .add_directive("surrealdb=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind, db, auth } => {
            let auth_config = auth.into_config()?;
            info!("Starting account API on {}", bind);
            account_service::server::start_http(&bind, db.into_config(), &auth_config).await?;
        }
        Commands::Init { db } => {
            let db_config = db.into_config();
            info!("Initializing database at {}", db_config.url);
            let db = account_service::create_connection(db_config).await?;
            account_service::ensure_schema(&db).await?;
            info!("Database initialized successfully");
        }
        Commands::CreateUser {
            username,
            password,
            first_name,
            last_name,
            bcrypt_cost,
            db,
        } => {
            let db = account_service::create_connection(db.into_config()).await?;
            account_service::ensure_schema(&db).await?;

            // Nothing is signed by this command.
            let tokens = TokenService::new(
                "unused",
                jsonwebtoken::Algorithm::HS256,
                chrono::Duration::minutes(1),
            )?;
            let accounts = AccountService::new(
                UserStore::new(db),
                Arc::new(PasswordHasher::new(bcrypt_cost)?),
                Arc::new(tokens),
            );

            let user = accounts
                .register(RegisterRequest {
                    username,
                    first_name,
                    last_name,
                    password,
                })
                .await?;

            println!("User created successfully!");
            println!();
            println!("  Id:       {}", user.id);
            println!("  Username: {}", user.username);
        }
        Commands::ListUsers { db } => {
            let db = account_service::create_connection(db.into_config()).await?;
            account_service::ensure_schema(&db).await?;

            let users = UserStore::new(db).list_all().await?;
            if users.is_empty() {
                println!("No users found.");
                return Ok(());
            }

            println!(
                "{:<38} {:<20} {:<20} {:<20}",
                "ID", "USERNAME", "FIRST NAME", "LAST NAME"
            );
            println!("{}", "-".repeat(100));

            for user in users {
                println!(
                    "{:<38} {:<20} {:<20} {:<20}",
                    user.id,
                    user.username,
                    user.first_name.unwrap_or_else(|| "-".to_string()),
                    user.last_name.unwrap_or_else(|| "-".to_string()),
                );
            }
        }
    }

    Ok(())
}
