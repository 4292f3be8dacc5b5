//! CLI administration tool for library-lending.
//!
//! Provides commands for managing accounts and API tokens, resetting penalty
//! points, viewing statistics, and performing database operations without
//! requiring HTTP API access.
//!
//! # Usage
//!
//! ```bash
//! # Create an administrator
//! cargo run --bin admin -- user create --admin
//!
//! # Grant or remove admin rights
//! cargo run --bin admin -- user promote 7
//! cargo run --bin admin -- user promote 7 --revoke
//!
//! # Clear a patron's penalty points
//! cargo run --bin admin -- user reset-penalties 7
//!
//! # Issue a token for a user
//! cargo run --bin admin -- token create --user 7 --name "Kiosk"
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (or `DB_*` components): PostgreSQL connection string
//! - `TOKEN_SIGNING_SECRET`: must match the server's value
//! - `PASSWORD_PEPPER`: must match the server's value

use library_lending::api::dto::user::RegisterRequest;
use library_lending::application::services::{AuthService, UserService};
use library_lending::config;
use library_lending::domain::repositories::{TokenRepository, UserRepository};
use library_lending::server::connect_pool;
use library_lending::state::Repositories;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input, Password};
use sqlx::PgPool;
use std::sync::Arc;
use validator::Validate;

/// CLI tool for managing library-lending.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage API tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// User management subcommands.
#[derive(Subcommand)]
enum UserAction {
    /// Create a new account
    Create {
        #[arg(short, long)]
        username: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        /// Grant admin rights
        #[arg(long)]
        admin: bool,
    },

    /// Grant (or with --revoke, remove) admin rights
    Promote {
        user_id: i64,

        #[arg(long)]
        revoke: bool,
    },

    /// List all accounts
    List,

    /// Reset a user's penalty points to zero
    ResetPenalties {
        user_id: i64,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Token management subcommands.
#[derive(Subcommand)]
enum TokenAction {
    /// Issue a new API token for a user
    Create {
        /// Owner of the token
        #[arg(short, long)]
        user: i64,

        /// Token name (e.g., "Kiosk", "Mobile App")
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List all tokens
    List,

    /// Revoke a token
    Revoke {
        /// Token ID to revoke
        token_id: i64,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::Config::from_env()?;
    let pool = connect_pool(&config).await?;
    let repositories = Repositories::postgres(Arc::new(pool.clone()), config.db_lock_timeout_ms);
    let secret = config.token_signing_secret.clone();
    let pepper = config.password_pepper.clone();

    match cli.command {
        Commands::User { action } => handle_user_action(action, &repositories, pepper).await?,
        Commands::Token { action } => {
            handle_token_action(action, &repositories, secret, pepper).await?
        }
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Dispatches user management commands.
async fn handle_user_action(
    action: UserAction,
    repositories: &Repositories,
    pepper: String,
) -> Result<()> {
    let users = repositories.users.clone();

    match action {
        UserAction::Create {
            username,
            email,
            admin,
        } => {
            let service = UserService::new(users, pepper);
            create_user(&service, username, email, admin).await?;
        }
        UserAction::Promote { user_id, revoke } => {
            let user = users
                .set_admin(user_id, !revoke)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to update user: {}", e))?;
            let role = if user.is_admin { "admin" } else { "patron" };
            println!(
                "{} {} is now {}",
                "✅".green(),
                user.username.cyan(),
                role.bright_white().bold()
            );
        }
        UserAction::List => list_users(users.as_ref()).await?,
        UserAction::ResetPenalties { user_id, yes } => {
            reset_penalties(users.as_ref(), user_id, yes).await?;
        }
    }

    Ok(())
}

/// Creates an account with interactive prompts for missing fields.
///
/// Input goes through the same validation as `POST /api/register`.
async fn create_user(
    service: &UserService,
    username: Option<String>,
    email: Option<String>,
    admin: bool,
) -> Result<()> {
    println!("{}", "👤 Create User".bright_blue().bold());
    println!();

    let username = match username {
        Some(u) => u,
        None => Input::new().with_prompt("Username").interact_text()?,
    };
    let email = match email {
        Some(e) => e,
        None => Input::new().with_prompt("Email").interact_text()?,
    };
    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;

    let request = RegisterRequest {
        username,
        email,
        password,
    };
    request
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid input: {}", e))?;

    let user = service
        .create_account(&request.username, &request.email, &request.password, admin)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create user: {}", e))?;

    println!();
    println!("{}", "✅ User created successfully!".green().bold());
    println!("  ID:    {}", user.id.to_string().bright_white());
    println!("  Name:  {}", user.username.cyan());
    println!("  Admin: {}", user.is_admin);
    println!();

    Ok(())
}

/// Lists all accounts with role and penalty points.
async fn list_users(users: &dyn UserRepository) -> Result<()> {
    println!("{}", "📋 Users".bright_blue().bold());
    println!();

    let users = users
        .list()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list users: {}", e))?;

    if users.is_empty() {
        println!("{}", "  No users found".yellow());
        return Ok(());
    }

    println!(
        "  {:<5} {:<24} {:<30} {:<8} {:<8}",
        "ID".bright_white().bold(),
        "Username".bright_white().bold(),
        "Email".bright_white().bold(),
        "Role".bright_white().bold(),
        "Penalty".bright_white().bold()
    );
    println!("  {}", "─".repeat(79).bright_black());

    for user in &users {
        let role = if user.is_admin {
            "admin".magenta()
        } else {
            "patron".normal()
        };
        let penalty = if user.penalty_points > 0 {
            user.penalty_points.to_string().red()
        } else {
            user.penalty_points.to_string().green()
        };

        println!(
            "  {:<5} {:<24} {:<30} {:<8} {}",
            user.id.to_string().bright_black(),
            user.username.cyan(),
            user.email,
            role,
            penalty
        );
    }

    println!();
    println!("  Total: {}", users.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

/// Clears a user's penalty points after confirmation.
async fn reset_penalties(users: &dyn UserRepository, user_id: i64, skip_confirm: bool) -> Result<()> {
    let user = users
        .find_by_id(user_id)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .context("User not found")?;

    if user.penalty_points == 0 {
        println!("{}", "⚠️  This user has no penalty points".yellow());
        return Ok(());
    }

    println!("  User:    {}", user.username.cyan());
    println!("  Penalty: {}", user.penalty_points.to_string().red());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Reset penalty points to zero?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    users
        .reset_penalties(user_id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to reset penalties: {}", e))?;

    println!("{}", "✅ Penalty points reset".green().bold());
    Ok(())
}

/// Dispatches token management commands.
async fn handle_token_action(
    action: TokenAction,
    repositories: &Repositories,
    secret: String,
    pepper: String,
) -> Result<()> {
    match action {
        TokenAction::Create { user, name } => {
            let service = AuthService::new(
                repositories.tokens.clone(),
                repositories.users.clone(),
                secret,
                pepper,
            );
            create_token(&service, user, name).await?;
        }
        TokenAction::List => list_tokens(repositories.tokens.as_ref()).await?,
        TokenAction::Revoke { token_id } => {
            revoke_token(repositories.tokens.as_ref(), token_id).await?;
        }
    }

    Ok(())
}

/// Issues a token and prints it once.
///
/// Only the HMAC hash is stored; the raw token cannot be retrieved later.
async fn create_token(service: &AuthService, user_id: i64, name: Option<String>) -> Result<()> {
    println!("{}", "🔑 Create API Token".bright_blue().bold());
    println!();

    let token_name = match name {
        Some(n) => n,
        None => Input::new()
            .with_prompt("Token name")
            .with_initial_text("CLI")
            .interact_text()?,
    };

    let issued = service
        .issue_token(user_id, &token_name)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create token: {}", e))?;

    println!("{}", "✅ Token created successfully!".green().bold());
    println!();
    println!("  ID:    {}", issued.token_id.to_string().bright_black());
    println!("  Name:  {}", token_name.cyan());
    println!("  Token: {}", issued.token.bright_yellow().bold());
    println!();
    println!(
        "{}",
        "⚠️  IMPORTANT: Save this token now! You won't be able to see it again."
            .red()
            .bold()
    );
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -H \"Authorization: Bearer {}\" http://localhost:3000/api/books",
        issued.token.bright_yellow()
    );
    println!();

    Ok(())
}

/// Lists all API tokens with status indicators.
async fn list_tokens(tokens: &dyn TokenRepository) -> Result<()> {
    println!("{}", "📋 API Tokens".bright_blue().bold());
    println!();

    let tokens = tokens
        .list_tokens()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list tokens: {}", e))?;

    if tokens.is_empty() {
        println!("{}", "  No tokens found".yellow());
        return Ok(());
    }

    println!(
        "  {:<5} {:<6} {:<24} {:<18} {:<18} {:<10}",
        "ID".bright_white().bold(),
        "User".bright_white().bold(),
        "Name".bright_white().bold(),
        "Created".bright_white().bold(),
        "Last used".bright_white().bold(),
        "Status".bright_white().bold()
    );
    println!("  {}", "─".repeat(85).bright_black());

    for token in &tokens {
        let status = if token.revoked_at.is_some() {
            "REVOKED".red()
        } else {
            "ACTIVE".green()
        };
        let last_used = token
            .last_used_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());

        println!(
            "  {:<5} {:<6} {:<24} {:<18} {:<18} {}",
            token.id.to_string().bright_black(),
            token.user_id,
            token.name.cyan(),
            token.created_at.format("%Y-%m-%d %H:%M").to_string(),
            last_used.bright_black(),
            status
        );
    }

    println!();
    println!("  Total: {}", tokens.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

/// Revokes a token by ID with confirmation prompt.
async fn revoke_token(tokens: &dyn TokenRepository, token_id: i64) -> Result<()> {
    println!("{}", "🔒 Revoke API Token".bright_blue().bold());
    println!();

    let token = tokens
        .find_by_id(token_id)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .context("Token not found")?;

    if token.revoked_at.is_some() {
        println!("{}", "⚠️  This token is already revoked".yellow());
        return Ok(());
    }

    println!("  Token: {}", token.name.cyan());
    println!("  User:  {}", token.user_id.to_string().bright_black());
    println!();

    let confirmed = Confirm::new()
        .with_prompt("Revoke this token?")
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
        return Ok(());
    }

    tokens
        .revoke_token(token.id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to revoke token: {}", e))?;

    println!("{}", "✅ Token revoked successfully!".green().bold());
    println!();

    Ok(())
}

/// Displays catalog and lending statistics.
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    let books: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
        .fetch_one(pool)
        .await?;

    let (total_copies, available_copies): (i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(total_copies), 0)::BIGINT, COALESCE(SUM(available_copies), 0)::BIGINT FROM books",
    )
    .fetch_one(pool)
    .await?;

    let active_borrows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM borrows WHERE return_date IS NULL")
            .fetch_one(pool)
            .await?;

    let overdue: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM borrows WHERE return_date IS NULL AND due_date < CURRENT_DATE",
    )
    .fetch_one(pool)
    .await?;

    let penalty_points: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(penalty_points), 0)::BIGINT FROM users")
            .fetch_one(pool)
            .await?;

    let tokens: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM api_tokens WHERE revoked_at IS NULL")
            .fetch_one(pool)
            .await?;

    println!("  Users:          {}", users.to_string().bright_green().bold());
    println!("  Books:          {}", books.to_string().bright_green().bold());
    println!(
        "  Copies:         {} available / {} total",
        available_copies.to_string().bright_green().bold(),
        total_copies.to_string().bright_white()
    );
    println!(
        "  Active borrows: {}",
        active_borrows.to_string().bright_green().bold()
    );
    println!("  Overdue:        {}", overdue.to_string().yellow().bold());
    println!(
        "  Penalty points: {}",
        penalty_points.to_string().red().bold()
    );
    println!("  Active tokens:  {}", tokens.to_string().bright_green().bold());
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let migrations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
                .fetch_one(pool)
                .await
                .unwrap_or(0);

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Migrations: {}", migrations.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}
