use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use engine::{Engine, MoneyCents};
use migration::MigratorTrait;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement, TransactionTrait};

mod prompt;

/// Dependents first, so the store's foreign keys never see an orphan.
const TABLES: [&str; 5] = ["records", "sessions", "accounts", "categories", "users"];

#[derive(Parser, Debug)]
#[command(name = "ledger_admin")]
#[command(about = "Admin utilities for the ledger (bootstrap users/accounts, reset)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./ledger.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Account(Account),
    /// Delete every row of every table.
    Reset(ResetArgs),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
    List,
    Delete(UserDeleteArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    name: String,
    /// Create the user without a password; they will not be able to log in.
    #[arg(long)]
    no_password: bool,
}

#[derive(Args, Debug)]
struct UserDeleteArgs {
    #[arg(long)]
    id: i64,
}

#[derive(Args, Debug)]
struct Account {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Create(AccountCreateArgs),
}

#[derive(Args, Debug)]
struct AccountCreateArgs {
    #[arg(long)]
    user_id: i64,
    /// Opening balance, e.g. `100` or `12.50`.
    #[arg(long, default_value = "0")]
    balance: MoneyCents,
}

#[derive(Args, Debug)]
struct ResetArgs {
    /// Skip the confirmation prompt.
    #[arg(long)]
    yes: bool,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn confirm(question: &str) -> Result<bool, Box<dyn Error + Send + Sync>> {
    eprint!("{question} [y/N] ");
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

async fn reset(db: &DatabaseConnection) -> Result<(), Box<dyn Error + Send + Sync>> {
    let backend = db.get_database_backend();
    let tx = db.begin().await?;
    for table in TABLES {
        tx.execute(Statement::from_string(backend, format!("DELETE FROM {table}")))
            .await?;
    }
    let has_sequence = tx
        .query_one(Statement::from_string(
            backend,
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'sqlite_sequence'",
        ))
        .await?
        .is_some();
    if has_sequence {
        tx.execute(Statement::from_string(backend, "DELETE FROM sqlite_sequence"))
            .await?;
    }
    tx.commit().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db.clone()).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = if args.no_password {
                None
            } else {
                Some(prompt::new_password()?)
            };
            let user = engine.create_user(&args.name, password.as_deref()).await?;
            println!("created user: {} ({})", user.name, user.id);
        }
        Command::User(User {
            command: UserCommand::List,
        }) => {
            for user in engine.users().await? {
                println!("{:>6}  {}", user.id, user.name);
            }
        }
        Command::User(User {
            command: UserCommand::Delete(args),
        }) => {
            engine.delete_user(args.id).await?;
            println!("deleted user {} with their account and records", args.id);
        }
        Command::Account(Account {
            command: AccountCommand::Create(args),
        }) => {
            let account = engine.create_account(args.user_id, args.balance).await?;
            println!(
                "created account {} for user {} (balance {})",
                account.id, account.user_id, account.balance
            );
        }
        Command::Reset(args) => {
            if !args.yes && !confirm("Delete ALL users, accounts, categories and records?")? {
                eprintln!("aborted");
                std::process::exit(1);
            }
            reset(&db).await?;
            println!("database reset");
        }
    }

    Ok(())
}
