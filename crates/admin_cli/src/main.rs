use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{AdjustCmd, Engine, format_minor_units};
use migration::MigratorTrait;
use sea_orm::Database;

#[derive(Parser, Debug)]
#[command(name = "gettone_admin")]
#[command(about = "Admin utilities for Gettone (balances, adjustments, ledger views)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./gettone.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Balance(Balance),
    /// List a user's payment attempts and adjustments.
    Transactions {
        #[arg(long)]
        user: i64,
        #[arg(long, default_value_t = 20)]
        limit: u64,
    },
    /// List the audit trail for a user's balance.
    Audit {
        #[arg(long)]
        user: i64,
        #[arg(long, default_value_t = 20)]
        limit: u64,
    },
}

#[derive(Args, Debug)]
struct Balance {
    #[command(subcommand)]
    command: BalanceCommand,
}

#[derive(Subcommand, Debug)]
enum BalanceCommand {
    /// Show a user's current credit balance.
    Show {
        #[arg(long)]
        user: i64,
    },
    /// Apply a discretionary credit change with a mandatory reason.
    Adjust {
        #[arg(long)]
        user: i64,
        /// Signed credit delta, e.g. `--delta -100` for a debit.
        #[arg(long, allow_hyphen_values = true)]
        delta: i64,
        #[arg(long)]
        reason: String,
        /// Administrator identity recorded on the audit entry.
        #[arg(long)]
        admin: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let db = Database::connect(&cli.database_url).await?;
    migration::Migrator::up(&db, None).await?;
    let engine = Engine::builder().database(db).build()?;

    match cli.command {
        Command::Balance(balance) => match balance.command {
            BalanceCommand::Show { user } => {
                let credits = engine.balance(user).await?;
                println!("user {user}: {credits} credits");
            }
            BalanceCommand::Adjust {
                user,
                delta,
                reason,
                admin,
            } => {
                let adjustment = engine
                    .adjust(AdjustCmd {
                        user_id: user,
                        delta_credits: delta,
                        reason,
                        admin_id: admin,
                    })
                    .await?;
                println!(
                    "adjusted user {user} by {delta} credits (transaction {}), new balance {}",
                    adjustment.transaction_id, adjustment.new_balance
                );
            }
        },
        Command::Transactions { user, limit } => {
            for tx in engine.list_transactions_for_user(user, limit).await? {
                let amount = match tx.currency {
                    Some(currency) => format_minor_units(tx.amount_minor, currency),
                    None => format!("{} credits", tx.amount_minor),
                };
                println!(
                    "{} {} {} {} {} {}",
                    tx.created_at.format("%Y-%m-%d %H:%M:%S"),
                    tx.id,
                    tx.kind.as_str(),
                    tx.status.as_str(),
                    amount,
                    tx.external_id.as_deref().unwrap_or("-"),
                );
            }
        }
        Command::Audit { user, limit } => {
            for entry in engine.list_audit_for_user(user, limit).await? {
                println!(
                    "{} {} {} delta {} reason {}",
                    entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.actor.as_str(),
                    entry.action,
                    entry.amount_delta,
                    entry.reason.as_deref().unwrap_or("-"),
                );
            }
        }
    }

    Ok(())
}
