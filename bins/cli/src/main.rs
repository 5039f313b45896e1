//! Amarra operator CLI.
//!
//! Analyzes bank statement exports, confirms matched transfers as payments
//! and inspects member balances against the PostgreSQL store.

mod commands;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use amarra_core::store::PaymentMethod;
use amarra_shared::AppConfig;
use amarra_shared::AppError;
use amarra_shared::config::LoggingConfig;
use amarra_shared::types::{InvoiceId, MemberId};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "amarra", version, about = "Bank statement reconciliation for member invoices")]
struct Cli {
    /// Print JSON instead of text where the command supports it.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and match a statement file without writing anything
    Analyze {
        /// Statement export (tab-separated text)
        file: PathBuf,
    },

    /// Analyze a statement and confirm the matched movements as payments
    Confirm {
        /// Statement export (tab-separated text)
        file: PathBuf,

        /// Also confirm name-based (probable) matches
        #[arg(long)]
        include_probable: bool,
    },

    /// Print the account timeline of a member
    Timeline {
        /// Member ID
        member: MemberId,
    },

    /// Show the credit balance of a member
    Credit {
        /// Member ID
        member: MemberId,
    },

    /// Apply a member's credit to open invoices, oldest first
    ApplyCredit {
        /// Member ID
        member: MemberId,

        /// Only apply to this invoice
        #[arg(long)]
        invoice: Option<InvoiceId>,
    },

    /// Register a payment received outside the bank statement
    Pay {
        /// Member ID
        member: MemberId,

        /// Amount, e.g. 30000 or 30000.50
        amount: Decimal,

        /// Payment method
        #[arg(long, value_enum)]
        method: MethodArg,

        /// Payment date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum MethodArg {
    Cash,
    Check,
    Debit,
    Credit,
    Transfer,
}

impl From<MethodArg> for PaymentMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Cash => Self::Cash,
            MethodArg::Check => Self::Check,
            MethodArg::Debit => Self::DebitCard,
            MethodArg::Credit => Self::CreditCard,
            MethodArg::Transfer => Self::BankTransfer,
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.filter.as_str()));
    let json = logging.json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();
}

async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let ctx = commands::Context::connect(&config, cli.json).await?;

    match cli.command {
        Command::Analyze { file } => commands::analyze(&ctx, &file).await,
        Command::Confirm {
            file,
            include_probable,
        } => commands::confirm(&ctx, &file, include_probable).await,
        Command::Timeline { member } => commands::timeline(&ctx, member).await,
        Command::Credit { member } => commands::credit(&ctx, member).await,
        Command::ApplyCredit { member, invoice } => {
            commands::apply_credit(&ctx, member, invoice).await
        }
        Command::Pay {
            member,
            amount,
            method,
            date,
            notes,
        } => commands::pay(&ctx, member, amount, method.into(), date, notes).await,
    }
}

fn exit_status(err: &anyhow::Error) -> u8 {
    let code = err.downcast_ref::<AppError>().map_or(1, AppError::exit_code);
    u8::try_from(code).unwrap_or(1)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            let err = anyhow::Error::from(AppError::from(err));
            eprintln!("error: {err:#}");
            return ExitCode::from(exit_status(&err));
        }
    };
    init_tracing(&config.logging);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("error: {err:#}");
            ExitCode::from(exit_status(&err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_pay_arguments() {
        let member = MemberId::new();
        let cli = Cli::try_parse_from([
            "amarra",
            "pay",
            &member.to_string(),
            "30000.50",
            "--method",
            "debit",
            "--date",
            "2024-11-03",
        ])
        .unwrap();

        match cli.command {
            Command::Pay {
                member: parsed,
                amount,
                method,
                date,
                notes,
            } => {
                assert_eq!(parsed, member);
                assert_eq!(amount, rust_decimal_macros::dec!(30000.50));
                assert_eq!(PaymentMethod::from(method), PaymentMethod::DebitCard);
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 11, 3));
                assert!(notes.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_method_is_rejected() {
        let member = MemberId::new().to_string();
        let result = Cli::try_parse_from(["amarra", "pay", &member, "100", "--method", "barter"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_exit_code_follows_app_error() {
        let err = anyhow::Error::from(AppError::Conflict("already processed".into()));
        assert_eq!(exit_status(&err), 4);
        assert_eq!(exit_status(&anyhow::anyhow!("io")), 1);
    }
}
