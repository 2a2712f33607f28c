//! Command-line surface for the marketplace.
//!
//! Each subcommand maps onto one core operation. Handlers return the text to print
//! so they can be driven from tests against an in-memory database; `main` owns
//! the actual printing and error reporting.

use crate::{
    config::marketplace::Config,
    core::{
        access::Capability,
        account::{self, NewAccount},
        credit,
        identifier::DocumentKind,
        lifecycle::{AuditOutcome, NewCredit},
        report,
        session::{self, Session},
        trade,
    },
    entities::{CreditStatus, Role},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use sea_orm::DatabaseConnection;
use std::path::PathBuf;

/// Top-level arguments
#[derive(Debug, Parser)]
#[command(name = "ecotrade")]
#[command(about = "EcoTrade - Carbon credit marketplace", long_about = None)]
pub struct Cli {
    /// Path to config.toml (defaults to ./config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Marketplace commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a producer or company account
    Register {
        /// Name shown on credits and trades
        #[arg(long)]
        name: String,
        /// Login email
        #[arg(long)]
        email: String,
        /// Password
        #[arg(long)]
        password: String,
        /// Password typed again
        #[arg(long)]
        confirm_password: String,
        /// Account type
        #[arg(long, value_enum)]
        role: RoleArg,
        /// Kind of tax document
        #[arg(long, value_enum, default_value = "cpf")]
        document_type: DocumentArg,
        /// Document number, punctuation optional
        #[arg(long)]
        document: String,
    },

    /// Log in and remember the session
    Login {
        /// Login email
        #[arg(long)]
        email: String,
        /// Password
        #[arg(long)]
        password: String,
    },

    /// Forget the current session
    Logout,

    /// Show the logged-in account
    Whoami,

    /// Credit submission and audit
    #[command(subcommand)]
    Credit(CreditCommands),

    /// List approved credits open for purchase
    Market,

    /// Buy tons from an approved credit (companies)
    Buy {
        /// Credit id
        #[arg(value_name = "CREDIT_ID")]
        credit_id: String,
        /// Tons to buy
        #[arg(long)]
        quantity: f64,
    },

    /// Public trade history
    Trades {
        /// Case-insensitive match on seller, buyer or trade id
        #[arg(long)]
        search: Option<String>,
    },

    /// Summary for the logged-in account's role
    Dashboard,

    /// List registered accounts (admins)
    Accounts,
}

/// Credit subcommands
#[derive(Debug, Subcommand)]
pub enum CreditCommands {
    /// Submit a new credit for audit (producers)
    Submit {
        /// Tons of CO2 offset
        #[arg(long)]
        quantity: f64,
        /// Where the offset was generated
        #[arg(long)]
        origin: String,
        /// Generation date, YYYY-MM-DD
        #[arg(long)]
        generated_at: NaiveDate,
        /// Asking price per ton in BRL
        #[arg(long)]
        price: f64,
    },

    /// List credits: your own as a producer, all of them as an admin
    List {
        /// Only credits in this status
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },

    /// Approve or reject a pending credit (admins)
    Audit {
        /// Credit id
        #[arg(value_name = "CREDIT_ID")]
        credit_id: String,
        /// Decision
        #[arg(long, value_enum)]
        decision: DecisionArg,
        /// Note shown to the producer
        #[arg(long)]
        comment: Option<String>,
    },
}

/// Roles open to self-registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    /// Sells credits
    Producer,
    /// Buys credits
    Company,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Producer => Self::Producer,
            RoleArg::Company => Self::Company,
        }
    }
}

/// Tax document kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DocumentArg {
    /// Individual (11 digits)
    Cpf,
    /// Organization (14 digits)
    Cnpj,
}

impl From<DocumentArg> for DocumentKind {
    fn from(value: DocumentArg) -> Self {
        match value {
            DocumentArg::Cpf => Self::Individual,
            DocumentArg::Cnpj => Self::Organization,
        }
    }
}

/// Credit status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    /// Waiting for audit
    Pending,
    /// Open for purchase
    Approved,
    /// Refused at audit
    Rejected,
    /// Fully bought
    Sold,
}

impl From<StatusArg> for CreditStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Pending => Self::Pending,
            StatusArg::Approved => Self::Approved,
            StatusArg::Rejected => Self::Rejected,
            StatusArg::Sold => Self::Sold,
        }
    }
}

/// Audit decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DecisionArg {
    /// Open the credit for trading
    Approve,
    /// Refuse the credit
    Reject,
}

impl From<DecisionArg> for AuditOutcome {
    fn from(value: DecisionArg) -> Self {
        match value {
            DecisionArg::Approve => Self::Approve,
            DecisionArg::Reject => Self::Reject,
        }
    }
}

/// Sales shown on the producer dashboard.
const RECENT_SALES: usize = 5;

async fn require_session(db: &DatabaseConnection) -> Result<Session> {
    session::current_session(db)
        .await?
        .ok_or(Error::NotAuthenticated)
}

/// Runs one command and returns the text to show the user.
pub async fn execute(db: &DatabaseConnection, config: &Config, command: Commands) -> Result<String> {
    match command {
        Commands::Register {
            name,
            email,
            password,
            confirm_password,
            role,
            document_type,
            document,
        } => {
            let input = NewAccount {
                display_name: name,
                email,
                password,
                password_confirmation: confirm_password,
                role: role.into(),
                document_kind: document_type.into(),
                document,
            };
            let created = account::register_account(db, input, &config.registration).await?;
            Ok(format!(
                "✓ Registered {} ({}) as {}. You can now log in.",
                created.display_name, created.email, created.role
            ))
        }
        Commands::Login { email, password } => {
            let session = session::login(db, &email, &password).await?;
            Ok(format!(
                "✓ Logged in as {} ({})",
                session.display_name, session.role
            ))
        }
        Commands::Logout => {
            session::logout(db).await?;
            Ok("✓ Logged out".to_string())
        }
        Commands::Whoami => Ok(match session::current_session(db).await? {
            Some(s) => format!(
                "{} <{}>\nRole: {}\n{}: {}",
                s.display_name, s.email, s.role, s.document_kind, s.document
            ),
            None => "Not logged in".to_string(),
        }),
        Commands::Credit(cmd) => execute_credit(db, cmd).await,
        Commands::Market => {
            let credits = credit::get_approved_credits(db).await?;
            Ok(render_credits(&credits, "No credits available for purchase."))
        }
        Commands::Buy {
            credit_id,
            quantity,
        } => {
            let session = require_session(db).await?;
            let execution = trade::purchase_credit(db, &session, &credit_id, quantity).await?;
            let mut out = format!(
                "✓ Bought {} for {}",
                report::format_tons(execution.trade.quantity_tons),
                report::format_brl(execution.trade.total_price)
            );
            if execution.credit.status == CreditStatus::Sold {
                out.push_str("\nThe credit is now sold out.");
            } else {
                out.push_str(&format!(
                    "\n{} remain on this credit.",
                    report::format_tons(execution.credit.quantity_tons)
                ));
            }
            Ok(out)
        }
        Commands::Trades { search } => {
            // Totals cover the whole ledger; the search only narrows the listing
            let summary = report::market_summary(db).await?;
            let trades = trade::search_trades(db, search.as_deref().unwrap_or_default()).await?;
            let mut out = format!(
                "{} trades | {} | {} | average {}/t",
                summary.trade_count,
                report::format_tons(summary.total_volume),
                report::format_brl(summary.total_value),
                report::format_brl(summary.average_price),
            );
            for t in &trades {
                out.push_str(&format!("\n{} | {}", t.id, report::format_trade_summary(t)));
            }
            Ok(out)
        }
        Commands::Dashboard => {
            let session = require_session(db).await?;
            render_dashboard(db, &session).await
        }
        Commands::Accounts => {
            let session = require_session(db).await?;
            session.require(Capability::ListAccounts)?;
            let accounts = account::list_accounts(db).await?;
            Ok(accounts
                .iter()
                .map(|a| {
                    format!(
                        "{} | {} | {} | {} {} | since {}",
                        a.display_name,
                        a.email,
                        a.role,
                        a.document_kind,
                        a.document,
                        a.created_at.format("%d/%m/%Y")
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}

async fn execute_credit(db: &DatabaseConnection, command: CreditCommands) -> Result<String> {
    let session = require_session(db).await?;
    match command {
        CreditCommands::Submit {
            quantity,
            origin,
            generated_at,
            price,
        } => {
            let input = NewCredit {
                quantity_tons: quantity,
                origin,
                generated_at,
                unit_price: price,
            };
            let created = credit::submit_credit(db, &session, input).await?;
            Ok(format!(
                "✓ Credit {} submitted for audit ({} @ {}/t)",
                created.id,
                report::format_tons(created.quantity_tons),
                report::format_brl(created.unit_price)
            ))
        }
        CreditCommands::List { status } => {
            session.require(Capability::ListCredits)?;
            let credits = if session.role == Role::Admin {
                match status {
                    Some(s) => credit::get_credits_by_status(db, s.into()).await?,
                    None => credit::get_all_credits(db).await?,
                }
            } else {
                let mine = credit::get_credits_by_owner(db, &session.account_id).await?;
                match status {
                    Some(s) => {
                        let wanted = CreditStatus::from(s);
                        mine.into_iter().filter(|c| c.status == wanted).collect()
                    }
                    None => mine,
                }
            };
            Ok(render_credits(&credits, "No credits found."))
        }
        CreditCommands::Audit {
            credit_id,
            decision,
            comment,
        } => {
            let outcome = AuditOutcome::from(decision);
            let updated = credit::audit_credit(db, &session, &credit_id, outcome, comment).await?;
            Ok(format!("✓ Credit {} is now {}", updated.id, updated.status))
        }
    }
}

fn render_credits(credits: &[crate::entities::CreditModel], empty: &str) -> String {
    if credits.is_empty() {
        return empty.to_string();
    }
    credits
        .iter()
        .map(report::format_credit_summary)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_trades(trades: &[&crate::entities::TradeModel], empty: &str) -> String {
    if trades.is_empty() {
        return empty.to_string();
    }
    trades
        .iter()
        .map(|t| report::format_trade_summary(t))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn render_dashboard(db: &DatabaseConnection, session: &Session) -> Result<String> {
    let body = match session.role {
        Role::Producer => {
            let s = report::producer_summary(db, session).await?;
            let trades = trade::get_trades_for_account(db, &session.account_id).await?;
            let sales: Vec<_> = trades
                .iter()
                .filter(|t| t.seller_account_id == session.account_id)
                .take(RECENT_SALES)
                .collect();
            format!(
                "Available: {}\nSold: {}\nPending audit: {}\nRevenue: {}\n\nRecent sales:\n{}",
                report::format_tons(s.available_tons),
                report::format_tons(s.sold_tons),
                s.pending_count,
                report::format_brl(s.revenue),
                render_trades(&sales, "No sales yet.")
            )
        }
        Role::Company => {
            let s = report::company_summary(db, session).await?;
            let trades = trade::get_trades_for_account(db, &session.account_id).await?;
            let purchases: Vec<_> = trades
                .iter()
                .filter(|t| t.buyer_account_id == session.account_id)
                .collect();
            format!(
                "Purchased: {}\nCarbon offset: {}\nTotal spent: {}\nPurchases: {}\n\nPurchase history:\n{}",
                report::format_tons(s.purchased_tons),
                report::format_tons(s.purchased_tons),
                report::format_brl(s.total_spent),
                s.purchase_count,
                render_trades(&purchases, "No purchases yet.")
            )
        }
        Role::Admin => {
            let s = report::admin_summary(db, session).await?;
            format!(
                "Pending audit: {}\nApproved: {}\nTotal volume: {}\nTrades: {}\nAccounts: {}",
                s.pending_count,
                s.approved_count,
                report::format_tons(s.total_volume),
                s.trade_count,
                s.account_count
            )
        }
    };
    Ok(format!("{} ({})\n{body}", session.display_name, session.role))
}
