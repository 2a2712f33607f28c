//! Unified error type for `EcoTrade`.
//!
//! Every fallible operation in the crate returns [`Result`]. Variants carry enough
//! context to render a user-facing message; [`Error::kind`] separates plain input
//! validation from invariant violations and infrastructure failures.

use crate::core::identifier::DocumentKind;
use crate::entities::{CreditStatus, Role};
use chrono::NaiveDate;
use thiserror::Error;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range user input
    Validation,
    /// Missing or insufficient credentials
    Auth,
    /// A referenced record does not exist
    NotFound,
    /// A concurrent writer changed the record first
    Conflict,
    /// Invariant violation or infrastructure failure
    Internal,
}

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Document number failed length or check-digit validation
    #[error("Invalid {kind} document: {value}")]
    InvalidDocument {
        /// Expected document kind
        kind: DocumentKind,
        /// Value as supplied
        value: String,
    },

    /// Quantity is not a finite positive number
    #[error("Invalid quantity: {quantity} (must be a positive number of tons)")]
    InvalidQuantity {
        /// Quantity as supplied
        quantity: f64,
    },

    /// Price is not a finite positive number
    #[error("Invalid price: {price} (must be a positive amount per ton)")]
    InvalidPrice {
        /// Price as supplied
        price: f64,
    },

    /// Generation date lies after today
    #[error("Generation date {date} cannot be in the future")]
    FutureGenerationDate {
        /// Date as supplied
        date: NaiveDate,
    },

    /// A required text field is blank
    #[error("Field '{field}' is required")]
    MissingField {
        /// Field name
        field: &'static str,
    },

    /// Password and confirmation differ
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Password shorter than the configured minimum
    #[error("Password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum accepted length
        min: usize,
    },

    /// Email already belongs to an account
    #[error("Email already registered: {email}")]
    EmailTaken {
        /// Duplicate email
        email: String,
    },

    /// No account with this email
    #[error("Account not found: {email}")]
    AccountNotFound {
        /// Email that was looked up
        email: String,
    },

    /// Password does not match the stored credential
    #[error("Invalid password")]
    InvalidPassword,

    /// Operation requires a logged-in session
    #[error("Not logged in")]
    NotAuthenticated,

    /// Acting role may not perform the operation
    #[error("Role '{role}' is not allowed to {action}")]
    Forbidden {
        /// Role of the acting account
        role: Role,
        /// What was attempted
        action: &'static str,
    },

    /// No credit with this id
    #[error("Credit not found: {id}")]
    CreditNotFound {
        /// Credit id that was looked up
        id: String,
    },

    /// Audit attempted on a credit that already has a decision
    #[error("Credit {id} was already audited (status: {status})")]
    AlreadyAudited {
        /// Credit id
        id: String,
        /// Current status
        status: CreditStatus,
    },

    /// Trade requests more tons than the credit has left
    #[error("Requested {requested} t exceeds available {available} t")]
    ExceedsAvailable {
        /// Tons requested
        requested: f64,
        /// Tons available
        available: f64,
    },

    /// Trade attempted on a credit that is not approved
    #[error("Credit {id} is not tradable (status: {status})")]
    NotTradable {
        /// Credit id
        id: String,
        /// Current status
        status: CreditStatus,
    },

    /// Version-checked update matched no row
    #[error("Credit {id} was modified concurrently (expected version {expected_version})")]
    StaleRecord {
        /// Credit id
        id: String,
        /// Version the writer read
        expected_version: i32,
    },
}

impl Error {
    /// Classifies the error for reporting.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDocument { .. }
            | Self::InvalidQuantity { .. }
            | Self::InvalidPrice { .. }
            | Self::FutureGenerationDate { .. }
            | Self::MissingField { .. }
            | Self::PasswordMismatch
            | Self::PasswordTooShort { .. }
            | Self::EmailTaken { .. }
            | Self::AlreadyAudited { .. }
            | Self::ExceedsAvailable { .. } => ErrorKind::Validation,
            Self::InvalidPassword | Self::NotAuthenticated | Self::Forbidden { .. } => {
                ErrorKind::Auth
            }
            Self::AccountNotFound { .. } | Self::CreditNotFound { .. } => ErrorKind::NotFound,
            Self::StaleRecord { .. } => ErrorKind::Conflict,
            Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::EnvVar(_)
            | Self::NotTradable { .. } => ErrorKind::Internal,
        }
    }

    /// True for errors that should be shown to the user as-is.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Internal)
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
