//! Account entity - A registered marketplace participant.
//!
//! Each account has a role that gates what it may do, a validated tax document
//! (CPF or CNPJ) stored in punctuated form, and a salted password hash.
//! Accounts are unique by email and are not modified after registration.

use crate::core::identifier::DocumentKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marketplace role of an account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Generates carbon credits and submits them for audit
    #[sea_orm(string_value = "producer")]
    Producer,
    /// Buys approved carbon credits
    #[sea_orm(string_value = "company")]
    Company,
    /// Audits pending credits
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Role {
    /// Lowercase name as stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Producer => "producer",
            Self::Company => "company",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// UUID of the account
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Name shown on credits and trades
    pub display_name: String,
    /// Login email, unique across accounts
    #[sea_orm(unique)]
    pub email: String,
    /// Hex SHA-256 of salt and password
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Per-account random salt
    #[serde(skip_serializing)]
    pub password_salt: String,
    /// Marketplace role
    pub role: Role,
    /// Whether `document` is a CPF or a CNPJ
    pub document_kind: DocumentKind,
    /// Document in punctuated display form
    pub document: String,
    /// When the account registered
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Account and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One producer account owns many credits
    #[sea_orm(has_many = "super::credit::Entity")]
    Credits,
}

impl Related<super::credit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Credits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
