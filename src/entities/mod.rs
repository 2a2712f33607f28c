//! Entity module - `SeaORM` definitions for the marketplace tables.
//! Accounts own credits, credits yield trades, and `system_state` holds scalars
//! such as the active session. Each entity has a Model struct for data and an
//! Entity struct for operations.

pub mod account;
pub mod credit;
pub mod system_state;
pub mod trade;

pub use account::{Column as AccountColumn, Entity as Account, Model as AccountModel, Role};
pub use credit::{
    Column as CreditColumn, CreditStatus, Entity as Credit, Model as CreditModel,
};
pub use system_state::{
    Column as SystemStateColumn, Entity as SystemState, Model as SystemStateModel,
};
pub use trade::{Column as TradeColumn, Entity as Trade, Model as TradeModel};
