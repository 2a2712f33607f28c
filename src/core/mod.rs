/// Role capabilities and access checks
pub mod access;
/// Registration, authentication and account lookups
pub mod account;
/// Persisted credit submission, audit and listings
pub mod credit;
/// CPF and CNPJ validation and formatting
pub mod identifier;
/// Credit state machine and pure lifecycle operations
pub mod lifecycle;
/// Dashboard summaries and display formatting
pub mod report;
/// Acting identity and the persisted login session
pub mod session;
/// Purchases and the public trade ledger
pub mod trade;
