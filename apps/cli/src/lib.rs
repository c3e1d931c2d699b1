//! # azure-secrets
//!
//! Demo client for a `Users` table whose columns are protected with Always
//! Encrypted, using column master keys held in Azure Key Vault.
//!
//! Configuration comes from the environment: `AZURE_TENANT_ID`,
//! `AZURE_CLIENT_ID`, `AZURE_CLIENT_SECRET` and `DB_CONNECTION_STRING`.

pub mod demo;
pub mod users;

pub use users::{NewUser, User, Users};
