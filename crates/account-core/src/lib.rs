//! # Account-Core - Authenticated account handling for the Vimeo networking client
//!
//! This crate provides the account descriptor returned by a token exchange,
//! the identity object it carries, and the manager that owns the current
//! account for the rest of the client:
//!
//! - [`Account`] - access token, token type, scope and user payload, with the
//!   authentication-state queries used when authorizing requests
//! - [`User`] / [`IdentityDecoder`] - the end-user identity decoded from the payload
//! - [`AccountManager`] - single owner of the current account; hands out
//!   snapshots and announces changes
//! - [`AccountStore`] - persistence seam for the account record
//!
//! Transport, OAuth grant flows and keychain integration live outside this crate.

pub mod account;
pub mod config;
pub mod error;
pub mod error_code;
pub mod logging;
pub mod manager;
pub mod params;
pub mod store;
pub mod user;

pub use account::{Account, AccountState};
pub use config::AppConfiguration;
pub use error::{AccountError, Result};
pub use error_code::{ApiError, HttpStatusCode, LocalErrorCode, VimeoErrorCode};
pub use logging::{setup_logging, LoggingConfig};
pub use manager::{AccountEvent, AccountManager};
pub use params::parameters_from_query_string;
pub use store::{AccountStore, FileAccountStore, MemoryAccountStore};
pub use user::{IdentityDecoder, JsonIdentityDecoder, User, UserJson};
