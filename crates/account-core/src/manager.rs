//! Ownership of the authenticated account
//!
//! [`AccountManager`] is the single owner of the canonical [`Account`]. Every
//! other component either asks it a question (`is_authenticated`,
//! `authorization_header`, ...) or takes a cloned snapshot with
//! [`AccountManager::account`]. All mutations (authentication, token refresh,
//! revocation, logout) go through the manager and happen inside one write
//! critical section, so a reader never sees a token paired with the wrong
//! identity.
//!
//! Changes are announced on a broadcast channel:
//!
//! ```rust
//! use vimeo_account_core::{Account, AccountEvent, AccountManager, AppConfiguration};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let manager = AccountManager::new(AppConfiguration::new("client", "secret"));
//! let mut events = manager.subscribe();
//!
//! manager.set_account(Some(Account::new("abc123", Some("bearer".into()), None)));
//!
//! match events.recv().await.unwrap() {
//!     AccountEvent::AccountChanged { account, .. } => assert!(account.is_some()),
//!     other => panic!("unexpected event: {:?}", other),
//! }
//! assert!(manager.is_authenticated_with_client_credentials());
//! # }
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

use crate::account::Account;
use crate::config::AppConfiguration;
use crate::error::{AccountError, Result};
use crate::error_code::ApiError;
use crate::store::{AccountStore, FileAccountStore};
use crate::user::{User, UserJson};

/// Notifications emitted by [`AccountManager`]
///
/// `AccountChanged` events are sent in the same order as the writes they
/// describe, so the last one received matches [`AccountManager::account`].
#[derive(Debug, Clone)]
pub enum AccountEvent {
    /// The account was replaced, cleared, refreshed or revoked
    AccountChanged {
        account: Option<Account>,
        at: DateTime<Utc>,
    },
    /// A response reported that the access token is no longer valid
    InvalidTokenReceived { at: DateTime<Utc> },
    /// A response reported that the service is unavailable
    ServiceUnavailableReceived { at: DateTime<Utc> },
}

/// Owner of the canonical account
pub struct AccountManager {
    config: AppConfiguration,
    account: RwLock<Option<Account>>,
    store: Option<Arc<dyn AccountStore>>,
    event_tx: broadcast::Sender<AccountEvent>,
}

impl AccountManager {
    /// Create a manager without a backing store
    pub fn new(config: AppConfiguration) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            config,
            account: RwLock::new(None),
            store: None,
            event_tx,
        }
    }

    /// Create a manager, backed by a [`FileAccountStore`] when the
    /// configuration names a storage directory
    pub fn from_config(config: AppConfiguration) -> Self {
        let store = config
            .storage_directory
            .clone()
            .map(|directory| Arc::new(FileAccountStore::new(directory)) as Arc<dyn AccountStore>);

        let manager = Self::new(config);
        match store {
            Some(store) => manager.with_store(store),
            None => manager,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn AccountStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &AppConfiguration {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AccountEvent> {
        self.event_tx.subscribe()
    }

    /// Snapshot of the current account
    pub fn account(&self) -> Option<Account> {
        self.account.read().clone()
    }

    /// Identity of the current account, if any
    pub fn authenticated_user(&self) -> Option<User> {
        self.account.read().as_ref().and_then(Account::user).cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.account.read().as_ref().is_some_and(Account::is_authenticated)
    }

    pub fn is_authenticated_with_user(&self) -> bool {
        self.account
            .read()
            .as_ref()
            .is_some_and(Account::is_authenticated_with_user)
    }

    pub fn is_authenticated_with_client_credentials(&self) -> bool {
        self.account
            .read()
            .as_ref()
            .is_some_and(Account::is_authenticated_with_client_credentials)
    }

    /// `Authorization` header value for outgoing requests
    pub fn authorization_header(&self) -> Option<String> {
        self.account.read().as_ref().and_then(Account::authorization_header)
    }

    /// Install a new account, or clear it with `None`
    pub fn set_account(&self, account: Option<Account>) {
        let mut current = self.account.write();
        *current = account;

        match current.as_ref() {
            Some(account) if account.is_authenticated_with_user() => {
                info!("Authenticated account set (user session)")
            }
            Some(account) if account.is_authenticated() => {
                info!("Authenticated account set (client credentials)")
            }
            Some(_) => info!("Unauthenticated account set"),
            None => info!("Account cleared"),
        }

        // Sent under the write guard so events reach subscribers in write order
        self.emit(AccountEvent::AccountChanged {
            account: current.clone(),
            at: Utc::now(),
        });
    }

    /// Drop the current account (logout)
    pub fn clear(&self) {
        self.set_account(None);
    }

    /// Apply a token refresh to the current account.
    ///
    /// Returns `false` when there is no account to refresh.
    pub fn refresh_token(
        &self,
        access_token: impl Into<String>,
        token_type: Option<String>,
        scope: Option<String>,
    ) -> bool {
        self.mutate(|account| {
            account.refresh_credentials(access_token, token_type, scope);
            true
        })
    }

    /// Replace the identity payload of the current account.
    ///
    /// Returns `false` when there is no account.
    pub fn update_user_json(&self, user_json: Option<UserJson>) -> bool {
        self.mutate(|account| {
            account.set_user_json(user_json);
            true
        })
    }

    /// Mark the current credential as revoked.
    ///
    /// Returns `true` only if an active account was revoked.
    pub fn revoke(&self) -> bool {
        self.mutate(|account| {
            if account.is_invalid() {
                return false;
            }
            account.revoke();
            true
        })
    }

    /// React to a failed API response
    pub fn handle_error(&self, error: &ApiError) {
        if error.is_service_unavailable() {
            warn!("Service unavailable reported by API");
            self.emit(AccountEvent::ServiceUnavailableReceived { at: Utc::now() });
        } else if error.is_invalid_token() {
            warn!("Access token rejected by API, revoking account");
            self.revoke();
            self.emit(AccountEvent::InvalidTokenReceived { at: Utc::now() });
        }
    }

    /// Persist the current account, or remove the stored one if there is none
    pub async fn save(&self) -> Result<()> {
        let store = self.require_store()?;
        let key = &self.config.account_storage_key;

        let encoded = self.account().map(|account| account.to_json()).transpose()?;
        match encoded {
            Some(data) => store.set_data(key, &data).await?,
            None => store.delete_data_for_key(key).await?,
        }

        debug!("Saved account under key {}", key);
        Ok(())
    }

    /// Restore the persisted account and make it current.
    ///
    /// Leaves the current account untouched when nothing is stored.
    pub async fn load(&self) -> Result<Option<Account>> {
        let store = self.require_store()?;
        let key = &self.config.account_storage_key;

        let Some(data) = store.data_for_key(key).await? else {
            debug!("No stored account under key {}", key);
            return Ok(None);
        };

        let account = Account::from_json(&data)?;
        self.set_account(Some(account.clone()));
        Ok(Some(account))
    }

    /// Remove the persisted account and clear the current one
    pub async fn forget(&self) -> Result<()> {
        let store = self.require_store()?;
        store.delete_data_for_key(&self.config.account_storage_key).await?;
        self.clear();
        Ok(())
    }

    fn require_store(&self) -> Result<&Arc<dyn AccountStore>> {
        self.store
            .as_ref()
            .ok_or_else(|| AccountError::Storage("no account store configured".to_string()))
    }

    /// Run `f` on the current account under the write lock, announcing the
    /// change before the lock is released when `f` reports one
    fn mutate(&self, f: impl FnOnce(&mut Account) -> bool) -> bool {
        let mut current = self.account.write();
        let Some(account) = current.as_mut() else {
            return false;
        };
        if !f(account) {
            return false;
        }

        self.emit(AccountEvent::AccountChanged {
            account: current.clone(),
            at: Utc::now(),
        });
        true
    }

    fn emit(&self, event: AccountEvent) {
        if self.event_tx.send(event).is_err() {
            trace!("No account event subscribers");
        }
    }
}
