//! Account lifecycle example for account-core
//!
//! This example demonstrates:
//! - Loading app configuration from `VIMEO_*` variables (with a fallback)
//! - Accepting a token response as an account
//! - Reacting to an invalid-token response
//! - Refreshing, persisting and restoring the account

use std::collections::HashMap;

use anyhow::Result;
use tracing::Level;
use vimeo_account_core::{
    parameters_from_query_string, setup_logging, Account, AccountEvent, AccountManager, ApiError,
    AppConfiguration, LoggingConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging(LoggingConfig::new(Level::DEBUG, "account-lifecycle"))?;

    let storage = tempfile::tempdir()?;
    let config = AppConfiguration::from_env()
        .or_else(|_| {
            AppConfiguration::from_env_map(HashMap::from([
                ("VIMEO_CLIENT_IDENTIFIER".to_string(), "demo-client".to_string()),
                ("VIMEO_CLIENT_SECRET".to_string(), "demo-secret".to_string()),
            ]))
        })?
        .with_storage_directory(storage.path());

    let manager = AccountManager::from_config(config);
    let mut events = manager.subscribe();
    let watcher = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                AccountEvent::AccountChanged { account, at } => println!(
                    "[{}] account changed, authenticated: {}",
                    at,
                    account.as_ref().is_some_and(Account::is_authenticated)
                ),
                AccountEvent::InvalidTokenReceived { at } => println!("[{}] token rejected", at),
                AccountEvent::ServiceUnavailableReceived { at } => {
                    println!("[{}] service unavailable", at)
                }
            }
        }
    });

    // The redirect of a code grant carries the state we sent
    let redirect = parameters_from_query_string("?code=a1b2c3&state=demo").unwrap_or_default();
    println!("Redirect parameters: {:?}", redirect);

    let account: Account = serde_json::from_str(
        r#"{
            "access_token": "abc123",
            "token_type": "bearer",
            "scope": "public private",
            "user": {"uri": "/users/152184", "name": "Demo User"}
        }"#,
    )?;
    manager.set_account(Some(account));
    println!("User session: {}", manager.is_authenticated_with_user());

    manager.handle_error(
        &ApiError::from_status(401).with_www_authenticate("Bearer error=\"invalid_token\""),
    );
    println!("Authenticated after rejection: {}", manager.is_authenticated());

    manager.refresh_token("def456", None, None);
    manager.save().await?;

    let restored = AccountManager::from_config(manager.config().clone());
    restored.load().await?;
    println!(
        "Restored header: {}",
        restored.authorization_header().unwrap_or_default()
    );

    drop(manager);
    watcher.await?;
    Ok(())
}
