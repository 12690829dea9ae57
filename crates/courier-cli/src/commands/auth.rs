use anyhow::{Result, bail};
use courier_sdk::TokenStore;

pub fn login(store: &TokenStore, token: &str) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        bail!("Token must not be empty");
    }
    store.save(token)?;
    println!("Token saved to {}", store.path().display());
    Ok(())
}

pub fn logout(store: &TokenStore) -> Result<()> {
    store.clear()?;
    println!("Logged out");
    Ok(())
}
