use tracing::warn;

use crate::Result;

/// Hashes on the blocking pool; bcrypt is deliberately slow.
pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_owned();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

/// A hash bcrypt cannot parse is a mismatch, not an error.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await?;
    Ok(outcome.unwrap_or_else(|e| {
        warn!(error = %e, "Stored password hash is unreadable");
        false
    }))
}
