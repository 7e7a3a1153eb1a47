//! Environment/runtime helpers
//!
//! Startup checks for integration secrets. Missing keys only degrade the
//! matching feature, so they are reported rather than treated as fatal.

use tracing::warn;

/// Environment keys whose absence disables an outbound integration.
pub const INTEGRATION_KEYS: &[&str] = &[
    "PAYSTACK_SECRET_KEY",
    "ZEPTO_API_KEY",
    "CLOUDINARY_CLOUD_NAME",
    "CLOUDINARY_API_KEY",
    "CLOUDINARY_API_SECRET",
];

/// Return the keys that are unset or blank according to `lookup`.
pub fn missing_keys<'a, F>(keys: &[&'a str], lookup: F) -> Vec<&'a str>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter()
        .copied()
        .filter(|k| lookup(k).map(|v| v.trim().is_empty()).unwrap_or(true))
        .collect()
}

/// Warn once per missing integration key in the process environment.
pub fn ensure_env(keys: &[&str]) -> anyhow::Result<()> {
    for key in missing_keys(keys, |k| std::env::var(k).ok()) {
        warn!(%key, "environment variable not set; dependent feature is disabled");
    }
    Ok(())
}
