//! Environment configuration
//!
//! Secrets are base64-encoded 32-byte keys. Debug builds fall back to
//! random secrets when a key is not set.

use anyhow::{Context, bail};
use auth::AuthConfig;
use platform::cookie::SameSite;
use std::env;
use std::time::Duration;

/// Build the auth config from environment variables
pub fn auth_config_from_env() -> anyhow::Result<AuthConfig> {
    let base = if cfg!(debug_assertions) {
        AuthConfig::development()
    } else {
        AuthConfig::default()
    };
    auth_config_from(base, |key| env::var(key).ok())
}

/// Overlay variables from `lookup` on top of `base`
pub fn auth_config_from(
    base: AuthConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<AuthConfig> {
    let mut config = base;
    let require_secrets = !cfg!(debug_assertions);

    match lookup("APP_KEY") {
        Some(value) => config.url_signing_key = decode_key("APP_KEY", &value)?,
        None if require_secrets => bail!("APP_KEY must be set in production"),
        None => {}
    }

    match lookup("SESSION_SECRET") {
        Some(value) => config.session_secret = decode_key("SESSION_SECRET", &value)?,
        None if require_secrets => bail!("SESSION_SECRET must be set in production"),
        None => {}
    }

    if let Some(url) = lookup("APP_URL") {
        config.app_url = url.trim_end_matches('/').to_string();
    }

    if let Some(path) = lookup("LANDING_PATH") {
        config.landing_path = path;
    }

    if let Some(minutes) = lookup("VERIFICATION_TTL_MINUTES") {
        config.verification_ttl = ttl_minutes("VERIFICATION_TTL_MINUTES", &minutes)?;
    }

    if let Some(minutes) = lookup("PASSWORD_RESET_TTL_MINUTES") {
        config.password_reset_ttl = ttl_minutes("PASSWORD_RESET_TTL_MINUTES", &minutes)?;
    }

    if let Some(pepper) = lookup("PASSWORD_PEPPER") {
        let bytes = platform::crypto::from_base64(&pepper).context("PASSWORD_PEPPER is not base64")?;
        config.password_pepper = Some(bytes);
    }

    if let Some(secure) = lookup("COOKIE_SECURE") {
        config.cookie_secure = secure
            .parse()
            .context("COOKIE_SECURE must be true or false")?;
    }

    if let Some(same_site) = lookup("COOKIE_SAME_SITE") {
        config.cookie_same_site = same_site
            .parse::<SameSite>()
            .map_err(anyhow::Error::msg)?;
    }

    Ok(config)
}

fn decode_key(name: &str, value: &str) -> anyhow::Result<[u8; 32]> {
    let bytes = platform::crypto::from_base64(value.trim())
        .with_context(|| format!("{name} is not base64"))?;
    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| anyhow::anyhow!("{name} must be 32 bytes (got {})", bytes.len()))
}

fn ttl_minutes(name: &str, raw: &str) -> anyhow::Result<Duration> {
    let minutes: u64 = raw
        .parse()
        .with_context(|| format!("{name} must be a whole number of minutes"))?;
    if minutes == 0 {
        bail!("{name} must be positive");
    }
    Ok(Duration::from_secs(minutes * 60))
}
