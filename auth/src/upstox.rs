//! Upstox OAuth2 authentication with cached session tokens
//!
//! Upstox access tokens are issued through the v2 authorization-code flow
//! and expire daily. The handler keeps the active token in a JSON cache
//! file and only demands a fresh browser authorization when neither the
//! cache nor a refresh-token grant can produce a valid token.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const AUTH_DIALOG_URL: &str = "https://api.upstox.com/v2/login/authorization/dialog";
const TOKEN_URL: &str = "https://api.upstox.com/v2/login/authorization/token";

/// Tokens are treated as expired this many seconds early
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Assumed token lifetime when the vendor omits `expires_in`
const DEFAULT_TOKEN_TTL_SECS: i64 = 86_400;

/// Upstox API configuration
#[derive(Debug, Clone)]
pub struct UpstoxConfig {
    /// API key (client id) from the developer portal
    pub api_key: String,
    /// API secret (client secret)
    pub api_secret: String,
    /// Redirect URI — must match the developer portal registration exactly,
    /// including any trailing slash
    pub redirect_uri: String,
    /// Cache directory for storing tokens
    pub cache_dir: String,
}

impl UpstoxConfig {
    /// Create new configuration
    pub fn new(api_key: String, api_secret: String, redirect_uri: String) -> Self {
        let cache_dir =
            std::env::var("UPSTOX_CACHE_DIR").unwrap_or_else(|_| "./cache/upstox".to_string());

        Self {
            api_key,
            api_secret,
            redirect_uri,
            cache_dir,
        }
    }

    /// Load configuration from `UPSTOX_API_KEY` / `UPSTOX_API_SECRET` /
    /// `UPSTOX_REDIRECT_URI` environment variables
    pub fn from_env() -> Result<Self> {
        let api_key =
            std::env::var("UPSTOX_API_KEY").map_err(|_| anyhow!("UPSTOX_API_KEY not set"))?;
        let api_secret =
            std::env::var("UPSTOX_API_SECRET").map_err(|_| anyhow!("UPSTOX_API_SECRET not set"))?;
        let redirect_uri = std::env::var("UPSTOX_REDIRECT_URI")
            .unwrap_or_else(|_| "https://127.0.0.1:5000/callback/".to_string());

        Ok(Self::new(api_key, api_secret, redirect_uri))
    }

    /// Set cache directory
    #[must_use]
    pub fn with_cache_dir(mut self, dir: String) -> Self {
        self.cache_dir = dir;
        self
    }
}

/// Session cache for storing authentication tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCache {
    /// The access token for API authentication
    pub access_token: String,
    /// Refresh token, when the vendor issued one
    pub refresh_token: Option<String>,
    /// Timestamp when the token was generated
    pub generated_at: DateTime<Utc>,
    /// Timestamp when the token expires
    pub expires_at: DateTime<Utc>,
    /// Partial API key for identification
    pub api_key_partial: String,
}

impl SessionCache {
    /// Check if cache is still valid (not expired)
    #[must_use]
    pub fn is_valid(&self) -> bool {
        Utc::now() < self.expires_at
    }

    /// Get age of cache in hours
    #[must_use]
    pub fn age_hours(&self) -> f64 {
        let age = Utc::now().signed_duration_since(self.generated_at);
        age.num_seconds() as f64 / 3600.0
    }

    /// Get time until expiration in hours
    #[must_use]
    pub fn expires_in_hours(&self) -> f64 {
        let remaining = self.expires_at.signed_duration_since(Utc::now());
        remaining.num_seconds() as f64 / 3600.0
    }
}

/// Upstox authentication handler
pub struct UpstoxAuth {
    config: UpstoxConfig,
    http_client: Client,
    access_token: Arc<RwLock<Option<String>>>,
}

impl UpstoxAuth {
    /// Create new authentication handler
    pub fn new(config: UpstoxConfig) -> Result<Self> {
        let http_client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            config,
            http_client,
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    /// Authorization dialog URL the user must open in a browser for the
    /// initial (or forced) login
    #[must_use]
    pub fn authorize_url(&self) -> String {
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}",
            AUTH_DIALOG_URL,
            urlencoding::encode(&self.config.api_key),
            urlencoding::encode(&self.config.redirect_uri)
        )
    }

    /// Authenticate and get a valid access token
    ///
    /// Priority: valid cached token, then a refresh-token grant, then an
    /// error carrying the authorization URL (manual login required).
    pub async fn authenticate(&self) -> Result<String> {
        if let Some(cache) = self.load_cached_session() {
            if cache.is_valid() {
                info!(
                    "Using cached Upstox session (expires in {:.1} hours)",
                    cache.expires_in_hours()
                );
                *self.access_token.write().await = Some(cache.access_token.clone());
                return Ok(cache.access_token);
            }

            if let Some(refresh_token) = cache.refresh_token.clone() {
                info!("Cached token expired, attempting refresh-token grant");
                match self.refresh_access_token(&refresh_token).await {
                    Ok(renewed) => {
                        info!(
                            "Token refreshed, new token expires in {:.1} hours",
                            renewed.expires_in_hours()
                        );
                        *self.access_token.write().await = Some(renewed.access_token.clone());
                        return Ok(renewed.access_token);
                    }
                    Err(e) => {
                        warn!("Token refresh failed: {e:#}");
                    }
                }
            }

            warn!("Cached session expired and cannot be refreshed, removing cache");
            let _ = self.remove_cached_session();
        }

        Err(anyhow!(
            "no valid access token; authorize via {} then pass the code to exchange_code",
            self.authorize_url()
        ))
    }

    /// Exchange an authorization code for an access token and cache it
    ///
    /// The vendor matches the redirect URI byte-for-byte, so both the
    /// configured value and its trailing-slash twin are attempted.
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let trimmed = self.config.redirect_uri.trim_end_matches('/').to_string();
        let with_slash = format!("{trimmed}/");

        let mut redirect_uris = vec![self.config.redirect_uri.clone()];
        for candidate in [trimmed, with_slash] {
            if !redirect_uris.contains(&candidate) {
                redirect_uris.push(candidate);
            }
        }

        let mut last_error = anyhow!("no redirect URI candidates");
        for redirect_uri in &redirect_uris {
            debug!("Attempting token exchange with redirect_uri: {redirect_uri}");

            let params = [
                ("code", code),
                ("client_id", self.config.api_key.as_str()),
                ("client_secret", self.config.api_secret.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ];

            match self.request_token(&params).await {
                Ok(cache) => {
                    info!(
                        "Access token generated, expires in {:.1} hours (redirect_uri: {redirect_uri})",
                        cache.expires_in_hours()
                    );
                    let token = cache.access_token.clone();
                    self.save_session_cache(&cache)?;
                    *self.access_token.write().await = Some(token.clone());
                    return Ok(token);
                }
                Err(e) => {
                    warn!("Token exchange failed with redirect_uri {redirect_uri}: {e:#}");
                    last_error = e;
                }
            }
        }

        Err(last_error.context("token exchange failed for every redirect URI variant"))
    }

    /// Get the currently held access token
    pub async fn access_token(&self) -> Option<String> {
        self.access_token.read().await.clone()
    }

    /// Refresh an expired access token using the refresh-token grant
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<SessionCache> {
        let params = [
            ("client_id", self.config.api_key.as_str()),
            ("client_secret", self.config.api_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let mut cache = self.request_token(&params).await?;

        // The refresh response may omit the refresh token; keep the old one
        if cache.refresh_token.is_none() {
            cache.refresh_token = Some(refresh_token.to_string());
        }
        self.save_session_cache(&cache)?;
        Ok(cache)
    }

    /// POST to the token endpoint and convert the response into a session
    /// cache entry
    async fn request_token(&self, params: &[(&str, &str)]) -> Result<SessionCache> {
        let response = self
            .http_client
            .post(TOKEN_URL)
            .form(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("token endpoint returned HTTP {status}: {body}"));
        }

        let payload: Value = response.json().await?;
        let access_token = payload
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("access_token missing from token response"))?;

        let expires_in = payload
            .get("expires_in")
            .and_then(Value::as_i64)
            .unwrap_or(DEFAULT_TOKEN_TTL_SECS);

        let refresh_token = payload
            .get("refresh_token")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .or_else(|| {
                // Preserve a previously issued refresh token
                self.load_cached_session().and_then(|c| c.refresh_token)
            });

        let now = Utc::now();
        Ok(SessionCache {
            access_token: access_token.to_string(),
            refresh_token,
            generated_at: now,
            expires_at: now + chrono::Duration::seconds(expires_in - TOKEN_EXPIRY_MARGIN_SECS),
            api_key_partial: if self.config.api_key.len() > 8 {
                format!("{}...", &self.config.api_key[..8])
            } else {
                "partial".to_string()
            },
        })
    }

    /// Get cache file path
    fn cache_file_path(&self) -> String {
        let prefix: String = self.config.api_key.chars().take(8).collect();
        format!("{}/upstox_token_{}.json", self.config.cache_dir, prefix)
    }

    /// Load cached session if the cache file exists and parses
    fn load_cached_session(&self) -> Option<SessionCache> {
        let cache_path = self.cache_file_path();

        if !Path::new(&cache_path).exists() {
            debug!("No session cache file found at: {cache_path}");
            return None;
        }

        match fs::read_to_string(&cache_path) {
            Ok(content) => match serde_json::from_str::<SessionCache>(&content) {
                Ok(cache) => {
                    debug!(
                        "Found cached session generated {:.1} hours ago",
                        cache.age_hours()
                    );
                    Some(cache)
                }
                Err(e) => {
                    warn!("Failed to parse cached session: {e}");
                    let _ = self.remove_cached_session();
                    None
                }
            },
            Err(e) => {
                warn!("Failed to read cached session: {e}");
                None
            }
        }
    }

    /// Save session to cache
    fn save_session_cache(&self, cache: &SessionCache) -> Result<()> {
        fs::create_dir_all(&self.config.cache_dir)?;

        let cache_path = self.cache_file_path();
        let content = serde_json::to_string_pretty(cache)?;
        fs::write(&cache_path, content)?;

        info!("Session cached at: {cache_path}");
        Ok(())
    }

    /// Remove cached session file
    fn remove_cached_session(&self) -> Result<()> {
        let cache_path = self.cache_file_path();
        if Path::new(&cache_path).exists() {
            fs::remove_file(&cache_path)?;
            info!("Removed expired cached session");
        }
        Ok(())
    }
}
