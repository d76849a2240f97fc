//! JWKS cache for JWT verification
//!
//! Keys are fetched from the identity provider's JWKS endpoint and cached
//! in-process. A signing-key rotation shows up as an unknown `kid`, which
//! triggers a refresh before the token is rejected.

use anyhow::{Context, Result};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::Claims;

/// JWKS response structure
#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

/// Individual JWK key
#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    n: String,
    e: String,
}

/// Cached key with expiration
#[derive(Clone)]
struct CachedKey {
    key: DecodingKey,
    cached_at: Instant,
}

/// JWKS cache for validating bearer JWTs
#[derive(Clone)]
pub struct JwksCache {
    inner: Arc<RwLock<JwksCacheInner>>,
    http: reqwest::Client,
    jwks_url: String,
    issuer: String,
    audience: String,
    ttl: Duration,
}

struct JwksCacheInner {
    keys: HashMap<String, CachedKey>,
    last_fetch: Option<Instant>,
}

impl JwksCache {
    /// The cache owns its HTTP client; it is the only outbound HTTP caller
    /// in the service.
    pub fn new(
        jwks_url: String,
        issuer: String,
        audience: String,
        ttl_seconds: u64,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create JWKS HTTP client")?;

        Ok(Self {
            inner: Arc::new(RwLock::new(JwksCacheInner {
                keys: HashMap::new(),
                last_fetch: None,
            })),
            http,
            jwks_url,
            issuer,
            audience,
            ttl: Duration::from_secs(ttl_seconds),
        })
    }

    /// Verify a JWT token and return the claims
    pub async fn verify_token(&self, token: &str) -> Result<Claims> {
        let header = decode_header(token).context("Invalid JWT header")?;
        let kid = header.kid.context("JWT missing kid header")?;

        let decoding_key = self.get_or_fetch_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.validate_exp = true;
        validation.validate_nbf = true;

        let token_data =
            decode::<Claims>(token, &decoding_key, &validation).context("JWT validation failed")?;

        Ok(token_data.claims)
    }

    async fn get_or_fetch_key(&self, kid: &str) -> Result<DecodingKey> {
        {
            let cache = self.inner.read();
            if let Some(cached) = cache.keys.get(kid) {
                if cached.cached_at.elapsed() < self.ttl {
                    return Ok(cached.key.clone());
                }
            }
        }

        // Unknown or stale kid. Refresh and retry once.
        self.refresh_keys().await?;

        let cache = self.inner.read();
        cache
            .keys
            .get(kid)
            .map(|c| c.key.clone())
            .context("Key not found in JWKS")
    }

    async fn refresh_keys(&self) -> Result<()> {
        {
            let cache = self.inner.read();
            if let Some(last) = cache.last_fetch {
                // Don't refetch more than once per second
                if last.elapsed() < Duration::from_secs(1) {
                    return Ok(());
                }
            }
        }

        tracing::debug!("Fetching JWKS from {}", self.jwks_url);

        let response = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .context("Failed to fetch JWKS")?;

        if !response.status().is_success() {
            anyhow::bail!("JWKS fetch failed with status: {}", response.status());
        }

        let jwks: JwksResponse = response.json().await.context("Failed to parse JWKS")?;

        let mut cache = self.inner.write();
        cache.last_fetch = Some(Instant::now());

        for jwk in jwks.keys {
            if jwk.kty != "RSA" {
                continue;
            }

            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    cache.keys.insert(
                        jwk.kid.clone(),
                        CachedKey {
                            key,
                            cached_at: Instant::now(),
                        },
                    );
                    tracing::debug!("Cached JWKS key: {}", jwk.kid);
                }
                Err(e) => {
                    tracing::warn!("Failed to parse JWK {}: {}", jwk.kid, e);
                }
            }
        }

        tracing::info!("JWKS cache refreshed with {} keys", cache.keys.len());
        Ok(())
    }

    /// Pre-warm the cache by fetching keys
    pub async fn warm_cache(&self) -> Result<()> {
        self.refresh_keys().await
    }
}
