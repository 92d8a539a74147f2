//! JWKS cache for Supabase JWT verification

use anyhow::{Context, Result};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::Claims;

/// Minimum spacing between two JWKS fetches
const REFETCH_COOLDOWN: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

#[derive(Clone)]
struct CachedKey {
    key: DecodingKey,
    cached_at: Instant,
}

/// Verifies Supabase access tokens against the project's signing keys
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

/// RSA keys from a JWKS document, by key id. Other key types and keys
/// without modulus/exponent are skipped.
fn rsa_keys(jwks: JwksResponse) -> Vec<(String, DecodingKey)> {
    jwks.keys
        .into_iter()
        .filter(|jwk| jwk.kty == "RSA")
        .filter_map(|jwk| {
            let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
                tracing::warn!(kid = %jwk.kid, "JWK without RSA components");
                return None;
            };
            match DecodingKey::from_rsa_components(n, e) {
                Ok(key) => Some((jwk.kid, key)),
                Err(err) => {
                    tracing::warn!(kid = %jwk.kid, error = %err, "Failed to parse JWK");
                    None
                }
            }
        })
        .collect()
}

impl JwksCache {
    pub fn new(jwks_url: String, issuer: String, audience: String, ttl_seconds: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client for JWKS")?;

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

    /// Verify a JWT and return its claims
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
                if last.elapsed() < REFETCH_COOLDOWN {
                    return Ok(());
                }
            }
        }

        tracing::debug!(url = %self.jwks_url, "Fetching JWKS");

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
        let keys = rsa_keys(jwks);

        let mut cache = self.inner.write();
        let now = Instant::now();
        cache.last_fetch = Some(now);
        for (kid, key) in keys {
            cache.keys.insert(kid, CachedKey { key, cached_at: now });
        }

        tracing::info!(keys = cache.keys.len(), "JWKS cache refreshed");
        Ok(())
    }

    /// Pre-warm the cache by fetching keys
    pub async fn warm_cache(&self) -> Result<()> {
        self.refresh_keys().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rsa_keys_are_kept() {
        let jwks: JwksResponse = serde_json::from_value(serde_json::json!({
            "keys": [
                {"kid": "ec-1", "kty": "EC", "crv": "P-256", "x": "abc", "y": "def"},
                {"kid": "rsa-no-modulus", "kty": "RSA", "e": "AQAB"},
                {
                    "kid": "rsa-1",
                    "kty": "RSA",
                    "alg": "RS256",
                    "n": "qKejm2LFAqBh2RpAHrACQ6ytFmzZ-6ipphdsip5H81wlGzwOoy3jXkIpDk-pF3IE7MGAy0RhQwKgwpecdTfbCAQIg-dvFIrb1eGViBKPQKqPUm973WmfCSt_DfuqmPU_LLN48EspVPHDj3YD5c-27sMbn-SFvN6wsvHwH5SS_9JvF2EmzphNTqaUEsZUqXsKe6A2jHJ5d7oe4X3oGd4W-Tlv9Mk1hjP0-4Hj12_6rFyoRRQgBi4--op8u5wP6-uO6d4eiB2ZFebB8IflfxB-CW2Dsm93Q07TFkUFfJWLDSLbF1uipuWARY0gIf2_uJw8Sb9KmVf_z5eOdd1jeGcZbQ",
                    "e": "AQAB"
                }
            ]
        }))
        .unwrap();

        let kids: Vec<String> = rsa_keys(jwks).into_iter().map(|(kid, _)| kid).collect();
        assert_eq!(kids, vec!["rsa-1".to_string()]);
    }

    #[tokio::test]
    async fn malformed_token_fails_before_fetching_keys() {
        let cache = JwksCache::new(
            "http://127.0.0.1:1/jwks.json".into(),
            "issuer".into(),
            "authenticated".into(),
            60,
        )
        .unwrap();
        assert!(cache.verify_token("not-a-jwt").await.is_err());
        assert!(cache.inner.read().last_fetch.is_none());
    }
}
