use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,
    pub run_migrations: bool,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Supabase Auth
    pub supabase_jwt_jwks_url: String,
    pub supabase_jwt_issuer: String,
    pub supabase_jwt_audience: String,
    pub jwks_cache_ttl_seconds: u64,

    // Invoicing
    pub invoice_tax_rate: Decimal,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        // Database
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);
        let run_migrations = env::var("RUN_MIGRATIONS")
            .map(|s| parse_flag(&s))
            .unwrap_or(true);

        // CORS
        let cors_allow_origins = parse_origins(
            &env::var("CORS_ALLOW_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".to_string()),
        );

        // Supabase Auth
        let supabase_jwt_jwks_url =
            env::var("SUPABASE_JWT_JWKS_URL").context("SUPABASE_JWT_JWKS_URL must be set")?;
        let supabase_jwt_issuer =
            env::var("SUPABASE_JWT_ISSUER").context("SUPABASE_JWT_ISSUER must be set")?;
        let supabase_jwt_audience =
            env::var("SUPABASE_JWT_AUDIENCE").unwrap_or_else(|_| "authenticated".to_string());
        let jwks_cache_ttl_seconds = env::var("JWKS_CACHE_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1800); // 30 minutes default

        // Invoicing
        let invoice_tax_rate = match env::var("INVOICE_TAX_RATE") {
            Ok(raw) => parse_tax_rate(&raw)?,
            Err(_) => Decimal::ZERO,
        };

        Ok(Settings {
            env,
            server_addr,
            database_url,
            database_max_connections,
            run_migrations,
            cors_allow_origins,
            supabase_jwt_jwks_url,
            supabase_jwt_issuer,
            supabase_jwt_audience,
            jwks_cache_ttl_seconds,
            invoice_tax_rate,
        })
    }
}

fn parse_flag(s: &str) -> bool {
    !matches!(s.trim().to_lowercase().as_str(), "0" | "false" | "no" | "off")
}

fn parse_origins(s: &str) -> Vec<String> {
    s.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Tax rate as a fraction, e.g. `0.07`.
pub fn parse_tax_rate(s: &str) -> Result<Decimal> {
    let rate = Decimal::from_str(s.trim())
        .with_context(|| format!("INVOICE_TAX_RATE is not a decimal: {s:?}"))?;
    if rate.is_sign_negative() {
        bail!("INVOICE_TAX_RATE must not be negative: {rate}");
    }
    Ok(rate)
}
