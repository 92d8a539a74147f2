use super::Claims;
use uuid::Uuid;

/// Authenticated technician, built from verified JWT claims
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// User ID (from JWT sub claim)
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Option<String>,
    pub issuer: String,
    pub audience: String,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Result<Self, &'static str> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid user ID in token")?;

        Ok(Self {
            user_id,
            email: claims.email.clone(),
            role: claims.role.clone(),
            issuer: claims.iss.clone(),
            audience: claims.aud.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            aud: "authenticated".into(),
            iss: "https://example.supabase.co/auth/v1".into(),
            iat: 1_700_000_000,
            exp: 1_700_003_600,
            nbf: None,
            email: Some("tech@example.com".into()),
            role: Some("authenticated".into()),
        }
    }

    #[test]
    fn context_from_claims() {
        let id = Uuid::new_v4();
        let ctx = AuthContext::from_claims(&claims(&id.to_string())).unwrap();
        assert_eq!(ctx.user_id, id);
        assert_eq!(ctx.email.as_deref(), Some("tech@example.com"));
    }

    #[test]
    fn non_uuid_subject_is_rejected() {
        assert!(AuthContext::from_claims(&claims("service-role")).is_err());
    }
}
