use std::time::Duration;

use anyhow::Context;
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use time::OffsetDateTime;
use tracing::debug;

use crate::auth::claims::{ClaimSnapshot, Claims, Principal, TokenKind};
use crate::config::JwtConfig;
use crate::error::AppError;

const ALGORITHM: Algorithm = Algorithm::RS512;

/// RSA key pair and token lifetime, parsed once at startup.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
}

impl JwtKeys {
    pub fn from_pem(private_pem: &str, public_pem: &str, access_ttl: Duration) -> anyhow::Result<Self> {
        let encoding = EncodingKey::from_rsa_pem(private_pem.as_bytes()).context("parse private key")?;
        let decoding = DecodingKey::from_rsa_pem(public_pem.as_bytes()).context("parse public key")?;

        // Expiry is checked by hand against an explicit clock, without leeway.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding,
            decoding,
            validation,
            access_ttl,
        })
    }

    pub fn from_config(cfg: &JwtConfig) -> anyhow::Result<Self> {
        Self::from_pem(&cfg.private_key_pem, &cfg.public_key_pem, cfg.access_ttl)
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Refresh tokens outlive their access token by a quarter of its lifetime.
    pub fn refresh_ttl(&self) -> Duration {
        self.access_ttl.saturating_add(self.access_ttl / 4)
    }

    fn sign(&self, snapshot: &ClaimSnapshot, kind: TokenKind, now: OffsetDateTime) -> Result<String, AppError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl(),
            TokenKind::Refresh => self.refresh_ttl(),
        };
        let exp = time::Duration::try_from(ttl)
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("token lifetime out of range")))?;
        let claims = Claims {
            sub: snapshot.id,
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            kind,
            data: snapshot.clone(),
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("sign jwt")))?;
        debug!(user_id = %snapshot.id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    /// Mints an (access, refresh) pair carrying the same snapshot.
    pub fn issue_pair_at(&self, snapshot: &ClaimSnapshot, now: OffsetDateTime) -> Result<(String, String), AppError> {
        let access = self.sign(snapshot, TokenKind::Access, now)?;
        let refresh = self.sign(snapshot, TokenKind::Refresh, now)?;
        Ok((access, refresh))
    }

    /// Verifies signature, then expiry, then decodes the claims. Nothing in
    /// the payload is looked at before the signature checks out.
    pub fn decode_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, AppError> {
        if token.split('.').count() != 3 {
            return Err(AppError::MalformedToken("expected three segments"));
        }
        decode_header(token).map_err(|_| AppError::MalformedToken("unreadable header"))?;

        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(classify)?;
        if now.unix_timestamp() >= data.claims.exp {
            return Err(AppError::Expired);
        }
        Ok(data.claims)
    }

    pub fn verify_access_at(&self, token: &str, now: OffsetDateTime) -> Result<Principal, AppError> {
        let claims = self.decode_at(token, now)?;
        if claims.kind != TokenKind::Access {
            return Err(AppError::MalformedToken("access token required"));
        }
        debug!(user_id = %claims.sub, "access token verified");
        Ok(claims.data.into())
    }

    pub fn verify_refresh_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, AppError> {
        let claims = self.decode_at(token, now)?;
        if claims.kind != TokenKind::Refresh {
            return Err(AppError::MalformedToken("refresh token required"));
        }
        Ok(claims)
    }

    pub fn verify_access(&self, token: &str) -> Result<Principal, AppError> {
        self.verify_access_at(token, OffsetDateTime::now_utc())
    }
}

// The header has already been read, so base64 failures here come from the
// signature segment and are treated as a bad signature.
fn classify(err: jsonwebtoken::errors::Error) -> AppError {
    match err.kind() {
        ErrorKind::InvalidToken => AppError::MalformedToken("invalid structure"),
        ErrorKind::Json(_) | ErrorKind::Utf8(_) | ErrorKind::MissingRequiredClaim(_) => {
            AppError::MalformedClaims
        }
        ErrorKind::ExpiredSignature => AppError::Expired,
        _ => AppError::InvalidSignature,
    }
}
