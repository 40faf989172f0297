use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use tracing::debug;

use super::claims::Claims;

/// Why a token string could not be turned back into claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed token")]
    Malformed,
    #[error("token signature does not match")]
    SignatureInvalid,
}

/// HS256 JWT encoding and decoding bound to one signing secret.
///
/// Decoding checks structure, signature, issuer and audience. Expiry is left
/// to the verifier so that it can be evaluated against an explicit clock.
#[derive(Clone)]
pub struct TokenCodec {
    header: Header,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &[u8], issuer: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);

        Self {
            header: Header::new(Algorithm::HS256),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&self.header, claims, &self.encoding)
    }

    pub fn decode(&self, token: &str) -> Result<Claims, DecodeError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!(error = %e, "jwt decode failed");
            match e.kind() {
                ErrorKind::InvalidSignature => DecodeError::SignatureInvalid,
                _ => DecodeError::Malformed,
            }
        })?;

        let claims = data.claims;
        if claims.sub <= 0 || claims.exp <= claims.iat {
            debug!(sub = claims.sub, iat = claims.iat, exp = claims.exp, "jwt claims out of range");
            return Err(DecodeError::Malformed);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::{TokenKind, UserType};

    const SECRET: &[u8] = b"codec-test-secret-that-is-long-enough!";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, "test-issuer", "test-aud")
    }

    fn claims() -> Claims {
        Claims {
            sub: 42,
            user_type: UserType::Personal,
            iat: 1_700_000_000,
            exp: 1_700_000_600,
            iss: "test-issuer".into(),
            aud: "test-aud".into(),
            kind: TokenKind::Access,
        }
    }

    #[test]
    fn encode_is_deterministic_and_decodes_back() {
        let codec = codec();
        let a = codec.encode(&claims()).expect("encode");
        let b = codec.encode(&claims()).expect("encode");
        assert_eq!(a, b);
        assert_eq!(codec.decode(&a).expect("decode"), claims());
    }

    #[test]
    fn decode_ignores_expiry() {
        // 2023 timestamps are long past; the codec must still accept them.
        let codec = codec();
        let token = codec.encode(&claims()).unwrap();
        assert!(codec.decode(&token).is_ok());
    }

    #[test]
    fn non_token_strings_are_malformed() {
        let codec = codec();
        for input in ["", "not-a-token", "a.b", "a.b.c", "....."] {
            assert_eq!(codec.decode(input), Err(DecodeError::Malformed), "{input:?}");
        }
    }

    #[test]
    fn altered_signature_is_rejected() {
        let codec = codec();
        let token = codec.encode(&claims()).unwrap();
        let (head, sig) = token.rsplit_once('.').unwrap();
        let mut sig: Vec<char> = sig.chars().collect();
        sig[4] = if sig[4] == 'A' { 'B' } else { 'A' };
        let tampered = format!("{head}.{}", sig.into_iter().collect::<String>());

        assert_eq!(codec.decode(&tampered), Err(DecodeError::SignatureInvalid));
    }

    #[test]
    fn forged_payload_is_rejected() {
        let codec = codec();
        let token = codec.encode(&claims()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let mut forged = claims();
        forged.sub = 1;
        forged.user_type = UserType::Enterprise;
        let forged_token = codec.encode(&forged).unwrap();
        let forged_payload = forged_token.split('.').nth(1).unwrap();

        let spliced = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);
        assert_eq!(codec.decode(&spliced), Err(DecodeError::SignatureInvalid));
    }

    #[test]
    fn other_secret_is_signature_invalid() {
        let token = codec().encode(&claims()).unwrap();
        let other = TokenCodec::new(b"a-completely-different-secret-value!!", "test-issuer", "test-aud");
        assert_eq!(other.decode(&token), Err(DecodeError::SignatureInvalid));
    }

    #[test]
    fn foreign_issuer_or_audience_is_malformed() {
        let token = codec().encode(&claims()).unwrap();
        let other_iss = TokenCodec::new(SECRET, "someone-else", "test-aud");
        let other_aud = TokenCodec::new(SECRET, "test-issuer", "someone-else");
        assert_eq!(other_iss.decode(&token), Err(DecodeError::Malformed));
        assert_eq!(other_aud.decode(&token), Err(DecodeError::Malformed));
    }

    #[test]
    fn out_of_range_claims_are_malformed() {
        let codec = codec();

        let mut zero_sub = claims();
        zero_sub.sub = 0;
        let token = codec.encode(&zero_sub).unwrap();
        assert_eq!(codec.decode(&token), Err(DecodeError::Malformed));

        let mut inverted = claims();
        inverted.exp = inverted.iat;
        let token = codec.encode(&inverted).unwrap();
        assert_eq!(codec.decode(&token), Err(DecodeError::Malformed));
    }
}
