use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Type of JWT: access or refresh.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    #[serde(alias = "Access", alias = "ACCESS")]
    Access,
    #[serde(alias = "Refresh", alias = "REFRESH")]
    Refresh,
}

/// Account flavour carried in every token and in the propagated identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    Personal,
    Enterprise,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Personal => "PERSONAL",
            UserType::Enterprise => "ENTERPRISE",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PERSONAL" => Ok(UserType::Personal),
            "ENTERPRISE" => Ok(UserType::Enterprise),
            other => anyhow::bail!("unknown user type: {other}"),
        }
    }
}

/// JWT payload shared by every service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: i64,            // user ID
    pub user_type: UserType, // personal or enterprise
    pub iat: i64,            // issued at (unix timestamp)
    pub exp: i64,            // expires at (unix timestamp)
    pub iss: String,         // issuer
    pub aud: String,         // audience
    pub kind: TokenKind,     // token type
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_wire_shape() {
        let claims = Claims {
            sub: 7,
            user_type: UserType::Enterprise,
            iat: 100,
            exp: 200,
            iss: "iss".into(),
            aud: "aud".into(),
            kind: TokenKind::Refresh,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["sub"], 7);
        assert_eq!(json["user_type"], "ENTERPRISE");
        assert_eq!(json["kind"], "refresh");
    }

    #[test]
    fn user_type_parses_case_insensitively() {
        assert_eq!("personal".parse::<UserType>().unwrap(), UserType::Personal);
        assert_eq!(" ENTERPRISE ".parse::<UserType>().unwrap(), UserType::Enterprise);
        assert!("admin".parse::<UserType>().is_err());
    }
}
