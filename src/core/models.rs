use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use super::types::{ClientId, RedirectUri};

/// Per-client login portal configuration.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct LoginConfig {
    pub id: ClientId,
    pub name: String,
    #[serde(default)]
    pub branding: Branding,
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub auth_options: Vec<AuthOption>,
    #[serde(default)]
    pub permissions: Vec<PermissionDefinition>,
    #[serde(default)]
    pub session_key_signer_address: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing)]
    pub redirect_uris: Vec<String>,
}

impl LoginConfig {
    /// An empty allowlist accepts any absolute URL.
    pub fn allows_redirect(&self, uri: &RedirectUri) -> bool {
        self.redirect_uris.is_empty() || self.redirect_uris.iter().any(|u| u == &uri.0)
    }

    pub fn allows_chain(&self, chain_id: u64) -> bool {
        self.chain_id.map_or(true, |c| c == chain_id)
    }

    pub fn default_permissions(&self, now: DateTime<Utc>) -> Permissions {
        let values = self
            .permissions
            .iter()
            .map(|def| (def.id.clone(), def.kind.default_value(now)))
            .collect();
        Permissions(values)
    }

    /// Checks submitted permission values against the definitions. Unknown
    /// ids are dropped and missing ones take their default.
    pub fn resolve_permissions(
        &self,
        submitted: &Permissions,
        now: DateTime<Utc>,
    ) -> Result<Permissions, PermissionError> {
        let mut resolved = BTreeMap::new();

        for def in &self.permissions {
            let value = match submitted.0.get(&def.id) {
                Some(value) => def.kind.check(&def.id, value, now)?,
                None => def.kind.default_value(now),
            };
            resolved.insert(def.id.clone(), value);
        }

        Ok(Permissions(resolved))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Branding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthOption {
    Wallet,
    Email,
    Phone,
    Google,
    Apple,
    Passkey,
}

#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct PermissionDefinition {
    pub id: String,
    pub label: String,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: PermissionKind,
}

#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PermissionKind {
    Toggle { default: bool },
    SpendLimit { default: f64, currency: String },
    Expiration { default_days: u32 },
}

impl PermissionKind {
    fn default_value(&self, now: DateTime<Utc>) -> PermissionValue {
        match self {
            Self::Toggle { default } => PermissionValue::Toggle(*default),
            Self::SpendLimit { default, .. } => PermissionValue::SpendLimit(*default),
            Self::Expiration { default_days } => {
                PermissionValue::Expiration(now + Duration::days(i64::from(*default_days)))
            }
        }
    }

    fn check(
        &self,
        id: &str,
        value: &PermissionValue,
        now: DateTime<Utc>,
    ) -> Result<PermissionValue, PermissionError> {
        use PermissionValue::*;

        match (self, value) {
            (Self::Toggle { .. }, Toggle(_)) => Ok(value.clone()),
            (Self::SpendLimit { .. }, SpendLimit(limit)) if limit.is_finite() && *limit >= 0.0 => {
                Ok(value.clone())
            }
            (Self::SpendLimit { .. }, SpendLimit(_)) => {
                Err(PermissionError::OutOfRange(id.to_string()))
            }
            (Self::Expiration { .. }, Expiration(at)) if *at > now => Ok(value.clone()),
            (Self::Expiration { .. }, Expiration(_)) => {
                Err(PermissionError::OutOfRange(id.to_string()))
            }
            _ => Err(PermissionError::WrongType(id.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum PermissionValue {
    Toggle(bool),
    SpendLimit(f64),
    Expiration(DateTime<Utc>),
}

/// Granted value per permission id.
#[derive(Debug, Clone, Default, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Permissions(pub BTreeMap<String, PermissionValue>);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PermissionError {
    #[error("permission `{0}` has the wrong type")]
    WrongType(String),
    #[error("permission `{0}` is out of range")]
    OutOfRange(String),
}
