use std::collections::BTreeMap;
use std::path::Path;

use crate::auth::ClientStore;
use crate::core::models::{
    AuthOption, Branding, LoginConfig, PermissionDefinition, PermissionKind,
};
use crate::core::types::ClientId;

#[derive(Debug, thiserror::Error)]
pub enum ClientsFileError {
    #[error("failed to read clients file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse clients file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// On-disk layout of `--clients-file`.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ClientsFile {
    #[serde(default)]
    pub clients: Vec<LoginConfig>,
    #[serde(default)]
    pub default: Option<LoginConfig>,
}

/// In-memory client configuration. Unknown client ids fall back to the
/// default configuration, if one is set, under the requested id.
#[derive(Debug, Clone, Default)]
pub struct StaticClientStore {
    clients: BTreeMap<ClientId, LoginConfig>,
    fallback: Option<LoginConfig>,
}

impl StaticClientStore {
    pub fn new(clients: Vec<LoginConfig>, fallback: Option<LoginConfig>) -> Self {
        let clients = clients.into_iter().map(|c| (c.id.clone(), c)).collect();
        Self { clients, fallback }
    }

    /// The `demo` client and the catch-all default.
    pub fn builtin() -> Self {
        Self::new(vec![demo_client()], Some(default_client()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClientsFileError> {
        let contents = std::fs::read(path)?;
        let file: ClientsFile = serde_json::from_slice(&contents)?;
        Ok(Self::new(file.clients, file.default))
    }
}

impl ClientStore for StaticClientStore {
    fn get_client(&self, client_id: &ClientId) -> Option<LoginConfig> {
        if let Some(client) = self.clients.get(client_id) {
            return Some(client.clone());
        }

        self.fallback.clone().map(|mut fallback| {
            fallback.id = client_id.clone();
            fallback
        })
    }

    fn list_clients(&self) -> Vec<LoginConfig> {
        self.clients.values().cloned().collect()
    }

    fn restricts_redirects(&self) -> bool {
        self.clients
            .values()
            .chain(self.fallback.iter())
            .any(|c| !c.redirect_uris.is_empty())
    }
}

fn demo_client() -> LoginConfig {
    LoginConfig {
        id: ClientId("demo".to_string()),
        name: "Demo App".to_string(),
        branding: Branding {
            logo_url: None,
            accent_color: Some("#3385FF".to_string()),
        },
        chain_id: Some(84532),
        auth_options: vec![AuthOption::Wallet, AuthOption::Email, AuthOption::Google],
        permissions: vec![
            PermissionDefinition {
                id: "sign_transactions".to_string(),
                label: "Sign transactions on your behalf".to_string(),
                description: None,
                kind: PermissionKind::Toggle { default: true },
            },
            PermissionDefinition {
                id: "spend_limit".to_string(),
                label: "Spending limit".to_string(),
                description: Some("Maximum amount the app may spend per day".to_string()),
                kind: PermissionKind::SpendLimit {
                    default: 0.1,
                    currency: "ETH".to_string(),
                },
            },
            PermissionDefinition {
                id: "expiration".to_string(),
                label: "Access expires".to_string(),
                description: None,
                kind: PermissionKind::Expiration { default_days: 7 },
            },
        ],
        session_key_signer_address: None,
        redirect_uris: Vec::new(),
    }
}

fn default_client() -> LoginConfig {
    LoginConfig {
        id: ClientId("default".to_string()),
        name: "Unknown app".to_string(),
        branding: Branding::default(),
        chain_id: None,
        auth_options: vec![AuthOption::Wallet],
        permissions: Vec::new(),
        session_key_signer_address: None,
        redirect_uris: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_demo_client() {
        let store = StaticClientStore::builtin();
        let demo = store.get_client(&ClientId("demo".to_string())).unwrap();
        assert_eq!(demo.name, "Demo App");
        assert_eq!(demo.permissions.len(), 3);
        assert_eq!(store.list_clients().len(), 1);
    }

    #[test]
    fn unknown_client_takes_the_default_under_its_own_id() {
        let store = StaticClientStore::builtin();
        let other = store.get_client(&ClientId("someone".to_string())).unwrap();
        assert_eq!(other.id, ClientId("someone".to_string()));
        assert_eq!(other.name, "Unknown app");
    }

    #[test]
    fn without_fallback_unknown_clients_are_missing() {
        let store = StaticClientStore::new(vec![demo_client()], None);
        assert!(store.get_client(&ClientId("someone".to_string())).is_none());
    }

    #[test]
    fn clients_file_layout() {
        let file: ClientsFile = serde_json::from_str(
            r#"{
                "clients": [{
                    "id": "shop",
                    "name": "Shop",
                    "chain_id": 1,
                    "auth_options": ["wallet", "passkey"],
                    "permissions": [
                        {"id": "pay", "label": "Pay", "type": "toggle", "default": false}
                    ],
                    "session_key_signer_address": "0x000000000000000000000000000000000000dEaD",
                    "redirect_uris": ["https://shop.example/callback"]
                }]
            }"#,
        )
        .unwrap();
        let store = StaticClientStore::new(file.clients, file.default);
        let shop = store.get_client(&ClientId("shop".to_string())).unwrap();

        assert_eq!(shop.chain_id, Some(1));
        assert_eq!(shop.redirect_uris, vec!["https://shop.example/callback"]);
        assert!(store.get_client(&ClientId("demo".to_string())).is_none());
        assert!(store.restricts_redirects());
    }

    #[test]
    fn builtin_clients_accept_any_redirect() {
        assert!(!StaticClientStore::builtin().restricts_redirects());
    }
}
