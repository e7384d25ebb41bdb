//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables
//! - CLI arguments (applied by the binary on top of the above)
//!
//! # File Format
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 12345
//!
//! [client]
//! host = "127.0.0.1"
//! port = 12345
//! identity = "alice"          # optional; greeting names this identity
//! # secret = "..."            # optional; overrides the identity's secret
//!
//! [transport]
//! framing = "length-prefixed" # or "raw"
//! receive_timeout_secs = 30   # 0 waits forever
//!
//! [auth]
//! secret = "pass123"          # default shared secret
//!
//! [auth.identities]
//! alice = "alice-secret"
//!
//! [auth.credentials]
//! admin = "pass123"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::SharedSecret;
use crate::error::{AuthError, Result};
use crate::identity::{
    Credential, MemoryIdentityStore, DEFAULT_IDENTITY, DEFAULT_PASSWORD, DEFAULT_SECRET,
    DEFAULT_USERNAME,
};
use crate::transport::{
    Framing, TransportConfig, DEFAULT_MAX_FRAME_SIZE, DEFAULT_MAX_READ_SIZE, DEFAULT_PORT,
};

/// Main configuration struct
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server (listening side) configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Client (dialling side) configuration
    #[serde(default)]
    pub client: ClientConfig,

    /// Transport configuration
    #[serde(default)]
    pub transport: TransportSettings,

    /// Secrets and credentials
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| AuthError::Config(format!("Failed to read config file: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AuthError::Config(format!("Failed to parse config: {e}")))
    }

    /// Default config file location (`<config dir>/authshake/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("authshake").join("config.toml"))
    }

    /// Load from `path` if given, else from the default location if it
    /// exists, else defaults; then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => {
                    tracing::debug!("Loading config from {}", path.display());
                    Self::from_file(path)?
                }
                None => Self::default(),
            },
        };

        Ok(config.apply_env())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Apply `AUTHSHAKE_*` environment variables
    pub fn apply_env(self) -> Self {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(host) = lookup("AUTHSHAKE_HOST") {
            self.client.host = host;
        }
        if let Some(bind) = lookup("AUTHSHAKE_BIND") {
            self.server.host = bind;
        }
        if let Some(port) = lookup("AUTHSHAKE_PORT") {
            match port.parse() {
                Ok(port) => {
                    self.server.port = port;
                    self.client.port = port;
                }
                Err(_) => tracing::warn!("Ignoring invalid AUTHSHAKE_PORT: {}", port),
            }
        }
        if let Some(secret) = lookup("AUTHSHAKE_SECRET") {
            self.auth.secret = secret.clone();
            self.client.secret = Some(secret);
        }
        if let Some(identity) = lookup("AUTHSHAKE_IDENTITY") {
            self.client.identity = Some(identity);
        }
        if let Some(secs) = lookup("AUTHSHAKE_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(secs) => self.transport.receive_timeout_secs = secs,
                Err(_) => tracing::warn!("Ignoring invalid AUTHSHAKE_TIMEOUT_SECS: {}", secs),
            }
        }
        if let Some(framing) = lookup("AUTHSHAKE_FRAMING") {
            match framing.parse() {
                Ok(framing) => self.transport.framing = framing,
                Err(e) => tracing::warn!("Ignoring AUTHSHAKE_FRAMING: {}", e),
            }
        }

        self
    }

    /// Identity store for the server role.
    ///
    /// The default secret is stored first under `"default"` so it is the
    /// fallback for unknown identities, unless `auth.default_identity`
    /// names another one.
    pub fn identity_store(&self) -> Result<MemoryIdentityStore> {
        let mut store =
            MemoryIdentityStore::new().with_secret(DEFAULT_IDENTITY, self.auth.secret.as_str());

        for (identity, secret) in &self.auth.identities {
            store.add_secret(identity.as_str(), secret.as_str());
        }
        for (username, password) in &self.auth.credentials {
            store.add_credential(Credential::new(username.as_str(), password.as_str()));
        }

        if let Some(default) = &self.auth.default_identity {
            if !store.set_default(default) {
                return Err(AuthError::Config(format!(
                    "Default identity '{}' has no secret",
                    default
                )));
            }
        }

        Ok(store)
    }

    /// Secret the client answers challenges with.
    ///
    /// Resolution order: `client.secret` (set by `--secret` or
    /// `AUTHSHAKE_SECRET`), then the configured identity's entry in
    /// `auth.identities`, then the default secret.
    pub fn client_secret(&self) -> SharedSecret {
        let identity_secret = || {
            self.client
                .identity
                .as_ref()
                .and_then(|id| self.auth.identities.get(id))
        };

        self.client
            .secret
            .as_ref()
            .or_else(identity_secret)
            .map(|s| SharedSecret::from(s.as_str()))
            .unwrap_or_else(|| SharedSecret::from(self.auth.secret.as_str()))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server", &self.server)
            .field("client", &self.client)
            .field("transport", &self.transport)
            .field("auth", &self.auth)
            .finish()
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Get the full listen address
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        parse_addr(&self.host, self.port)
    }
}

/// Client configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server host to connect to
    pub host: String,

    /// Server port
    pub port: u16,

    /// Identity named in the greeting (`"hello"` when unset)
    pub identity: Option<String>,

    /// Secret override; wins over any per-identity secret
    pub secret: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            identity: None,
            secret: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("identity", &self.identity)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ClientConfig {
    /// Get the server address
    pub fn server_addr(&self) -> Result<SocketAddr> {
        parse_addr(&self.host, self.port)
    }
}

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    /// Message framing
    pub framing: Framing,

    /// Receive timeout in seconds (0 = wait forever)
    pub receive_timeout_secs: u64,

    /// Maximum bytes per raw read
    pub max_read_size: usize,

    /// Maximum frame size in length-prefixed mode
    pub max_frame_size: usize,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            framing: Framing::default(),
            receive_timeout_secs: 30,
            max_read_size: DEFAULT_MAX_READ_SIZE,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl TransportSettings {
    /// Runtime transport configuration
    pub fn to_transport_config(&self) -> TransportConfig {
        TransportConfig {
            framing: self.framing,
            max_read_size: self.max_read_size,
            max_frame_size: self.max_frame_size,
            ..Default::default()
        }
        .with_receive_timeout(Duration::from_secs(self.receive_timeout_secs))
    }
}

/// Secrets and credentials
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Default shared secret
    pub secret: String,

    /// Per-identity shared secrets
    pub identities: BTreeMap<String, String>,

    /// Plaintext credentials, username to password
    pub credentials: BTreeMap<String, String>,

    /// Fallback identity for unknown greetings
    pub default_identity: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            identities: BTreeMap::new(),
            credentials: default_credentials(),
            default_identity: None,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Don't leak secrets in debug output
        f.debug_struct("AuthConfig")
            .field("secret", &"[REDACTED]")
            .field("identities", &self.identities.keys().collect::<Vec<_>>())
            .field("credentials", &self.credentials.keys().collect::<Vec<_>>())
            .field("default_identity", &self.default_identity)
            .finish()
    }
}

fn default_credentials() -> BTreeMap<String, String> {
    BTreeMap::from([(DEFAULT_USERNAME.to_string(), DEFAULT_PASSWORD.to_string())])
}

fn parse_addr(host: &str, port: u16) -> Result<SocketAddr> {
    format!("{host}:{port}")
        .parse()
        .map_err(|e| AuthError::Config(format!("Invalid address {host}:{port}: {e}")))
}
