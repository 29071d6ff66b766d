//! Secure-channel configuration.
//!
//! The backend authenticates links with a public-key mechanism: the client
//! must present the server's public key and may present its own keypair
//! (one is generated server-side otherwise). The handshake itself happens
//! inside the transport during connection establishment; this module only
//! carries the key material to it. Key files hold one key per line; only
//! the first line is read.

use std::fs;
use std::path::Path;

use crate::TransportError;

/// Key material applied to a link before connecting.
///
/// An empty `LinkSecurity` (the default) means a plaintext link, which is
/// what local development servers run.
#[derive(Debug, Clone, Default)]
pub struct LinkSecurity {
    /// The server's public key. Presence of this key switches the link
    /// into secure mode.
    pub server_key: Option<String>,
    /// This client's public key.
    pub public_key: Option<String>,
    /// This client's secret key.
    pub secret_key: Option<String>,
}

impl LinkSecurity {
    /// Builds a config from optional key-file paths.
    ///
    /// # Errors
    /// Returns [`TransportError::KeyFile`] if a provided path cannot be read.
    pub fn from_key_files(
        server: Option<&Path>,
        public: Option<&Path>,
        secret: Option<&Path>,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            server_key: read_key(server)?,
            public_key: read_key(public)?,
            secret_key: read_key(secret)?,
        })
    }

    /// Whether this config requests a secure link at all.
    pub fn is_secure(&self) -> bool {
        self.server_key.is_some()
    }
}

fn read_key(path: Option<&Path>) -> Result<Option<String>, TransportError> {
    let Some(path) = path else {
        return Ok(None);
    };
    let contents = fs::read_to_string(path)?;
    Ok(contents.lines().next().map(|line| line.trim().to_owned()))
}
