//! HTTP server configuration object.

use std::net::SocketAddr;

use url::Url;

/// Configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) public_base: Url,
}

impl ServerConfig {
    /// Construct a server configuration.
    ///
    /// `public_base` is the externally visible base of the API (including
    /// the `/api/v1/` prefix) used to mint pagination links.
    #[must_use]
    pub const fn new(bind_addr: SocketAddr, public_base: Url) -> Self {
        Self {
            bind_addr,
            public_base,
        }
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Return the public base URL for pagination links.
    #[must_use]
    pub const fn public_base(&self) -> &Url {
        &self.public_base
    }
}
