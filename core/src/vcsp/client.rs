//! VCSP client. Only the liveness check is exposed; VCSP documents no
//! exception tags, so every error body is reported as a server error unless
//! the gateway rejected the credentials.

use std::sync::Arc;

use crate::client::ServiceClient;
use crate::config::{ClientOptions, Settings};
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::target::{Api, Target};
use crate::taxonomy::NoTaxonomy;

use super::endpoints;

/// Status VCSP answers `alive` with.
pub const ALIVE_STATUS: u16 = 204;

/// Synchronous client for the VCSP API.
#[derive(Debug, Clone)]
pub struct VcspClient {
    inner: ServiceClient,
}

impl VcspClient {
    pub fn new(options: &ClientOptions, settings: &Settings) -> Result<Self> {
        Ok(Self {
            inner: ServiceClient::new(Api::Vcsp, options, settings)?,
        })
    }

    pub fn with_transport(
        options: &ClientOptions,
        settings: &Settings,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        Ok(Self {
            inner: ServiceClient::with_transport(Api::Vcsp, options, settings, transport)?,
        })
    }

    pub fn target(&self) -> &Target {
        self.inner.target()
    }

    pub fn build_alive(&self) -> HttpRequest {
        self.inner.build_get(endpoints::ALIVE)
    }

    pub fn parse_alive(&self, response: &HttpResponse) -> bool {
        response.status == ALIVE_STATUS
    }

    /// Returns true if the service answers its liveness check.
    pub fn alive(&self) -> Result<bool> {
        let response = self.inner.send(self.build_alive(), &NoTaxonomy)?;
        Ok(self.parse_alive(&response))
    }
}
