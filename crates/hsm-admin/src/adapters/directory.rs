//! Domain directories.

use crate::domain::entities::DomainEntry;
use crate::domain::errors::TransportError;
use crate::ports::outbound::DomainDirectory;

/// Parse the JSON array returned by the instance's `hsms` listing.
pub fn parse_domain_listing(json: &str) -> Result<Vec<DomainEntry>, TransportError> {
    serde_json::from_str(json)
        .map_err(|e| TransportError::MalformedResponse(format!("domain listing: {}", e)))
}

/// Fixed list of domains, e.g. from configuration.
#[derive(Clone, Debug, Default)]
pub struct StaticDomainDirectory {
    domains: Vec<DomainEntry>,
}

impl StaticDomainDirectory {
    pub fn new(domains: Vec<DomainEntry>) -> Self {
        Self { domains }
    }
}

impl DomainDirectory for StaticDomainDirectory {
    fn list_domains(&self) -> Result<Vec<DomainEntry>, TransportError> {
        Ok(self.domains.clone())
    }
}
