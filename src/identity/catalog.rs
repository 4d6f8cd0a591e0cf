use std::fmt;

use serde::Deserialize;

use crate::errors::EndpointNotFound;
use crate::utils::constants::{DEFAULT_ENDPOINT_REGION, DEFAULT_ENDPOINT_SERVICE_TYPE};

/// Endpoint visibility, the `interface` field of a catalog endpoint.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    #[default]
    Public,
    Internal,
    Admin,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Public => "public",
            Availability::Internal => "internal",
            Availability::Admin => "admin",
        }
    }
}

/// Which catalog endpoint to pick.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EndpointFilter {
    /// Matches either `region` or `region_id` of the endpoint. `None` matches any.
    pub region: Option<String>,
    pub service_type: String,
    /// Optional service name, e.g. `keystone`.
    pub name: Option<String>,
    pub availability: Availability,
}

impl Default for EndpointFilter {
    fn default() -> Self {
        Self {
            region: Some(DEFAULT_ENDPOINT_REGION.to_owned()),
            service_type: DEFAULT_ENDPOINT_SERVICE_TYPE.to_owned(),
            name: None,
            availability: Availability::Public,
        }
    }
}

impl fmt::Display for EndpointFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type={} region={} availability={}",
            self.service_type,
            self.region.as_deref().unwrap_or("*"),
            self.availability.as_str()
        )?;
        if let Some(name) = &self.name {
            write!(f, " name={}", name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CatalogEndpoint {
    #[serde(default)]
    pub id: String,
    pub interface: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub region_id: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CatalogService {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

/// Service catalog as returned inside an issued token. Order is kept as sent
/// by the provider.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ServiceCatalog(pub Vec<CatalogService>);

impl ServiceCatalog {
    /// First endpoint, in catalog order, matching every field of `filter`.
    pub fn resolve_endpoint(&self, filter: &EndpointFilter) -> Result<String, EndpointNotFound> {
        self.0
            .iter()
            .filter(|service| service.service_type == filter.service_type)
            .filter(|service| filter.name.as_ref().is_none_or(|name| &service.name == name))
            .flat_map(|service| service.endpoints.iter())
            .find(|endpoint| endpoint_matches(endpoint, filter))
            .map(|endpoint| endpoint.url.to_owned())
            .ok_or_else(|| EndpointNotFound {
                filter: filter.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn endpoint_matches(endpoint: &CatalogEndpoint, filter: &EndpointFilter) -> bool {
    if endpoint.interface != filter.availability.as_str() {
        return false;
    }
    match &filter.region {
        None => true,
        Some(region) => {
            endpoint.region.as_ref() == Some(region) || endpoint.region_id.as_ref() == Some(region)
        }
    }
}
