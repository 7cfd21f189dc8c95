//! Provisioning blueprint.
//!
//! [`Blueprint::build`] turns a [`SystemConfig`] into a serializable
//! description of the resources a provisioning tool must create: the
//! interface endpoint, the private REST API with its resource policy, and the
//! single `POST /` integration. Building is pure; nothing is deployed here.

use serde::Serialize;

use crate::boundary::VpcEndpointId;
use crate::config::{ConfigError, SystemConfig};
use crate::cors::{ALLOWED_HEADERS, ALLOWED_METHODS};
use crate::policy::PolicyDocument;
use crate::upstream::{IdentityEndpoint, Region, FORWARDED_HEADERS};

/// Deployment stage; also the first segment of policy resources.
pub const STAGE_NAME: &str = "auth";

/// Display name of the REST API.
pub const API_NAME: &str = "Chatbot Cognito Proxy API";

/// Placeholder for the API id, which only exists after deployment.
pub const API_ID_PLACEHOLDER: &str = "${RestApiId}";

/// Interface endpoint that forms the private network boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceEndpointSpec {
    /// Endpoint service, `com.amazonaws.<region>.execute-api`
    pub service: String,
    /// Resolve the public API host name privately inside the network
    pub private_dns_enabled: bool,
    /// Subnets to place the endpoint in; empty means provider default
    pub subnets: Vec<String>,
    /// Identifier the policy is conditioned on
    pub endpoint_id: VpcEndpointId,
}

/// Endpoint exposure type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EndpointType {
    /// Reachable only through interface endpoints
    Private,
}

/// Preflight configuration applied by the hosting API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsPreflightSpec {
    /// Accepted origins (exactly one)
    pub allow_origins: Vec<String>,
    /// Accepted methods
    pub allow_methods: Vec<String>,
    /// Accepted request headers
    pub allow_headers: Vec<String>,
    /// Whether credentials are allowed
    pub allow_credentials: bool,
}

/// How the identity endpoint is integrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationSpec {
    /// Target URL
    pub uri: String,
    /// Method used upstream
    pub http_method: String,
    /// Pass the request through unparsed
    pub proxy: bool,
    /// Request headers mapped onto the integration request
    pub forwarded_headers: Vec<String>,
}

/// One method on the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodSpec {
    /// HTTP method
    pub http_method: String,
    /// Resource path
    pub path: String,
    /// Upstream integration
    pub integration: IntegrationSpec,
    /// Static response headers added on the way back
    pub response_headers: Vec<(String, String)>,
}

/// The private REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestApiSpec {
    /// API name
    pub name: String,
    /// Exposure type
    pub endpoint_type: EndpointType,
    /// Interface endpoints bound to the API
    pub vpc_endpoint_ids: Vec<VpcEndpointId>,
    /// Stage name
    pub stage: String,
    /// Per-method metrics on the stage
    pub metrics_enabled: bool,
    /// Request tracing on the stage
    pub tracing_enabled: bool,
    /// Preflight configuration
    pub cors_preflight: CorsPreflightSpec,
    /// Resource policy
    pub policy: PolicyDocument,
    /// Methods
    pub methods: Vec<MethodSpec>,
}

/// Values surfaced after provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Outputs {
    /// Invoke URL of the stage
    pub api_endpoint: String,
    /// Interface endpoint identifier
    pub vpc_endpoint_id: VpcEndpointId,
}

/// Full resource graph for one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGraph {
    /// Interface endpoint
    pub interface_endpoint: InterfaceEndpointSpec,
    /// REST API
    pub rest_api: RestApiSpec,
    /// Outputs
    pub outputs: Outputs,
}

/// Builder for [`ResourceGraph`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Blueprint;

impl Blueprint {
    /// Describes every resource for `system`.
    pub fn build(system: &SystemConfig) -> Result<ResourceGraph, ConfigError> {
        system.validate()?;
        let region = system.region()?;
        let endpoint_id = system.endpoint_id()?;
        let origin = system.allowed_origin();
        let identity = IdentityEndpoint::for_region(&region)?;

        let cors_headers = vec![
            ("Access-Control-Allow-Origin".to_string(), origin.clone()),
            ("Access-Control-Allow-Credentials".to_string(), "true".to_string()),
            ("Access-Control-Allow-Headers".to_string(), ALLOWED_HEADERS.join(",")),
            ("Access-Control-Allow-Methods".to_string(), methods().join(",")),
        ];

        let post = MethodSpec {
            http_method: "POST".to_string(),
            path: "/".to_string(),
            integration: IntegrationSpec {
                uri: identity.url().as_str().trim_end_matches('/').to_string(),
                http_method: "POST".to_string(),
                proxy: true,
                forwarded_headers: FORWARDED_HEADERS.iter().map(|h| h.as_str().to_string()).collect(),
            },
            response_headers: cors_headers,
        };

        Ok(ResourceGraph {
            interface_endpoint: InterfaceEndpointSpec {
                service: format!("com.amazonaws.{}.execute-api", region.as_str()),
                private_dns_enabled: true,
                subnets: system.subnets.clone(),
                endpoint_id: endpoint_id.clone(),
            },
            rest_api: RestApiSpec {
                name: API_NAME.to_string(),
                endpoint_type: EndpointType::Private,
                vpc_endpoint_ids: vec![endpoint_id.clone()],
                stage: STAGE_NAME.to_string(),
                metrics_enabled: true,
                tracing_enabled: system.advanced_monitoring,
                cors_preflight: CorsPreflightSpec {
                    allow_origins: vec![origin],
                    allow_methods: methods(),
                    allow_headers: ALLOWED_HEADERS.iter().map(ToString::to_string).collect(),
                    allow_credentials: true,
                },
                policy: PolicyDocument::private_endpoint_only(&endpoint_id),
                methods: vec![post],
            },
            outputs: Outputs {
                api_endpoint: api_endpoint(&region),
                vpc_endpoint_id: endpoint_id,
            },
        })
    }
}

fn methods() -> Vec<String> {
    ALLOWED_METHODS.iter().map(ToString::to_string).collect()
}

fn api_endpoint(region: &Region) -> String {
    format!(
        "https://{API_ID_PLACEHOLDER}.execute-api.{}.{}/{STAGE_NAME}/",
        region.as_str(),
        region.dns_suffix()
    )
}
