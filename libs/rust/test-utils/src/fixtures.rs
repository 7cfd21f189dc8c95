//! Sample deployment used across tests.

/// Domain whose `https://` origin is the only one allowed.
pub const DOMAIN: &str = "app.example.com";

/// Origin derived from [`DOMAIN`].
pub const ORIGIN: &str = "https://app.example.com";

/// Region of the sample deployment.
pub const REGION: &str = "us-east-1";

/// The trusted interface endpoint.
pub const TRUSTED_VPCE: &str = "vpce-0a1b2c3d4e5f60718";

/// Some other interface endpoint in the same account.
pub const FOREIGN_VPCE: &str = "vpce-0fedcba987654321f";

/// Header the network stamps with the source endpoint.
pub const BOUNDARY_HEADER: &str = "x-amzn-vpce-id";

/// A Cognito `InitiateAuth` request body.
#[must_use]
pub fn initiate_auth_body() -> String {
    serde_json::json!({
        "AuthFlow": "USER_PASSWORD_AUTH",
        "ClientId": "3n4b5urk1ft4fl3mg5e62d9ado",
        "AuthParameters": { "USERNAME": "alice", "PASSWORD": "correct horse" }
    })
    .to_string()
}

/// A Cognito `InitiateAuth` success body.
#[must_use]
pub fn initiate_auth_result() -> String {
    serde_json::json!({
        "AuthenticationResult": {
            "AccessToken": "eyJraWQiOiJhY2Nlc3MifQ.e30.sig",
            "ExpiresIn": 3600,
            "IdToken": "eyJraWQiOiJpZCJ9.e30.sig",
            "RefreshToken": "refresh-token",
            "TokenType": "Bearer"
        },
        "ChallengeParameters": {}
    })
    .to_string()
}

/// Environment for the sample deployment, optionally pointing the forwarder
/// at `identity_url`.
#[must_use]
pub fn env_vars(identity_url: Option<&str>) -> Vec<(String, String)> {
    let mut vars = vec![
        ("DOMAIN".to_string(), DOMAIN.to_string()),
        ("AWS_REGION".to_string(), REGION.to_string()),
        ("PRIVATE_NETWORK_ID".to_string(), TRUSTED_VPCE.to_string()),
    ];
    if let Some(url) = identity_url {
        vars.push(("IDENTITY_ENDPOINT_URL".to_string(), url.to_string()));
    }
    vars
}

/// Lookup function over [`env_vars`], for `Config::from_lookup`.
#[must_use]
pub fn lookup(vars: Vec<(String, String)>) -> impl Fn(&str) -> Option<String> {
    move |name| {
        vars.iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }
}
