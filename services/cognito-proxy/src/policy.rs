//! Resource policy evaluated on every request.
//!
//! The document has the same shape as the one attached to the provisioned
//! private API, so the blueprint and the runtime gate share one source of
//! truth. Evaluation follows IAM ordering: an explicit deny wins, then any
//! allow, otherwise the implicit deny.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::boundary::VpcEndpointId;

/// Action checked for every inbound request.
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

/// Condition key carrying the source interface endpoint.
pub const SOURCE_VPCE_KEY: &str = "aws:SourceVpce";

/// Statement effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    /// Grants the action
    Allow,
    /// Refuses the action regardless of other statements
    Deny,
}

/// Supported condition operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ConditionOperator {
    /// Key present and equal to one of the values
    StringEquals,
    /// Key absent, or present and equal to none of the values
    StringNotEquals,
}

/// Statement principal. Only the anonymous wildcard is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    #[serde(rename = "AWS")]
    aws: String,
}

impl Principal {
    /// Any principal, including unauthenticated callers.
    #[must_use]
    pub fn any() -> Self {
        Self {
            aws: "*".to_string(),
        }
    }
}

/// One policy statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    /// Allow or deny
    pub effect: Effect,
    /// Who the statement applies to
    pub principal: Principal,
    /// Action patterns (`*` wildcard)
    pub action: Vec<String>,
    /// Resource patterns (`*` wildcard)
    pub resource: Vec<String>,
    /// Operator -> key -> accepted values
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub condition: BTreeMap<ConditionOperator, BTreeMap<String, Vec<String>>>,
}

impl Statement {
    fn applies_to(&self, ctx: &RequestContext<'_>) -> bool {
        self.action.iter().any(|p| wildcard_match(p, ctx.action))
            && self.resource.iter().any(|p| wildcard_match(p, &ctx.resource))
            && self.conditions_hold(ctx)
    }

    fn conditions_hold(&self, ctx: &RequestContext<'_>) -> bool {
        self.condition.iter().all(|(op, keys)| {
            keys.iter().all(|(key, values)| {
                let actual = ctx.condition_value(key);
                let equal = actual.is_some_and(|a| values.iter().any(|v| v == a));
                match op {
                    ConditionOperator::StringEquals => equal,
                    ConditionOperator::StringNotEquals => !equal,
                }
            })
        })
    }
}

/// The facts a request is judged on.
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    /// Requested action
    pub action: &'a str,
    /// `execute-api:/<stage>/<METHOD>/<path>`
    pub resource: String,
    /// Interface endpoint the request arrived through
    pub source_vpce: Option<&'a str>,
}

impl<'a> RequestContext<'a> {
    /// Context for invoking `method path` on `stage`.
    #[must_use]
    pub fn invoke(stage: &str, method: &str, path: &str, source_vpce: Option<&'a str>) -> Self {
        let path = path.strip_prefix('/').unwrap_or(path);
        Self {
            action: INVOKE_ACTION,
            resource: format!("execute-api:/{stage}/{method}/{path}"),
            source_vpce,
        }
    }

    fn condition_value(&self, key: &str) -> Option<&'a str> {
        if key.eq_ignore_ascii_case(SOURCE_VPCE_KEY) {
            self.source_vpce
        } else {
            None
        }
    }
}

/// Outcome of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// An allow statement matched and no deny did
    Allow,
    /// A deny statement matched
    ExplicitDeny,
    /// Nothing matched
    ImplicitDeny,
}

impl Decision {
    /// Whether the request may proceed.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// A resource policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyDocument {
    /// Policy language version
    #[serde(rename = "Version")]
    pub version: String,
    /// Statements, in document order
    #[serde(rename = "Statement")]
    pub statements: Vec<Statement>,
}

impl PolicyDocument {
    /// Allow invoke on every resource, but only through `endpoint`.
    #[must_use]
    pub fn private_endpoint_only(endpoint: &VpcEndpointId) -> Self {
        let mut keys = BTreeMap::new();
        keys.insert(SOURCE_VPCE_KEY.to_string(), vec![endpoint.to_string()]);
        let mut condition = BTreeMap::new();
        condition.insert(ConditionOperator::StringEquals, keys);

        Self {
            version: "2012-10-17".to_string(),
            statements: vec![Statement {
                effect: Effect::Allow,
                principal: Principal::any(),
                action: vec![INVOKE_ACTION.to_string()],
                resource: vec!["execute-api:/*".to_string()],
                condition,
            }],
        }
    }

    /// Evaluates the document for one request.
    #[must_use]
    pub fn evaluate(&self, ctx: &RequestContext<'_>) -> Decision {
        let mut allowed = false;
        for statement in self.statements.iter().filter(|s| s.applies_to(ctx)) {
            match statement.effect {
                Effect::Deny => return Decision::ExplicitDeny,
                Effect::Allow => allowed = true,
            }
        }
        if allowed {
            Decision::Allow
        } else {
            Decision::ImplicitDeny
        }
    }
}

/// Glob match where `*` spans any run of characters and `?` one character.
fn wildcard_match(pattern: &str, value: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let v: Vec<char> = value.chars().collect();
    let (mut pi, mut vi) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while vi < v.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == v[vi]) {
            pi += 1;
            vi += 1;
        } else if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, vi));
            pi += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            vi = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|c| *c == '*')
}
