//! Typed client for v3 network security rules (Flow policies).
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `network_security_rules` | Create a rule (async, returns a task) |
//! | POST   | `network_security_rules/list` | List rules |

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::PrismApiError;
use crate::executor::Executor;
use crate::pagination::fetch_all;

const RESOURCE: &str = "network_security_rules";

/// Listing kind for security rules.
pub const SECURITY_RULE_KIND: &str = "network_security_rule";

/// Enforcement mode of a rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    /// Traffic is logged, not blocked.
    #[default]
    Monitor,
    /// Traffic outside the allow lists is blocked.
    Apply,
}

impl PolicyMode {
    /// Value of `app_rule.action` in the intent body.
    pub fn action(self) -> &'static str {
        match self {
            Self::Monitor => "MONITOR",
            Self::Apply => "APPLY",
        }
    }
}

impl std::fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.action())
    }
}

/// An app rule scoped to the VMs tagged `category_key: category_value`.
///
/// Inbound traffic is denied except what the allow list names (nothing by
/// default); outbound traffic is allowed everywhere; traffic inside the
/// target group is allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityRuleSpec {
    pub name: String,
    pub description: Option<String>,
    pub category_key: String,
    pub category_value: String,
    pub mode: PolicyMode,
}

impl SecurityRuleSpec {
    /// The v3 intent body for `POST network_security_rules`.
    pub fn to_intent(&self) -> Value {
        let mut params = Map::new();
        params.insert(
            self.category_key.clone(),
            json!([self.category_value.clone()]),
        );

        let mut spec = json!({
            "name": self.name,
            "resources": {
                "app_rule": {
                    "action": self.mode.action(),
                    "target_group": {
                        "peer_specification_type": "FILTER",
                        "default_internal_policy": "ALLOW_ALL",
                        "filter": {
                            "type": "CATEGORIES_MATCH_ALL",
                            "kind_list": ["vm"],
                            "params": params,
                        },
                    },
                    "inbound_allow_list": [],
                    "outbound_allow_list": [
                        { "peer_specification_type": "ALL" }
                    ],
                },
            },
        });
        if let (Some(description), Some(obj)) = (&self.description, spec.as_object_mut()) {
            obj.insert("description".into(), json!(description));
        }

        json!({
            "api_version": "3.1",
            "metadata": { "kind": SECURITY_RULE_KIND },
            "spec": spec,
        })
    }
}

/// Name and UUID of an existing rule, read from a listing entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityRuleSummary {
    pub name: Option<String>,
    pub uuid: Option<String>,
}

impl SecurityRuleSummary {
    /// Read `spec.name` and `metadata.uuid`; missing fields stay `None`.
    pub fn from_entity(entity: &Value) -> Self {
        let text = |ptr: &str| {
            entity
                .pointer(ptr)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Self {
            name: text("/spec/name"),
            uuid: text("/metadata/uuid"),
        }
    }
}

/// Result of an accepted create call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedRule {
    pub uuid: Option<String>,
    /// Task tracking the asynchronous creation, when the server reports one.
    pub task_uuid: Option<Uuid>,
}

impl CreatedRule {
    fn from_response(body: &Value) -> Self {
        Self {
            uuid: body
                .pointer("/metadata/uuid")
                .and_then(Value::as_str)
                .map(str::to_string),
            task_uuid: body
                .pointer("/status/execution_context/task_uuid")
                .and_then(Value::as_str)
                .and_then(|s| Uuid::parse_str(s).ok()),
        }
    }
}

/// Client for the network security rules API.
#[derive(Debug, Clone)]
pub struct SecurityRuleClient {
    exec: Executor,
}

impl SecurityRuleClient {
    pub(crate) fn new(exec: Executor) -> Self {
        Self { exec }
    }

    /// List every security rule.
    pub async fn list(&self, page_size: u32) -> Result<Vec<SecurityRuleSummary>, PrismApiError> {
        let raw = fetch_all(&self.exec, &[RESOURCE], SECURITY_RULE_KIND, page_size).await?;
        Ok(raw.iter().map(SecurityRuleSummary::from_entity).collect())
    }

    /// Create a rule.
    ///
    /// Calls `POST {base_url}/network_security_rules`. Creation is
    /// asynchronous on the server; wait on [`CreatedRule::task_uuid`] to
    /// observe completion.
    pub async fn create(&self, spec: &SecurityRuleSpec) -> Result<CreatedRule, PrismApiError> {
        let url = self.exec.url(&[RESOURCE])?;
        let body = spec.to_intent();
        let resp = self.exec.execute(Method::POST, url, Some(&body)).await?;
        Ok(CreatedRule::from_response(&resp))
    }
}
