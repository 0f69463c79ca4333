//! # Provisioning Run
//!
//! Walks the category map from the settings file and makes Prism match it:
//!
//! 1. List existing network security rules (paginated).
//! 2. For each key with at least one value: upsert the key, then each
//!    value, then create one rule per value unless a rule with the same
//!    name already exists.
//!
//! Keys without values are skipped entirely. System categories such as
//! `AppType` are typically listed that way, so their values are managed
//! elsewhere.
//!
//! Calls are strictly sequential and the first failure ends the run.
//! Upserts already applied are not rolled back.

use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::{Context, Result};

use catsync_client::security_rules::SecurityRuleSpec;
use catsync_client::PrismClient;

use crate::logging::LogTag;
use crate::settings::Settings;

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub keys_upserted: usize,
    pub keys_skipped: usize,
    pub values_upserted: usize,
    pub rules_created: usize,
    pub rules_existing: usize,
}

/// Provision every category and rule described by `settings`.
pub async fn apply(client: &PrismClient, settings: &Settings) -> Result<ApplySummary> {
    let security = &settings.security;
    let mut summary = ApplySummary::default();

    let existing_rules: BTreeSet<String> = if security.enabled {
        tracing::info!(tag = %LogTag::Step, "listing network security rules");
        let rules = client
            .security_rules()
            .list(settings.page_size)
            .await
            .context("failed to list network security rules")?;
        tracing::info!(tag = %LogTag::Data, count = rules.len(), "existing network security rules");
        rules.into_iter().filter_map(|r| r.name).collect()
    } else {
        BTreeSet::new()
    };

    for (key, values) in &settings.categories {
        if values.is_empty() {
            tracing::warn!(tag = %LogTag::Warning, key = %key, "category has no values, skipping");
            summary.keys_skipped += 1;
            continue;
        }

        tracing::info!(tag = %LogTag::Step, key = %key, values = values.len(), "upserting category");
        client
            .categories()
            .upsert_key(key, None)
            .await
            .with_context(|| format!("failed to upsert category key {key}"))?;
        summary.keys_upserted += 1;

        for (value, description) in values {
            client
                .categories()
                .upsert_value(key, value, description)
                .await
                .with_context(|| format!("failed to upsert category value {key}:{value}"))?;
            summary.values_upserted += 1;
            tracing::info!(tag = %LogTag::Success, key = %key, value = %value, "category value upserted");

            if !security.enabled {
                continue;
            }

            let name = security.rule_name(key, value);
            if existing_rules.contains(&name) {
                tracing::info!(tag = %LogTag::Info, rule = %name, "security rule already exists");
                summary.rules_existing += 1;
                continue;
            }

            let spec = SecurityRuleSpec {
                name: name.clone(),
                description: Some(format!("VMs tagged {key}:{value}")),
                category_key: key.clone(),
                category_value: value.clone(),
                mode: security.mode,
            };
            let created = client
                .security_rules()
                .create(&spec)
                .await
                .with_context(|| format!("failed to create security rule {name}"))?;

            match created.task_uuid {
                Some(task) if security.wait_for_tasks => {
                    tracing::debug!(tag = %LogTag::Debug, rule = %name, task = %task, "waiting for task");
                    client
                        .tasks()
                        .wait(
                            task,
                            Duration::from_secs(security.poll_interval_secs),
                            security.max_polls,
                        )
                        .await
                        .with_context(|| format!("security rule {name} did not complete"))?;
                }
                Some(_) => {}
                None => {
                    tracing::warn!(tag = %LogTag::Warning, rule = %name, "create response carried no task UUID");
                }
            }

            summary.rules_created += 1;
            tracing::info!(tag = %LogTag::Success, rule = %name, mode = %security.mode, "security rule created");
        }
    }

    tracing::info!(
        tag = %LogTag::Sum,
        keys_upserted = summary.keys_upserted,
        keys_skipped = summary.keys_skipped,
        values_upserted = summary.values_upserted,
        rules_created = summary.rules_created,
        rules_existing = summary.rules_existing,
        "run complete"
    );
    Ok(summary)
}
