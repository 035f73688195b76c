use std::collections::BTreeMap;
use std::sync::Arc;

use depgate_schema::Schema;
use serde::Serialize;
use tokio::sync::RwLock;

#[derive(Debug, Eq, PartialEq, Serialize)]
pub struct MemberUsage {
    pub member: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub count: u64,
}

/// Counts, across requests, how many requests referenced each deprecated member.
#[derive(Clone, Default)]
pub struct UsageTracker {
    inner: Arc<RwLock<BTreeMap<String, u64>>>,
}

impl UsageTracker {
    pub async fn record<'a>(&self, members: impl IntoIterator<Item = &'a str>) {
        let mut inner = self.inner.write().await;
        for member in members {
            *inner.entry(member.to_string()).or_default() += 1;
        }
    }

    pub async fn report(&self, schema: &Schema) -> Vec<MemberUsage> {
        self.inner
            .read()
            .await
            .iter()
            .map(|(member, count)| MemberUsage {
                member: member.clone(),
                reason: schema
                    .deprecation_reason(member)
                    .flatten()
                    .map(ToString::to_string),
                count: *count,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_per_member() {
        let schema = Schema::parse(
            r#"type Query { a: Int @deprecated(reason: "gone") b: Int @deprecated }"#,
        )
        .unwrap();
        let tracker = UsageTracker::default();
        tracker.record(["Query.a", "Query.b"]).await;
        tracker.clone().record(["Query.a"]).await;

        assert_eq!(
            tracker.report(&schema).await,
            vec![
                MemberUsage {
                    member: "Query.a".to_string(),
                    reason: Some("gone".to_string()),
                    count: 2,
                },
                MemberUsage {
                    member: "Query.b".to_string(),
                    reason: None,
                    count: 1,
                },
            ]
        );
    }
}
