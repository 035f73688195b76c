use std::convert::Infallible;
use std::sync::Arc;

use depgate_schema::Schema;
use depgate_validation::Accumulation;
use warp::http::StatusCode;
use warp::reply::Response as HttpResponse;
use warp::{Filter, Rejection, Reply};

use crate::{Metrics, Request, UsageTracker};

#[derive(Clone)]
pub struct HandlerConfig {
    pub schema: Arc<Schema>,
    pub accumulation: Accumulation,
    pub tracker: UsageTracker,
    pub metrics: Arc<Metrics>,
}

impl HandlerConfig {
    async fn check(&self, request: Request) -> HttpResponse {
        self.metrics.request_counter.inc();

        let resp = match crate::check(&self.schema, &request, self.accumulation) {
            Ok(resp) => resp,
            Err(err) => {
                tracing::debug!(error = %err, "Failed to parse query.");
                return warp::reply::with_status(
                    warp::reply::json(&serde_json::json!({ "errors": [err] })),
                    StatusCode::BAD_REQUEST,
                )
                .into_response();
            }
        };

        if !resp.deprecations.is_empty() {
            let members = resp.members().collect::<Vec<_>>();
            tracing::info!(members = ?members, "Deprecated members used.");
            for member in &members {
                self.metrics
                    .deprecated_usage_counter
                    .with_label_values(&[*member])
                    .inc();
            }
            self.tracker.record(members).await;
        }

        warp::reply::json(&resp).into_response()
    }
}

pub fn check_request(
    config: HandlerConfig,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::post()
        .and(warp::body::json())
        .and_then(move |request: Request| {
            let config = config.clone();
            async move { Ok::<_, Infallible>(config.check(request).await) }
        })
}

pub fn deprecation_report(
    config: HandlerConfig,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::get().and_then(move || {
        let config = config.clone();
        async move {
            Ok::<_, Infallible>(warp::reply::json(
                &config.tracker.report(&config.schema).await,
            ))
        }
    })
}

pub fn metrics(
    metrics: Arc<Metrics>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::get().map(move || match metrics.encode() {
        Ok(buffer) => warp::reply::with_status(buffer, StatusCode::OK).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Failed to encode metrics.");
            warp::reply::with_status(err.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
                .into_response()
        }
    })
}

pub fn routes(
    config: HandlerConfig,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let check = warp::path::end().and(check_request(config.clone()));
    let report = warp::path!("deprecations").and(deprecation_report(config.clone()));
    let metrics = warp::path!("metrics").and(metrics(config.metrics.clone()));
    let health = warp::path!("health").map(|| warp::reply::json(&"healthy"));
    check.or(report).or(metrics).or(health)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    const SDL: &str = r#"
        type Query {
            old: String @deprecated(reason: "Use `new`.")
            new: String
            paint(color: Color): String
        }

        enum Color {
            RED @deprecated
            BLUE
        }
    "#;

    fn config() -> HandlerConfig {
        HandlerConfig {
            schema: Arc::new(Schema::parse(SDL).unwrap()),
            accumulation: Accumulation::Document,
            tracker: UsageTracker::default(),
            metrics: Arc::new(Metrics::new().unwrap()),
        }
    }

    async fn post(config: &HandlerConfig, query: &str) -> (StatusCode, Value) {
        let resp = warp::test::request()
            .method("POST")
            .path("/")
            .json(&json!({ "query": query }))
            .reply(&routes(config.clone()))
            .await;
        (resp.status(), serde_json::from_slice(resp.body()).unwrap())
    }

    #[tokio::test]
    async fn reports_deprecations() {
        let config = config();
        let (status, body) = post(&config, "{ old new paint(color: RED) }").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "deprecations": [
                    { "member": "Color.RED" },
                    { "member": "Query.old", "reason": "Use `new`." },
                ],
                "operations": [["Color.RED", "Query.old"]],
            })
        );
    }

    #[tokio::test]
    async fn reports_validation_errors() {
        let config = config();
        let (status, body) = post(&config, "{ missing }").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["errors"][0]["message"],
            json!("Unknown field \"missing\" on type \"Query\".")
        );
        assert_eq!(body["deprecations"], json!([]));
    }

    #[tokio::test]
    async fn rejects_unparsable_query() {
        let config = config();
        let (status, body) = post(&config, "{ old").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"][0]["message"].is_string());
    }

    #[tokio::test]
    async fn aggregates_across_requests() {
        let config = config();
        post(&config, "{ old }").await;
        post(&config, "query A { old } query B { old paint(color: RED) }").await;
        post(&config, "{ new }").await;

        let resp = warp::test::request()
            .method("GET")
            .path("/deprecations")
            .reply(&routes(config.clone()))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            serde_json::from_slice::<Value>(resp.body()).unwrap(),
            json!([
                { "member": "Color.RED", "count": 1 },
                { "member": "Query.old", "reason": "Use `new`.", "count": 2 },
            ])
        );

        let resp = warp::test::request()
            .method("GET")
            .path("/metrics")
            .reply(&routes(config.clone()))
            .await;
        let text = String::from_utf8(resp.body().to_vec()).unwrap();
        assert!(text.contains("depgate_requests_total 3"));
        assert!(text.contains("depgate_deprecated_usage_total{member=\"Query.old\"} 2"));
    }

    #[tokio::test]
    async fn health() {
        let resp = warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&routes(config()))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.body().as_ref(), b"\"healthy\"");
    }
}
