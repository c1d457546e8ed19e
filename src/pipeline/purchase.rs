use crate::app::ports::SessionPort;
use crate::config::Endpoints;
use crate::constants::EXPECTED_CURRENCY;
use crate::error::{Result, SniperError};
use crate::metrics::PurchaseMetrics;
use crate::pipeline::retry::RetryPolicy;
use crate::types::{CatalogItem, PurchaseOutcome, PurchaseReceipt, PurchaseRequest};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Body of the purchase call. The user asset id is not part of it.
pub fn purchase_body(request: &PurchaseRequest) -> Value {
    json!({
        "expectedCurrency": EXPECTED_CURRENCY,
        "expectedPrice": request.expected_price,
        "expectedSellerId": request.expected_seller_id,
    })
}

/// Buys catalog items, sitting out throttling and server faults with a fixed delay
pub struct PurchaseExecutor {
    session: Arc<dyn SessionPort>,
    endpoints: Endpoints,
    retry: RetryPolicy,
}

impl PurchaseExecutor {
    pub fn new(session: Arc<dyn SessionPort>, endpoints: Endpoints, retry: RetryPolicy) -> Self {
        Self {
            session,
            endpoints,
            retry,
        }
    }

    /// Submit one purchase request and classify the answer.
    ///
    /// Any success status counts as purchased; the payload's business fields
    /// are not inspected. 429, 408 and 5xx are treated as rate limiting.
    pub async fn submit(&self, request: &PurchaseRequest) -> Result<PurchaseOutcome> {
        let url = self.endpoints.purchase_url(request.product_id);
        PurchaseMetrics::record_submission();
        let response = self.session.post_json(&url, &purchase_body(request)).await?;

        let outcome = if response.is_success() {
            PurchaseOutcome::Purchased
        } else if response.is_retryable() {
            PurchaseOutcome::RateLimited(response.retry_after)
        } else {
            PurchaseOutcome::Failed(format!(
                "status {}: {}",
                response.status,
                response.body_preview()
            ))
        };
        Ok(outcome)
    }

    /// Buy `item`, resubmitting the identical request after every rate-limited
    /// answer until it goes through. Returns an error for non-retryable failures
    /// or once an optional attempt cap is used up; either way the error reports
    /// how many submissions were made.
    #[instrument(skip(self, item), fields(asset_id = item.asset_id, product_id = item.product_id))]
    pub async fn buy(&self, item: &CatalogItem) -> Result<PurchaseReceipt> {
        let request = PurchaseRequest::try_from(item)?;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let outcome = match self.submit(&request).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    PurchaseMetrics::record_failed();
                    return Err(SniperError::PurchaseFailed {
                        asset_id: request.asset_id,
                        attempts,
                        reason: e.to_string(),
                    });
                }
            };

            match outcome {
                PurchaseOutcome::Purchased => {
                    PurchaseMetrics::record_purchased(attempts);
                    info!(attempts, "Purchased asset {}", request.asset_id);
                    return Ok(PurchaseReceipt {
                        asset_id: request.asset_id,
                        product_id: request.product_id,
                        attempts,
                    });
                }
                PurchaseOutcome::RateLimited(hint) => {
                    PurchaseMetrics::record_rate_limited();
                    if self.retry.is_exhausted(attempts) {
                        PurchaseMetrics::record_failed();
                        return Err(SniperError::RetriesExhausted {
                            operation: format!("purchase of asset {}", request.asset_id),
                            attempts,
                        });
                    }
                    warn!(
                        attempts,
                        retry_after_hint = ?hint,
                        "Rate limited buying asset {}, retrying in {:?}",
                        request.asset_id,
                        self.retry.delay
                    );
                    println!(
                        "⏳ Rate limited when attempting to buy asset {}... Retrying in {} secs...",
                        request.asset_id,
                        self.retry.delay.as_secs()
                    );
                    self.retry.wait().await;
                }
                PurchaseOutcome::Failed(reason) => {
                    PurchaseMetrics::record_failed();
                    return Err(SniperError::PurchaseFailed {
                        asset_id: request.asset_id,
                        attempts,
                        reason,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::HttpResponse;
    use crate::infra::scripted_session::{Scripted, ScriptedSession};
    use std::time::Duration;

    fn item() -> CatalogItem {
        CatalogItem {
            asset_id: 1028606,
            product_id: 21069210,
            expected_seller_id: 1,
            expected_price: Some(0),
        }
    }

    fn executor(session: Arc<ScriptedSession>, retry: RetryPolicy) -> PurchaseExecutor {
        PurchaseExecutor::new(session, Endpoints::single_host("http://economy.test"), retry)
    }

    fn throttled() -> Scripted {
        let mut resp = HttpResponse::json_body(429, &json!({"errors": [{"code": 0, "message": "TooManyRequests"}]}));
        resp.retry_after = Some(Duration::from_secs(30));
        Scripted::Respond(resp)
    }

    fn purchased() -> Scripted {
        Scripted::Respond(HttpResponse::json_body(
            200,
            &json!({"purchased": true, "reason": "Success", "productId": 21069210}),
        ))
    }

    #[test]
    fn test_purchase_body_shape() {
        let body = purchase_body(&PurchaseRequest::try_from(&item()).unwrap());
        assert_eq!(body, json!({"expectedCurrency": 1, "expectedPrice": 0, "expectedSellerId": 1}));
    }

    #[tokio::test]
    async fn test_n_rate_limits_then_success_submits_n_plus_one_times() {
        let n = 4;
        let mut script: Vec<Scripted> = (0..n).map(|_| throttled()).collect();
        script.push(purchased());

        let session = Arc::new(ScriptedSession::new());
        session.route("/v1/purchases/products/21069210", script);

        let receipt = executor(session.clone(), RetryPolicy::unbounded(Duration::from_millis(1)))
            .buy(&item())
            .await
            .unwrap();

        assert_eq!(receipt.attempts, n + 1);
        assert_eq!(session.count("POST", "/v1/purchases/products/21069210"), (n + 1) as usize);
    }

    #[tokio::test]
    async fn test_every_submission_carries_listing_values() {
        let session = Arc::new(ScriptedSession::new());
        session.route("/v1/purchases/products/", vec![throttled(), purchased()]);
        let listed = CatalogItem {
            expected_price: Some(15),
            expected_seller_id: 99,
            ..item()
        };

        executor(session.clone(), RetryPolicy::unbounded(Duration::ZERO))
            .buy(&listed)
            .await
            .unwrap();

        let expected = json!({"expectedCurrency": 1, "expectedPrice": 15, "expectedSellerId": 99});
        let requests = session.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.body.as_ref() == Some(&expected)));
    }

    #[tokio::test]
    async fn test_success_payload_is_not_inspected() {
        let session = Arc::new(ScriptedSession::new());
        session.respond_json("/v1/purchases/products/", 200, json!({"purchased": false, "reason": "InsufficientFunds"}));

        let outcome = executor(session, RetryPolicy::unbounded(Duration::ZERO))
            .submit(&PurchaseRequest::try_from(&item()).unwrap())
            .await
            .unwrap();
        assert_eq!(outcome, PurchaseOutcome::Purchased);
    }

    #[tokio::test]
    async fn test_rate_limit_hint_is_reported() {
        let session = Arc::new(ScriptedSession::new());
        session.route("/v1/purchases/products/", vec![throttled()]);

        let outcome = executor(session, RetryPolicy::unbounded(Duration::ZERO))
            .submit(&PurchaseRequest::try_from(&item()).unwrap())
            .await
            .unwrap();
        assert_eq!(outcome, PurchaseOutcome::RateLimited(Some(Duration::from_secs(30))));
    }

    #[tokio::test]
    async fn test_other_failures_are_not_retried() {
        let session = Arc::new(ScriptedSession::new());
        session.respond_json("/v1/purchases/products/", 400, json!({"errors": [{"message": "Invalid product"}]}));

        let err = executor(session.clone(), RetryPolicy::unbounded(Duration::ZERO))
            .buy(&item())
            .await
            .unwrap_err();

        assert!(matches!(err, SniperError::PurchaseFailed { attempts: 1, .. }));
        assert_eq!(err.purchase_submissions(), 1);
        assert_eq!(session.count("POST", "/v1/purchases/products/"), 1);
    }

    #[tokio::test]
    async fn test_server_fault_is_resubmitted() {
        let session = Arc::new(ScriptedSession::new());
        session.route(
            "/v1/purchases/products/21069210",
            vec![
                Scripted::Respond(HttpResponse::json_body(503, &json!({"errors": [{"message": "Service Unavailable"}]}))),
                purchased(),
            ],
        );

        let receipt = executor(session.clone(), RetryPolicy::unbounded(Duration::ZERO))
            .buy(&item())
            .await
            .unwrap();

        assert_eq!(receipt.attempts, 2);
        assert_eq!(session.count("POST", "/v1/purchases/products/21069210"), 2);
    }

    #[tokio::test]
    async fn test_item_without_price_is_not_submitted() {
        let session = Arc::new(ScriptedSession::new());
        let off_sale = CatalogItem {
            expected_price: None,
            ..item()
        };

        let err = executor(session.clone(), RetryPolicy::unbounded(Duration::ZERO))
            .buy(&off_sale)
            .await
            .unwrap_err();

        assert!(matches!(err, SniperError::MissingField(_)));
        assert!(session.requests().is_empty());
    }

    #[tokio::test]
    async fn test_capped_purchase_gives_up() {
        let session = Arc::new(ScriptedSession::new());
        session.route("/v1/purchases/products/", vec![throttled()]);

        let err = executor(session.clone(), RetryPolicy::new(Duration::ZERO, Some(3)))
            .buy(&item())
            .await
            .unwrap_err();

        assert!(matches!(err, SniperError::RetriesExhausted { attempts: 3, .. }));
        assert_eq!(err.purchase_submissions(), 3);
        assert_eq!(session.count("POST", "/v1/purchases/products/"), 3);
    }
}
