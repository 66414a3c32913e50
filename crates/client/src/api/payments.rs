//! Payment service client.

use tracing::instrument;

use quickbite_core::PaymentId;

use super::backend::PaymentBackend;
use super::types::{
    GatewaySession, PaymentFilter, PaymentRecordDto, PaymentRequest, RefundRequest,
};
use super::{ApiError, RestClient};

/// Client for the payment service.
#[derive(Clone)]
pub struct PaymentClient {
    rest: RestClient,
}

impl PaymentClient {
    #[must_use]
    pub const fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    fn list_path(filter: &PaymentFilter) -> String {
        let mut params = Vec::new();
        if let Some(user) = filter.user_id {
            params.push(format!("userId={user}"));
        }
        if let Some(order) = filter.order_id {
            params.push(format!("orderId={order}"));
        }
        if let Some(status) = filter.status {
            // Wire encoding matches the enum's serde representation
            if let Ok(encoded) = serde_json::to_string(&status) {
                params.push(format!("status={}", encoded.trim_matches('"')));
            }
        }
        if params.is_empty() {
            "payments".to_string()
        } else {
            format!("payments?{}", params.join("&"))
        }
    }
}

impl PaymentBackend for PaymentClient {
    #[instrument(skip(self, request), fields(order = %request.order_id))]
    async fn process(&self, request: &PaymentRequest) -> Result<GatewaySession, ApiError> {
        self.rest.post_json("payments/process", request).await
    }

    #[instrument(skip(self, filter))]
    async fn list(&self, filter: &PaymentFilter) -> Result<Vec<PaymentRecordDto>, ApiError> {
        self.rest.get_json(&Self::list_path(filter)).await
    }

    #[instrument(skip(self), fields(payment = %payment))]
    async fn refund(&self, payment: PaymentId) -> Result<(), ApiError> {
        let path = format!("payments/{payment}/refund");
        self.rest
            .post_json::<_, serde_json::Value>(&path, &RefundRequest { payment_id: payment })
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickbite_core::{OrderId, UserId};

    #[test]
    fn test_list_path_without_filters() {
        assert_eq!(PaymentClient::list_path(&PaymentFilter::default()), "payments");
    }

    #[test]
    fn test_list_path_with_filters() {
        let filter = PaymentFilter {
            user_id: Some(UserId::new(3)),
            order_id: Some(OrderId::new(9)),
            status: Some(super::super::types::PaymentRecordStatus::Succeeded),
        };
        assert_eq!(
            PaymentClient::list_path(&filter),
            "payments?userId=3&orderId=9&status=SUCCEEDED"
        );
    }
}
