use reqwest::Method;
use serde_json::{Value, json};

use crate::{
    Res,
    play::{PlayClient, segment},
};

#[derive(Debug, Clone, Default)]
pub struct VoidedQuery {
    pub max_results: Option<u32>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub voided_type: Option<u8>,
    pub include_quantity_based_partial_refund: bool,
}

impl VoidedQuery {
    fn params(&self, token: Option<String>) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(max) = self.max_results {
            params.push(("maxResults", max.to_string()));
        }
        if let Some(start) = self.start_time {
            params.push(("startTime", start.to_string()));
        }
        if let Some(end) = self.end_time {
            params.push(("endTime", end.to_string()));
        }
        if let Some(kind) = self.voided_type {
            params.push(("type", kind.to_string()));
        }
        if self.include_quantity_based_partial_refund {
            params.push(("includeQuantityBasedPartialRefund", "true".to_string()));
        }
        if let Some(token) = token {
            params.push(("token", token));
        }
        params
    }
}

impl PlayClient {
    fn product_purchase_url(&self, package: &str, product_id: &str, token: &str, action: &str) -> String {
        self.app_url(
            package,
            &format!(
                "/purchases/products/{}/tokens/{}{action}",
                segment(product_id),
                segment(token)
            ),
        )
    }

    fn subscription_purchase_url(&self, package: &str, subscription_id: &str, token: &str, action: &str) -> String {
        self.app_url(
            package,
            &format!(
                "/purchases/subscriptions/{}/tokens/{}{action}",
                segment(subscription_id),
                segment(token)
            ),
        )
    }

    pub async fn get_product_purchase(&self, package: &str, product_id: &str, token: &str) -> Res<Value> {
        let url = self.product_purchase_url(package, product_id, token, "");
        self.get(&url, &[]).await
    }

    pub async fn acknowledge_product_purchase(
        &self,
        package: &str,
        product_id: &str,
        token: &str,
        developer_payload: Option<&str>,
    ) -> Res<Value> {
        let url = self.product_purchase_url(package, product_id, token, ":acknowledge");
        let body = match developer_payload {
            Some(payload) => json!({ "developerPayload": payload }),
            None => json!({}),
        };
        self.send_json(Method::POST, &url, &[], Some(body)).await
    }

    pub async fn consume_product_purchase(&self, package: &str, product_id: &str, token: &str) -> Res<Value> {
        let url = self.product_purchase_url(package, product_id, token, ":consume");
        self.send_json(Method::POST, &url, &[], None).await
    }

    pub async fn get_product_purchase_v2(&self, package: &str, token: &str) -> Res<Value> {
        let url = self.app_url(package, &format!("/purchases/productsv2/tokens/{}", segment(token)));
        self.get(&url, &[]).await
    }

    pub async fn get_subscription_purchase(&self, package: &str, token: &str) -> Res<Value> {
        let url = self.app_url(package, &format!("/purchases/subscriptionsv2/tokens/{}", segment(token)));
        self.get(&url, &[]).await
    }

    pub async fn cancel_subscription_purchase(&self, package: &str, subscription_id: &str, token: &str) -> Res<Value> {
        let url = self.subscription_purchase_url(package, subscription_id, token, ":cancel");
        self.send_json(Method::POST, &url, &[], None).await
    }

    pub async fn defer_subscription_purchase(
        &self,
        package: &str,
        subscription_id: &str,
        token: &str,
        request: Value,
    ) -> Res<Value> {
        let url = self.subscription_purchase_url(package, subscription_id, token, ":defer");
        self.send_json(Method::POST, &url, &[], Some(request)).await
    }

    pub async fn revoke_subscription_purchase(&self, package: &str, subscription_id: &str, token: &str) -> Res<Value> {
        let url = self.subscription_purchase_url(package, subscription_id, token, ":revoke");
        self.send_json(Method::POST, &url, &[], None).await
    }

    pub async fn list_voided_purchases(&self, package: &str, query: &VoidedQuery, token: Option<String>) -> Res<Value> {
        let url = self.app_url(package, "/purchases/voidedpurchases");
        self.get(&url, &query.params(token)).await
    }

    pub async fn list_all_voided_purchases(&self, package: &str, query: &VoidedQuery) -> Res<Value> {
        super::collect_pages("voidedPurchases", |token| {
            self.list_voided_purchases(package, query, token)
        })
        .await
    }

    // orders

    pub async fn get_order(&self, package: &str, order_id: &str) -> Res<Value> {
        self.get(&self.app_url(package, &format!("/orders/{}", segment(order_id))), &[])
            .await
    }

    pub async fn batch_get_orders(&self, package: &str, order_ids: &[String]) -> Res<Value> {
        let query: Vec<(&str, String)> = order_ids
            .iter()
            .map(|id| ("orderIds", id.clone()))
            .collect();
        self.get(&self.app_url(package, "/orders:batchGet"), &query)
            .await
    }

    pub async fn refund_order(&self, package: &str, order_id: &str, revoke: bool) -> Res<Value> {
        let url = self.app_url(package, &format!("/orders/{}:refund", segment(order_id)));
        let query = if revoke {
            vec![("revoke", "true".to_string())]
        } else {
            Vec::new()
        };
        self.send_json(Method::POST, &url, &query, None).await
    }
}
