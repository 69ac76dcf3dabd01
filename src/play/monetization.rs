use reqwest::Method;
use serde_json::{Map, Value, json};

use crate::{
    Res,
    play::{PlayClient, segment},
};

/// Regions version sent when the caller does not pick one.
pub const DEFAULT_REGIONS_VERSION: &str = "2022/02";

#[derive(Debug, Clone, Copy, Default)]
pub struct PriceOptions {
    pub auto_convert_missing_prices: bool,
    pub allow_missing: bool,
}

impl PlayClient {
    // in-app products

    pub async fn list_in_app_products(&self, package: &str, max_results: Option<u32>, token: Option<String>) -> Res<Value> {
        let mut query = Vec::new();
        if let Some(max) = max_results {
            query.push(("maxResults", max.to_string()));
        }
        if let Some(token) = token {
            query.push(("token", token));
        }
        self.get(&self.app_url(package, "/inappproducts"), &query)
            .await
    }

    pub async fn list_all_in_app_products(&self, package: &str, max_results: Option<u32>) -> Res<Value> {
        super::collect_pages("inappproduct", |token| {
            self.list_in_app_products(package, max_results, token)
        })
        .await
    }

    pub async fn get_in_app_product(&self, package: &str, sku: &str) -> Res<Value> {
        self.get(&self.app_url(package, &format!("/inappproducts/{}", segment(sku))), &[])
            .await
    }

    pub async fn insert_in_app_product(&self, package: &str, mut product: Value, prices: PriceOptions) -> Res<Value> {
        set_field(&mut product, "packageName", json!(package));
        let query = [(
            "autoConvertMissingPrices",
            prices.auto_convert_missing_prices.to_string(),
        )];
        self.send_json(
            Method::POST,
            &self.app_url(package, "/inappproducts"),
            &query,
            Some(product),
        )
        .await
    }

    pub async fn update_in_app_product(&self, package: &str, sku: &str, mut product: Value, prices: PriceOptions) -> Res<Value> {
        set_field(&mut product, "packageName", json!(package));
        set_field(&mut product, "sku", json!(sku));
        let query = [
            (
                "autoConvertMissingPrices",
                prices.auto_convert_missing_prices.to_string(),
            ),
            ("allowMissing", prices.allow_missing.to_string()),
        ];
        self.send_json(
            Method::PUT,
            &self.app_url(package, &format!("/inappproducts/{}", segment(sku))),
            &query,
            Some(product),
        )
        .await
    }

    pub async fn delete_in_app_product(&self, package: &str, sku: &str) -> Res<Value> {
        let url = self.app_url(package, &format!("/inappproducts/{}", segment(sku)));
        self.send_json(Method::DELETE, &url, &[], None).await
    }

    pub async fn batch_get_in_app_products(&self, package: &str, skus: &[String]) -> Res<Value> {
        let query: Vec<(&str, String)> = skus.iter().map(|sku| ("sku", sku.clone())).collect();
        self.get(&self.app_url(package, "/inappproducts:batchGet"), &query)
            .await
    }

    pub async fn batch_update_in_app_products(&self, package: &str, products: Vec<Value>, prices: PriceOptions) -> Res<Value> {
        let requests: Vec<Value> = products
            .into_iter()
            .map(|mut product| {
                set_field(&mut product, "packageName", json!(package));
                let sku = product.get("sku").cloned().unwrap_or(Value::Null);
                json!({
                    "packageName": package,
                    "sku": sku,
                    "inappproduct": product,
                    "autoConvertMissingPrices": prices.auto_convert_missing_prices,
                    "allowMissing": prices.allow_missing,
                })
            })
            .collect();
        let url = self.app_url(package, "/inappproducts:batchUpdate");
        self.send_json(Method::POST, &url, &[], Some(json!({ "requests": requests })))
            .await
    }

    pub async fn batch_delete_in_app_products(&self, package: &str, skus: &[String]) -> Res<Value> {
        let requests: Vec<Value> = skus
            .iter()
            .map(|sku| json!({ "packageName": package, "sku": sku }))
            .collect();
        let url = self.app_url(package, "/inappproducts:batchDelete");
        self.send_json(Method::POST, &url, &[], Some(json!({ "requests": requests })))
            .await
    }

    // subscriptions

    pub async fn list_subscriptions(
        &self,
        package: &str,
        page_size: Option<u32>,
        show_archived: bool,
        page_token: Option<String>,
    ) -> Res<Value> {
        let mut query = Vec::new();
        if let Some(size) = page_size {
            query.push(("pageSize", size.to_string()));
        }
        if show_archived {
            query.push(("showArchived", "true".to_string()));
        }
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }
        self.get(&self.app_url(package, "/subscriptions"), &query)
            .await
    }

    pub async fn list_all_subscriptions(&self, package: &str, page_size: Option<u32>, show_archived: bool) -> Res<Value> {
        super::collect_pages("subscriptions", |token| {
            self.list_subscriptions(package, page_size, show_archived, token)
        })
        .await
    }

    pub async fn get_subscription(&self, package: &str, product_id: &str) -> Res<Value> {
        let url = self.app_url(package, &format!("/subscriptions/{}", segment(product_id)));
        self.get(&url, &[]).await
    }

    pub async fn create_subscription(
        &self,
        package: &str,
        product_id: &str,
        mut subscription: Value,
        regions_version: &str,
    ) -> Res<Value> {
        set_field(&mut subscription, "packageName", json!(package));
        set_field(&mut subscription, "productId", json!(product_id));
        let query = [
            ("productId", product_id.to_string()),
            ("regionsVersion.version", regions_version.to_string()),
        ];
        self.send_json(
            Method::POST,
            &self.app_url(package, "/subscriptions"),
            &query,
            Some(subscription),
        )
        .await
    }

    pub async fn update_subscription(
        &self,
        package: &str,
        product_id: &str,
        mut subscription: Value,
        update_mask: &str,
        regions_version: &str,
        allow_missing: bool,
    ) -> Res<Value> {
        set_field(&mut subscription, "packageName", json!(package));
        set_field(&mut subscription, "productId", json!(product_id));
        let mut query = vec![
            ("updateMask", update_mask.to_string()),
            ("regionsVersion.version", regions_version.to_string()),
        ];
        if allow_missing {
            query.push(("allowMissing", "true".to_string()));
        }
        self.send_json(
            Method::PATCH,
            &self.app_url(package, &format!("/subscriptions/{}", segment(product_id))),
            &query,
            Some(subscription),
        )
        .await
    }

    pub async fn delete_subscription(&self, package: &str, product_id: &str) -> Res<Value> {
        let url = self.app_url(package, &format!("/subscriptions/{}", segment(product_id)));
        self.send_json(Method::DELETE, &url, &[], None).await
    }

    pub async fn archive_subscription(&self, package: &str, product_id: &str) -> Res<Value> {
        let url = self.app_url(package, &format!("/subscriptions/{}:archive", segment(product_id)));
        self.send_json(Method::POST, &url, &[], Some(json!({}))).await
    }
}

fn set_field(target: &mut Value, key: &str, value: Value) {
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Some(object) = target.as_object_mut() {
        object.insert(key.to_string(), value);
    }
}

impl PlayClient {
    fn base_plan_url(&self, package: &str, product_id: &str, path: &str) -> String {
        self.app_url(
            package,
            &format!("/subscriptions/{}/basePlans{path}", segment(product_id)),
        )
    }

    fn offer_url(&self, package: &str, product_id: &str, base_plan_id: &str, path: &str) -> String {
        self.base_plan_url(
            package,
            product_id,
            &format!("/{}/offers{path}", segment(base_plan_id)),
        )
    }

    // base plans

    pub async fn activate_base_plan(&self, package: &str, product_id: &str, base_plan_id: &str) -> Res<Value> {
        let url = self.base_plan_url(package, product_id, &format!("/{}:activate", segment(base_plan_id)));
        self.send_json(Method::POST, &url, &[], Some(json!({}))).await
    }

    pub async fn deactivate_base_plan(&self, package: &str, product_id: &str, base_plan_id: &str) -> Res<Value> {
        let url = self.base_plan_url(package, product_id, &format!("/{}:deactivate", segment(base_plan_id)));
        self.send_json(Method::POST, &url, &[], Some(json!({}))).await
    }

    pub async fn delete_base_plan(&self, package: &str, product_id: &str, base_plan_id: &str) -> Res<Value> {
        let url = self.base_plan_url(package, product_id, &format!("/{}", segment(base_plan_id)));
        self.send_json(Method::DELETE, &url, &[], None).await
    }

    pub async fn migrate_base_plan_prices(
        &self,
        package: &str,
        product_id: &str,
        base_plan_id: &str,
        request: Value,
    ) -> Res<Value> {
        let url = self.base_plan_url(package, product_id, &format!("/{}:migratePrices", segment(base_plan_id)));
        self.send_json(Method::POST, &url, &[], Some(request)).await
    }

    pub async fn batch_update_base_plan_states(&self, package: &str, product_id: &str, request: Value) -> Res<Value> {
        let url = self.base_plan_url(package, product_id, ":batchUpdateStates");
        self.send_json(Method::POST, &url, &[], Some(request)).await
    }

    pub async fn batch_migrate_base_plan_prices(&self, package: &str, product_id: &str, request: Value) -> Res<Value> {
        let url = self.base_plan_url(package, product_id, ":batchMigratePrices");
        self.send_json(Method::POST, &url, &[], Some(request)).await
    }

    // offers

    pub async fn list_offers(
        &self,
        package: &str,
        product_id: &str,
        base_plan_id: &str,
        page_size: Option<u32>,
        page_token: Option<String>,
    ) -> Res<Value> {
        let mut query = Vec::new();
        if let Some(size) = page_size {
            query.push(("pageSize", size.to_string()));
        }
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }
        let url = self.offer_url(package, product_id, base_plan_id, "");
        self.get(&url, &query).await
    }

    pub async fn list_all_offers(
        &self,
        package: &str,
        product_id: &str,
        base_plan_id: &str,
        page_size: Option<u32>,
    ) -> Res<Value> {
        super::collect_pages("subscriptionOffers", |token| {
            self.list_offers(package, product_id, base_plan_id, page_size, token)
        })
        .await
    }

    pub async fn get_offer(&self, package: &str, product_id: &str, base_plan_id: &str, offer_id: &str) -> Res<Value> {
        let url = self.offer_url(package, product_id, base_plan_id, &format!("/{}", segment(offer_id)));
        self.get(&url, &[]).await
    }

    pub async fn create_offer(
        &self,
        package: &str,
        product_id: &str,
        base_plan_id: &str,
        offer_id: &str,
        mut offer: Value,
        regions_version: &str,
    ) -> Res<Value> {
        set_field(&mut offer, "packageName", json!(package));
        set_field(&mut offer, "productId", json!(product_id));
        set_field(&mut offer, "basePlanId", json!(base_plan_id));
        set_field(&mut offer, "offerId", json!(offer_id));
        let query = [
            ("offerId", offer_id.to_string()),
            ("regionsVersion.version", regions_version.to_string()),
        ];
        let url = self.offer_url(package, product_id, base_plan_id, "");
        self.send_json(Method::POST, &url, &query, Some(offer)).await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update_offer(
        &self,
        package: &str,
        product_id: &str,
        base_plan_id: &str,
        offer_id: &str,
        mut offer: Value,
        update_mask: &str,
        regions_version: &str,
        allow_missing: bool,
    ) -> Res<Value> {
        set_field(&mut offer, "packageName", json!(package));
        set_field(&mut offer, "productId", json!(product_id));
        set_field(&mut offer, "basePlanId", json!(base_plan_id));
        set_field(&mut offer, "offerId", json!(offer_id));
        let mut query = vec![
            ("updateMask", update_mask.to_string()),
            ("regionsVersion.version", regions_version.to_string()),
        ];
        if allow_missing {
            query.push(("allowMissing", "true".to_string()));
        }
        let url = self.offer_url(package, product_id, base_plan_id, &format!("/{}", segment(offer_id)));
        self.send_json(Method::PATCH, &url, &query, Some(offer)).await
    }

    pub async fn activate_offer(&self, package: &str, product_id: &str, base_plan_id: &str, offer_id: &str) -> Res<Value> {
        let url = self.offer_url(package, product_id, base_plan_id, &format!("/{}:activate", segment(offer_id)));
        self.send_json(Method::POST, &url, &[], Some(json!({}))).await
    }

    pub async fn deactivate_offer(&self, package: &str, product_id: &str, base_plan_id: &str, offer_id: &str) -> Res<Value> {
        let url = self.offer_url(package, product_id, base_plan_id, &format!("/{}:deactivate", segment(offer_id)));
        self.send_json(Method::POST, &url, &[], Some(json!({}))).await
    }

    pub async fn delete_offer(&self, package: &str, product_id: &str, base_plan_id: &str, offer_id: &str) -> Res<Value> {
        let url = self.offer_url(package, product_id, base_plan_id, &format!("/{}", segment(offer_id)));
        self.send_json(Method::DELETE, &url, &[], None).await
    }

    pub async fn batch_get_offers(
        &self,
        package: &str,
        product_id: &str,
        base_plan_id: &str,
        offer_ids: &[String],
    ) -> Res<Value> {
        let requests: Vec<Value> = offer_ids
            .iter()
            .map(|id| {
                json!({
                    "packageName": package,
                    "productId": product_id,
                    "basePlanId": base_plan_id,
                    "offerId": id,
                })
            })
            .collect();
        let url = self.offer_url(package, product_id, base_plan_id, ":batchGet");
        self.send_json_always(Method::POST, &url, Some(json!({ "requests": requests })))
            .await
    }

    pub async fn batch_update_offers(&self, package: &str, product_id: &str, base_plan_id: &str, request: Value) -> Res<Value> {
        let url = self.offer_url(package, product_id, base_plan_id, ":batchUpdate");
        self.send_json(Method::POST, &url, &[], Some(request)).await
    }

    pub async fn batch_update_offer_states(
        &self,
        package: &str,
        product_id: &str,
        base_plan_id: &str,
        request: Value,
    ) -> Res<Value> {
        let url = self.offer_url(package, product_id, base_plan_id, ":batchUpdateStates");
        self.send_json(Method::POST, &url, &[], Some(request)).await
    }
}
