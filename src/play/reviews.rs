use reqwest::Method;
use serde_json::{Value, json};

use crate::{
    Res,
    play::{PlayClient, segment},
};

#[derive(Debug, Clone, Default)]
pub struct ReviewQuery {
    pub max_results: Option<u32>,
    pub start_index: Option<u32>,
    pub translation_language: Option<String>,
    pub token: Option<String>,
}

impl ReviewQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(max) = self.max_results {
            params.push(("maxResults", max.to_string()));
        }
        if let Some(start) = self.start_index {
            params.push(("startIndex", start.to_string()));
        }
        if let Some(language) = &self.translation_language {
            params.push(("translationLanguage", language.clone()));
        }
        if let Some(token) = &self.token {
            params.push(("token", token.clone()));
        }
        params
    }
}

impl PlayClient {
    pub async fn list_reviews(&self, package: &str, query: &ReviewQuery) -> Res<Value> {
        self.get(&self.app_url(package, "/reviews"), &query.params())
            .await
    }

    /// Fetches every page of reviews into `{"reviews": [...]}`.
    pub async fn list_all_reviews(&self, package: &str, query: &ReviewQuery) -> Res<Value> {
        super::collect_pages("reviews", |token| {
            let page = ReviewQuery {
                token,
                ..query.clone()
            };
            async move { self.list_reviews(package, &page).await }
        })
        .await
    }

    pub async fn get_review(&self, package: &str, review_id: &str, translation_language: Option<&str>) -> Res<Value> {
        let query: Vec<(&str, String)> = translation_language
            .map(|l| vec![("translationLanguage", l.to_string())])
            .unwrap_or_default();
        self.get(&self.app_url(package, &format!("/reviews/{}", segment(review_id))), &query)
            .await
    }

    pub async fn reply_review(&self, package: &str, review_id: &str, text: &str) -> Res<Value> {
        let url = self.app_url(package, &format!("/reviews/{}:reply", segment(review_id)));
        self.send_json(Method::POST, &url, &[], Some(json!({ "replyText": text })))
            .await
    }
}
