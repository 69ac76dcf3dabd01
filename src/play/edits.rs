use reqwest::Method;
use serde_json::{Value, json};

use crate::{
    Res,
    play::{PlayClient, segment},
    types::{AppEdit, Track},
};

/// Store-listing image types accepted by the images endpoints.
pub const IMAGE_TYPES: &[&str] = &[
    "featureGraphic",
    "icon",
    "phoneScreenshots",
    "promoGraphic",
    "sevenInchScreenshots",
    "tenInchScreenshots",
    "tvBanner",
    "tvScreenshots",
    "wearScreenshots",
];

impl PlayClient {
    pub(crate) fn edit_url(&self, package: &str, edit: &str, path: &str) -> String {
        self.app_url(package, &format!("/edits/{}{path}", segment(edit)))
    }

    pub async fn insert_edit(&self, package: &str) -> Res<AppEdit> {
        let value = self
            .send_json_always(Method::POST, &self.app_url(package, "/edits"), Some(json!({})))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn get_edit(&self, package: &str, edit: &str) -> Res<Value> {
        self.get(&self.edit_url(package, edit, ""), &[]).await
    }

    pub async fn validate_edit(&self, package: &str, edit: &str) -> Res<Value> {
        let url = self.edit_url(package, edit, ":validate");
        self.send_json(Method::POST, &url, &[], None).await
    }

    pub async fn commit_edit(&self, package: &str, edit: &str, changes_not_sent_for_review: bool) -> Res<Value> {
        let url = self.edit_url(package, edit, ":commit");
        let query = if changes_not_sent_for_review {
            vec![("changesNotSentForReview", "true".to_string())]
        } else {
            Vec::new()
        };
        self.send_json(Method::POST, &url, &query, None).await
    }

    pub async fn delete_edit(&self, package: &str, edit: &str) -> Res<Value> {
        let url = self.edit_url(package, edit, "");
        self.send_json(Method::DELETE, &url, &[], None).await
    }

    // tracks

    pub async fn list_tracks(&self, package: &str, edit: &str) -> Res<Value> {
        self.get(&self.edit_url(package, edit, "/tracks"), &[]).await
    }

    pub async fn get_track(&self, package: &str, edit: &str, track: &str) -> Res<Track> {
        let value = self
            .get(&self.edit_url(package, edit, &format!("/tracks/{}", segment(track))), &[])
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Replaces (`PUT`) or patches (`PATCH`) the releases of a track.
    pub async fn write_track(
        &self,
        method: Method,
        package: &str,
        edit: &str,
        track: &Track,
    ) -> Res<Value> {
        let url = self.edit_url(package, edit, &format!("/tracks/{}", segment(&track.track)));
        self.send_json(method, &url, &[], Some(serde_json::to_value(track)?))
            .await
    }

    pub async fn get_country_availability(&self, package: &str, edit: &str, track: &str) -> Res<Value> {
        let url = self.edit_url(package, edit, &format!("/countryAvailability/{}", segment(track)));
        self.get(&url, &[]).await
    }

    // listings

    pub async fn list_listings(&self, package: &str, edit: &str) -> Res<Value> {
        self.get(&self.edit_url(package, edit, "/listings"), &[]).await
    }

    pub async fn get_listing(&self, package: &str, edit: &str, language: &str) -> Res<Value> {
        let url = self.edit_url(package, edit, &format!("/listings/{}", segment(language)));
        self.get(&url, &[]).await
    }

    pub async fn write_listing(
        &self,
        method: Method,
        package: &str,
        edit: &str,
        language: &str,
        listing: Value,
    ) -> Res<Value> {
        let url = self.edit_url(package, edit, &format!("/listings/{}", segment(language)));
        self.send_json(method, &url, &[], Some(listing)).await
    }

    pub async fn delete_listing(&self, package: &str, edit: &str, language: &str) -> Res<Value> {
        let url = self.edit_url(package, edit, &format!("/listings/{}", segment(language)));
        self.send_json(Method::DELETE, &url, &[], None).await
    }

    pub async fn delete_all_listings(&self, package: &str, edit: &str) -> Res<Value> {
        let url = self.edit_url(package, edit, "/listings");
        self.send_json(Method::DELETE, &url, &[], None).await
    }

    // images

    pub async fn list_images(&self, package: &str, edit: &str, language: &str, image_type: &str) -> Res<Value> {
        let url = self.edit_url(package, edit, &format!("/listings/{}/{}", segment(language), segment(image_type)));
        self.get(&url, &[]).await
    }

    pub async fn upload_image(
        &self,
        package: &str,
        edit: &str,
        language: &str,
        image_type: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Res<Value> {
        let path = format!(
            "/edits/{}/listings/{}/{}",
            segment(edit),
            segment(language),
            segment(image_type)
        );
        let url = self.upload_url(package, &path);
        self.upload(&url, &[], content_type, data).await
    }

    pub async fn delete_image(
        &self,
        package: &str,
        edit: &str,
        language: &str,
        image_type: &str,
        image_id: &str,
    ) -> Res<Value> {
        let url = self.edit_url(
            package,
            edit,
            &format!("/listings/{}/{}/{}", segment(language), segment(image_type), segment(image_id)),
        );
        self.send_json(Method::DELETE, &url, &[], None).await
    }

    pub async fn delete_all_images(&self, package: &str, edit: &str, language: &str, image_type: &str) -> Res<Value> {
        let url = self.edit_url(package, edit, &format!("/listings/{}/{}", segment(language), segment(image_type)));
        self.send_json(Method::DELETE, &url, &[], None).await
    }

    // details

    pub async fn get_details(&self, package: &str, edit: &str) -> Res<Value> {
        self.get(&self.edit_url(package, edit, "/details"), &[]).await
    }

    pub async fn write_details(&self, method: Method, package: &str, edit: &str, details: Value) -> Res<Value> {
        let url = self.edit_url(package, edit, "/details");
        self.send_json(method, &url, &[], Some(details)).await
    }

    // testers

    pub async fn get_testers(&self, package: &str, edit: &str, track: &str) -> Res<Value> {
        let url = self.edit_url(package, edit, &format!("/testers/{}", segment(track)));
        self.get(&url, &[]).await
    }

    pub async fn write_testers(
        &self,
        method: Method,
        package: &str,
        edit: &str,
        track: &str,
        testers: Value,
    ) -> Res<Value> {
        let url = self.edit_url(package, edit, &format!("/testers/{}", segment(track)));
        self.send_json(method, &url, &[], Some(testers)).await
    }
}
