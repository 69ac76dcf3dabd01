use reqwest::Method;
use serde_json::{Value, json};

use crate::{
    Res,
    play::{PlayClient, segment},
};

pub const BUNDLE_CONTENT_TYPE: &str = "application/octet-stream";
pub const APK_CONTENT_TYPE: &str = "application/vnd.android.package-archive";

impl PlayClient {
    pub async fn list_bundles(&self, package: &str, edit: &str) -> Res<Value> {
        self.get(&self.edit_url(package, edit, "/bundles"), &[]).await
    }

    pub async fn upload_bundle(&self, package: &str, edit: &str, data: Vec<u8>) -> Res<Value> {
        let url = self.upload_url(package, &format!("/edits/{}/bundles", segment(edit)));
        self.upload(&url, &[], BUNDLE_CONTENT_TYPE, data).await
    }

    pub async fn list_apks(&self, package: &str, edit: &str) -> Res<Value> {
        self.get(&self.edit_url(package, edit, "/apks"), &[]).await
    }

    pub async fn upload_apk(&self, package: &str, edit: &str, data: Vec<u8>) -> Res<Value> {
        let url = self.upload_url(package, &format!("/edits/{}/apks", segment(edit)));
        self.upload(&url, &[], APK_CONTENT_TYPE, data).await
    }

    pub async fn add_externally_hosted_apk(&self, package: &str, edit: &str, apk: Value) -> Res<Value> {
        let url = self.edit_url(package, edit, "/apks/externallyHosted");
        let body = json!({ "externallyHostedApk": apk });
        self.send_json(Method::POST, &url, &[], Some(body)).await
    }

    /// Uploads a ProGuard mapping (`proguard`) or native symbols (`nativeCode`) file.
    pub async fn upload_deobfuscation_file(
        &self,
        package: &str,
        edit: &str,
        version_code: i64,
        file_type: &str,
        data: Vec<u8>,
    ) -> Res<Value> {
        let url = self.upload_url(
            package,
            &format!("/edits/{}/apks/{version_code}/deobfuscationFiles/{file_type}", segment(edit)),
        );
        self.upload(&url, &[], BUNDLE_CONTENT_TYPE, data).await
    }
}
