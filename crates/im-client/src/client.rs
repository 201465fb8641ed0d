//! IM REST API client
//!
//! Entry point of the library. Holds the service URL, the auth data and the
//! HTTP transport, and mints [`Infrastructure`] and [`VirtualMachine`] handles
//! that share it.
//!
//! See <https://imdocs.readthedocs.io/en/latest/REST.html> for the REST API.

use crate::auth::AuthData;
use crate::error::Result;
use crate::infrastructure::Infrastructure;
use crate::resource::CloudResource;
use crate::response::{ImResponse, UriList};
use crate::template::TemplateType;
use crate::vm::VirtualMachine;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Infrastructure Manager client
///
/// Cloning is cheap: clones share the same auth data and connection pool.
#[derive(Clone)]
pub struct ImClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: String,
    auth: AuthData,
}

impl ImClient {
    /// Create a new client for the IM service at `base_url`
    pub fn new(base_url: impl Into<String>, auth: AuthData) -> Self {
        Self::with_http_client(base_url, auth, reqwest::Client::new())
    }

    /// Create a client on top of a preconfigured transport.
    ///
    /// The client itself sets no timeout; configure one here if needed.
    pub fn with_http_client(
        base_url: impl Into<String>,
        auth: AuthData,
        http: reqwest::Client,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                auth,
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn auth_data(&self) -> &AuthData {
        &self.inner.auth
    }

    /// URL of the infrastructures collection
    pub(crate) fn infrastructures_url(&self) -> String {
        format!("{}/infrastructures", self.inner.base_url)
    }

    /// Start an authenticated request.
    ///
    /// The `Authorization` header is rendered from the auth data on every call.
    pub(crate) fn request(&self, method: Method, url: &str) -> RequestBuilder {
        tracing::debug!("{} {}", method, url);
        self.inner
            .http
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, self.inner.auth.format_auth_data())
    }

    /// Start an authenticated request carrying a template body.
    pub(crate) fn request_with_body(
        &self,
        method: Method,
        url: &str,
        content_type: &'static str,
        body: String,
    ) -> RequestBuilder {
        self.request(method, url)
            .header(CONTENT_TYPE, content_type)
            .body(body)
    }

    /// Handle for an existing infrastructure, by ID or full URL
    pub fn infrastructure(&self, id: impl Into<String>) -> Infrastructure {
        Infrastructure::new(self, id)
    }

    /// Handle for an existing VM
    pub fn virtual_machine(
        &self,
        infrastructure_id: impl Into<String>,
        id: impl Into<String>,
    ) -> VirtualMachine {
        VirtualMachine::new(self, infrastructure_id, id)
    }

    /// Handle for an existing VM given its full URL
    pub fn virtual_machine_from_url(&self, url: &str) -> Result<VirtualMachine> {
        VirtualMachine::from_url(self, url)
    }

    /// Get the IM service version.
    ///
    /// Returns the raw response text. Unlike the other calls this is neither
    /// authenticated nor wrapped in an [`ImResponse`].
    pub async fn get_version(&self) -> Result<String> {
        let url = format!("{}/version", self.inner.base_url);
        tracing::debug!("GET {}", url);
        let response = self.inner.http.get(&url).send().await?;
        Ok(response.text().await?)
    }

    /// List the infrastructures visible with the current credentials
    pub async fn get_infrastructure_list(&self) -> Result<ImResponse<Vec<Infrastructure>>> {
        let response = self
            .request(Method::GET, &self.infrastructures_url())
            .send()
            .await?;

        Ok(ImResponse::<UriList>::from_json(response)
            .await?
            .map(|list| {
                list.uri_list
                    .into_iter()
                    .map(|entry| Infrastructure::new(self, entry.uri))
                    .collect()
            }))
    }

    /// Create a new infrastructure from a template
    pub async fn create_infrastructure(
        &self,
        template: impl Into<String>,
        template_type: TemplateType,
    ) -> Result<ImResponse<Infrastructure>> {
        let response = self
            .request_with_body(
                Method::POST,
                &self.infrastructures_url(),
                template_type.content_type(),
                template.into(),
            )
            .send()
            .await?;

        let created = ImResponse::<CreatedInfrastructure>::from_json(response)
            .await?
            .map(|created| Infrastructure::new(self, created.uri));
        if let Some(inf) = created.data() {
            tracing::info!("Created infrastructure {}", inf.id());
        }
        Ok(created)
    }

    /// Import an infrastructure from the JSON produced by
    /// [`Infrastructure::export`].
    pub async fn import_infrastructure(
        &self,
        data: impl Into<String>,
    ) -> Result<ImResponse<Infrastructure>> {
        let response = self
            .request_with_body(
                Method::PUT,
                &self.infrastructures_url(),
                TemplateType::Json.content_type(),
                data.into(),
            )
            .send()
            .await?;

        Ok(ImResponse::from_text(response)
            .await?
            .map(|body| Infrastructure::new(self, body.trim())))
    }
}

impl fmt::Debug for ImClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImClient")
            .field("base_url", &self.inner.base_url)
            .field("auth_items", &self.inner.auth.items().len())
            .finish()
    }
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct CreatedInfrastructure {
    uri: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthDataItem;

    fn client(url: &str) -> ImClient {
        let auth = AuthData::new(vec![AuthDataItem::new("im", "InfrastructureManager")
            .with_field("username", "user")
            .with_field("password", "pass")])
        .unwrap();
        ImClient::new(url, auth)
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let im = client("https://im.example.com:8800/");
        assert_eq!(im.base_url(), "https://im.example.com:8800");
        assert_eq!(
            im.infrastructures_url(),
            "https://im.example.com:8800/infrastructures"
        );
    }

    #[test]
    fn test_clones_share_state() {
        let im = client("https://im.example.com");
        let other = im.clone();
        assert!(Arc::ptr_eq(&im.inner, &other.inner));
    }

    #[test]
    fn test_debug_hides_auth() {
        let im = client("https://im.example.com");
        let debug = format!("{:?}", im);
        assert!(debug.contains("im.example.com"));
        assert!(!debug.contains("pass"));
    }
}
