//! Operations shared by every IM cloud resource

use crate::client::ImClient;
use crate::error::Result;
use crate::response::ImResponse;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

/// A remote resource addressed by its full URL.
///
/// Infrastructures and VMs implement this trait to get the common calls.
/// Each one issues a single request and decides through
/// [`CloudResource::extract_info`] what `get_info` returns.
#[async_trait]
pub trait CloudResource: Send + Sync {
    /// Payload returned by [`CloudResource::get_info`]
    type Info: Send;

    /// Client this resource was created from
    fn client(&self) -> &ImClient;

    /// Absolute URL of the resource
    fn full_id(&self) -> &str;

    /// Short identifier of the resource
    fn id(&self) -> &str;

    /// Turn the `get_info` JSON into the payload, updating local caches.
    fn extract_info(&mut self, info: Value) -> Result<Self::Info>;

    /// Delete the remote resource, appending `query` to its URL.
    async fn destroy_with(&self, query: &[(&str, &str)]) -> Result<ImResponse<String>> {
        let response = self
            .client()
            .request(Method::DELETE, self.full_id())
            .query(query)
            .send()
            .await?;
        ImResponse::from_text(response).await
    }

    /// Get the resource description
    async fn get_info(&mut self) -> Result<ImResponse<Self::Info>> {
        let response = self
            .client()
            .request(Method::GET, self.full_id())
            .send()
            .await?;
        ImResponse::<Value>::from_json(response)
            .await?
            .try_map(|info| self.extract_info(info))
    }

    /// Get a sub-resource property such as `contmsg` or `outputs`.
    ///
    /// The service wraps a property in an object keyed by its name; that
    /// member is returned when present, the whole document otherwise.
    async fn get_property(
        &self,
        property: &str,
        query: &[(&str, &str)],
    ) -> Result<ImResponse<Value>> {
        let url = format!("{}/{}", self.full_id(), property);
        let response = self
            .client()
            .request(Method::GET, &url)
            .query(query)
            .send()
            .await?;
        Ok(ImResponse::<Value>::from_json(response)
            .await?
            .map(|mut value| value.get_mut(property).map(Value::take).unwrap_or(value)))
    }

    /// Get the contextualization log
    async fn get_cont_msg(&self) -> Result<ImResponse<Value>> {
        self.get_property("contmsg", &[]).await
    }

    /// Run a named operation (`PUT <full_id>/<operation>`)
    async fn perform_operation(&self, operation: &str) -> Result<ImResponse<String>> {
        let url = format!("{}/{}", self.full_id(), operation);
        let response = self.client().request(Method::PUT, &url).send().await?;
        ImResponse::from_text(response).await
    }

    async fn start(&self) -> Result<ImResponse<String>> {
        self.perform_operation("start").await
    }

    async fn stop(&self) -> Result<ImResponse<String>> {
        self.perform_operation("stop").await
    }
}

/// Last path segment of a URL
pub(crate) fn last_segment(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("http://im:8800/infrastructures/abc"), "abc");
        assert_eq!(last_segment("abc"), "abc");
        assert_eq!(last_segment("http://im/infrastructures/"), "");
    }
}
