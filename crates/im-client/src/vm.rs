//! Virtual machine handle

use crate::client::ImClient;
use crate::error::{ImError, Result};
use crate::resource::{CloudResource, last_segment};
use crate::response::ImResponse;
use crate::template::TemplateType;
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

/// A VM inside an infrastructure
#[derive(Debug, Clone)]
pub struct VirtualMachine {
    client: ImClient,
    full_id: String,
    id: String,
    infrastructure_id: String,
    radl: Option<String>,
    state: Option<String>,
}

impl VirtualMachine {
    /// Handle for VM `id` of infrastructure `infrastructure_id`
    pub fn new(
        client: &ImClient,
        infrastructure_id: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        let infrastructure_id = infrastructure_id.into();
        let id = id.into();
        let full_id = format!(
            "{}/{}/vms/{}",
            client.infrastructures_url(),
            infrastructure_id,
            id
        );
        Self {
            client: client.clone(),
            full_id,
            id,
            infrastructure_id,
            radl: None,
            state: None,
        }
    }

    /// Handle for a VM given its full URL
    /// (`.../infrastructures/<inf_id>/vms/<vm_id>`).
    pub fn from_url(client: &ImClient, url: impl Into<String>) -> Result<Self> {
        let full_id = url.into();

        let (parent, id) = full_id
            .rsplit_once('/')
            .ok_or_else(|| ImError::InvalidResourceUrl(full_id.clone()))?;
        let infrastructure_url = parent
            .strip_suffix("/vms")
            .ok_or_else(|| ImError::InvalidResourceUrl(full_id.clone()))?;
        let infrastructure_id = last_segment(infrastructure_url);
        if id.is_empty() || infrastructure_id.is_empty() {
            return Err(ImError::InvalidResourceUrl(full_id));
        }

        let id = id.to_string();
        let infrastructure_id = infrastructure_id.to_string();
        Ok(Self {
            client: client.clone(),
            full_id,
            id,
            infrastructure_id,
            radl: None,
            state: None,
        })
    }

    pub fn infrastructure_id(&self) -> &str {
        &self.infrastructure_id
    }

    /// RADL cached by the last `get_info` or `alter`
    pub fn radl(&self) -> Option<&str> {
        self.radl.as_deref()
    }

    /// State cached by the last `Infrastructure::get_state`
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub(crate) fn set_state(&mut self, state: impl Into<String>) {
        self.state = Some(state.into());
    }

    /// Destroy the VM.
    ///
    /// With `context` false the infrastructure is not re-contextualized
    /// after the deletion.
    pub async fn destroy(&self, context: bool) -> Result<ImResponse<String>> {
        if context {
            self.destroy_with(&[]).await
        } else {
            self.destroy_with(&[("context", "false")]).await
        }
    }

    pub async fn reboot(&self) -> Result<ImResponse<String>> {
        self.perform_operation("reboot").await
    }

    /// Create a snapshot of disk `disk` named `image_name`.
    ///
    /// With `auto_delete` the image is removed when the VM is destroyed.
    pub async fn create_disk_snapshot(
        &self,
        disk: u32,
        image_name: &str,
        auto_delete: bool,
    ) -> Result<ImResponse<String>> {
        let url = format!("{}/disks/{}/snapshot", self.full_id, disk);
        let mut query = vec![("image_name", image_name)];
        if auto_delete {
            query.push(("auto_delete", "true"));
        }

        let response = self
            .client
            .request(Method::PUT, &url)
            .query(&query)
            .send()
            .await?;
        ImResponse::from_text(response).await
    }

    /// Modify the VM features. On success the new RADL is cached and returned.
    pub async fn alter(
        &mut self,
        template: impl Into<String>,
        template_type: TemplateType,
    ) -> Result<ImResponse<String>> {
        let response = self
            .client
            .request_with_body(
                Method::PUT,
                &self.full_id,
                template_type.content_type(),
                template.into(),
            )
            .send()
            .await?;

        let altered = ImResponse::<VmRadl>::from_json(response)
            .await?
            .map(|info| radl_text(info.radl));
        if let Some(radl) = altered.data() {
            self.radl = Some(radl.clone());
        }
        Ok(altered)
    }
}

#[async_trait]
impl CloudResource for VirtualMachine {
    type Info = String;

    fn client(&self) -> &ImClient {
        &self.client
    }

    fn full_id(&self) -> &str {
        &self.full_id
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn extract_info(&mut self, info: Value) -> Result<String> {
        let info: VmRadl = serde_json::from_value(info)?;
        let radl = radl_text(info.radl);
        self.radl = Some(radl.clone());
        Ok(radl)
    }
}

/// RADL comes back as text or, when rendered as JSON, as a document; the
/// latter is kept as its JSON text.
fn radl_text(radl: Value) -> String {
    match radl {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct VmRadl {
    radl: Value,
}
