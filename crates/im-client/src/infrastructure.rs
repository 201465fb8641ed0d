//! Infrastructure handle

use crate::client::ImClient;
use crate::error::Result;
use crate::resource::{CloudResource, last_segment};
use crate::response::{ImResponse, UriList};
use crate::template::TemplateType;
use crate::vm::VirtualMachine;
use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A set of VMs managed as one unit by the IM service
#[derive(Debug, Clone)]
pub struct Infrastructure {
    client: ImClient,
    full_id: String,
    id: String,
    vms: Vec<VirtualMachine>,
    state: Option<String>,
}

/// Infrastructure state as reported by `GET /infrastructures/<id>/state`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfrastructureState {
    /// Aggregated state (e.g. "running", "configured", "unconfigured")
    pub state: String,

    /// State of each VM indexed by VM ID
    #[serde(default)]
    pub vm_states: HashMap<String, String>,
}

impl Infrastructure {
    /// Handle for an infrastructure given its ID or its full URL
    pub fn new(client: &ImClient, id: impl Into<String>) -> Self {
        let id = id.into();
        let (full_id, id) = if id.starts_with("https://") || id.starts_with("http://") {
            let short = last_segment(&id).to_string();
            (id, short)
        } else {
            (format!("{}/{}", client.infrastructures_url(), id), id)
        };

        Self {
            client: client.clone(),
            full_id,
            id,
            vms: Vec::new(),
            state: None,
        }
    }

    /// VMs cached by the last `get_info` or `add_resource`
    pub fn vms(&self) -> &[VirtualMachine] {
        &self.vms
    }

    pub fn vms_mut(&mut self) -> &mut [VirtualMachine] {
        &mut self.vms
    }

    /// Cached VM by ID
    pub fn vm(&self, id: &str) -> Option<&VirtualMachine> {
        self.vms.iter().find(|vm| vm.id() == id)
    }

    /// State cached by the last `get_state`
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// Get the infrastructure state and refresh the cached VM states.
    ///
    /// States reported for VMs that are not in the local cache are ignored.
    pub async fn get_state(&mut self) -> Result<ImResponse<InfrastructureState>> {
        let url = format!("{}/state", self.full_id);
        let response = self.client.request(Method::GET, &url).send().await?;

        let reported = ImResponse::<StateResponse>::from_json(response)
            .await?
            .map(|body| body.state);
        if let Some(state) = reported.data() {
            self.state = Some(state.state.clone());
            for (vm_id, vm_state) in &state.vm_states {
                match self.vms.iter_mut().find(|vm| vm.id() == vm_id.as_str()) {
                    Some(vm) => vm.set_state(vm_state.as_str()),
                    None => tracing::debug!(
                        "Ignoring state of VM {} not cached in infrastructure {}",
                        vm_id,
                        self.id
                    ),
                }
            }
        }
        Ok(reported)
    }

    /// Destroy the infrastructure.
    ///
    /// `async_delete` returns before the resources are released; `force`
    /// removes the infrastructure even if some resources fail to delete.
    pub async fn destroy(&self, async_delete: bool, force: bool) -> Result<ImResponse<String>> {
        let mut query = Vec::new();
        if async_delete {
            query.push(("async", "true"));
        }
        if force {
            query.push(("force", "true"));
        }
        let destroyed = self.destroy_with(&query).await?;
        if destroyed.is_ok() {
            tracing::info!("Destroyed infrastructure {}", self.id);
        }
        Ok(destroyed)
    }

    /// Add resources from a template.
    ///
    /// The new VMs are appended to the cached list; only those are returned.
    pub async fn add_resource(
        &mut self,
        template: impl Into<String>,
        template_type: TemplateType,
        context: bool,
    ) -> Result<ImResponse<Vec<VirtualMachine>>> {
        let query: &[(&str, &str)] = if context { &[] } else { &[("context", "false")] };
        let response = self
            .client
            .request_with_body(
                Method::POST,
                &self.full_id,
                template_type.content_type(),
                template.into(),
            )
            .query(query)
            .send()
            .await?;

        let added = ImResponse::<UriList>::from_json(response)
            .await?
            .map(|list| self.vms_from(list));
        if let Some(new_vms) = added.data() {
            tracing::info!(
                "Added {} VMs to infrastructure {}",
                new_vms.len(),
                self.id
            );
            self.vms.extend(new_vms.iter().cloned());
        }
        Ok(added)
    }

    /// Reconfigure the infrastructure.
    ///
    /// Only RADL and JSON bodies are accepted. An empty `vm_list`
    /// reconfigures every VM.
    pub async fn reconfigure(
        &self,
        template: impl Into<String>,
        template_type: TemplateType,
        vm_list: &[&str],
    ) -> Result<ImResponse<String>> {
        let content_type = template_type.reconfigure_content_type()?;
        let vm_list = vm_list.join(",");
        let mut request = self.client.request_with_body(
            Method::POST,
            &self.full_id,
            content_type,
            template.into(),
        );
        if !vm_list.is_empty() {
            request = request.query(&[("vm_list", vm_list.as_str())]);
        }

        let response = request.send().await?;
        ImResponse::from_text(response).await
    }

    /// Export the infrastructure data to import it in another IM service.
    ///
    /// With `delete` the infrastructure is removed from this IM service; its
    /// resources are left untouched.
    pub async fn export(&self, delete: bool) -> Result<ImResponse<Value>> {
        if delete {
            self.get_property("data", &[("delete", "true")]).await
        } else {
            self.get_property("data", &[]).await
        }
    }

    /// Get the outputs of an infrastructure created from a TOSCA template
    pub async fn get_outputs(&self) -> Result<ImResponse<Value>> {
        self.get_property("outputs", &[]).await
    }

    /// VM handles for a `uri-list`. Entries that are not VM URLs are skipped.
    fn vms_from(&self, list: UriList) -> Vec<VirtualMachine> {
        list.uri_list
            .into_iter()
            .filter_map(|entry| {
                VirtualMachine::from_url(&self.client, entry.uri)
                    .inspect_err(|e| {
                        tracing::warn!("Skipping VM of infrastructure {}: {}", self.id, e)
                    })
                    .ok()
            })
            .collect()
    }
}

#[async_trait]
impl CloudResource for Infrastructure {
    type Info = Vec<VirtualMachine>;

    fn client(&self) -> &ImClient {
        &self.client
    }

    fn full_id(&self) -> &str {
        &self.full_id
    }

    fn id(&self) -> &str {
        &self.id
    }

    /// Replace the cached VM list with the one reported by the service.
    fn extract_info(&mut self, info: Value) -> Result<Vec<VirtualMachine>> {
        let list: UriList = serde_json::from_value(info)?;
        self.vms = self.vms_from(list);
        Ok(self.vms.clone())
    }
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct StateResponse {
    state: InfrastructureState,
}
