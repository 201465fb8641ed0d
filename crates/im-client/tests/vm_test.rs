mod common;

use common::*;
use im_client::{CloudResource, TemplateType};
use serde_json::json;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INF_ID: &str = "inf-1";
const VM_ID: &str = "0";

fn vm_path() -> String {
    format!("/infrastructures/{}/vms/{}", INF_ID, VM_ID)
}

#[tokio::test]
async fn test_vm_from_listing_matches_direct_handle() {
    let server = MockServer::start().await;
    let im = client(&server);

    let listed = im
        .virtual_machine_from_url(&vm_url(&server, INF_ID, VM_ID))
        .unwrap();
    let direct = im.virtual_machine(INF_ID, VM_ID);

    assert_eq!(listed.id(), direct.id());
    assert_eq!(listed.infrastructure_id(), direct.infrastructure_id());
    assert_eq!(listed.full_id(), direct.full_id());
}

#[tokio::test]
async fn test_get_info_caches_radl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(vm_path()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"radl": "system node (cpu.count = 1)"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut vm = client(&server).virtual_machine(INF_ID, VM_ID);
    let response = vm.get_info().await.unwrap();
    assert_eq!(
        response.into_data().as_deref(),
        Some("system node (cpu.count = 1)")
    );
    assert_eq!(vm.radl(), Some("system node (cpu.count = 1)"));

    let request = single_request(&server).await;
    assert_eq!(header_value(&request, "authorization"), Some(AUTH_HEADER));
}

#[tokio::test]
async fn test_get_info_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(vm_path()))
        .respond_with(ResponseTemplate::new(404).set_body_json(error_body("Invalid VM ID")))
        .mount(&server)
        .await;

    let mut vm = client(&server).virtual_machine(INF_ID, VM_ID);
    let response = vm.get_info().await.unwrap();
    assert_eq!(response.message(), Some("Invalid VM ID"));
    assert!(vm.radl().is_none());
}

#[tokio::test]
async fn test_destroy_with_context() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(vm_path()))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .expect(1)
        .mount(&server)
        .await;

    let vm = client(&server).virtual_machine(INF_ID, VM_ID);
    assert!(vm.destroy(true).await.unwrap().is_ok());

    let request = single_request(&server).await;
    assert_eq!(request.url.query(), None);
}

#[tokio::test]
async fn test_destroy_without_context() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(vm_path()))
        .and(query_param("context", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .expect(1)
        .mount(&server)
        .await;

    let vm = client(&server).virtual_machine(INF_ID, VM_ID);
    assert!(vm.destroy(false).await.unwrap().is_ok());
}

#[tokio::test]
async fn test_reboot() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/reboot", vm_path())))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .expect(1)
        .mount(&server)
        .await;

    let vm = client(&server).virtual_machine(INF_ID, VM_ID);
    assert!(vm.reboot().await.unwrap().is_ok());
}

#[tokio::test]
async fn test_reboot_failure() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/reboot", vm_path())))
        .respond_with(ResponseTemplate::new(409).set_body_json(error_body("VM is stopped")))
        .mount(&server)
        .await;

    let vm = client(&server).virtual_machine(INF_ID, VM_ID);
    let response = vm.reboot().await.unwrap();
    assert_eq!(response.message(), Some("VM is stopped"));
}

#[tokio::test]
async fn test_create_disk_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/disks/0/snapshot", vm_path())))
        .and(query_param("image_name", "backup-img"))
        .and(query_param("auto_delete", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_string("one://server/42"))
        .expect(1)
        .mount(&server)
        .await;

    let vm = client(&server).virtual_machine(INF_ID, VM_ID);
    let response = vm.create_disk_snapshot(0, "backup-img", true).await.unwrap();
    assert_eq!(response.into_data().as_deref(), Some("one://server/42"));
}

#[tokio::test]
async fn test_create_disk_snapshot_keeps_image() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/disks/1/snapshot", vm_path())))
        .respond_with(ResponseTemplate::new(200).set_body_string("one://server/43"))
        .expect(1)
        .mount(&server)
        .await;

    let vm = client(&server).virtual_machine(INF_ID, VM_ID);
    vm.create_disk_snapshot(1, "img", false).await.unwrap();

    let request = single_request(&server).await;
    assert_eq!(request.url.query(), Some("image_name=img"));
}

#[tokio::test]
async fn test_alter_updates_radl() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(vm_path()))
        .and(header("Content-Type", "text/plain"))
        .and(body_string("system node (memory.size >= 2g)"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"radl": "system node (memory.size = 2048m)"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut vm = client(&server).virtual_machine(INF_ID, VM_ID);
    let response = vm
        .alter("system node (memory.size >= 2g)", TemplateType::Radl)
        .await
        .unwrap();
    assert_eq!(
        response.into_data().as_deref(),
        Some("system node (memory.size = 2048m)")
    );
    assert_eq!(vm.radl(), Some("system node (memory.size = 2048m)"));
}

#[tokio::test]
async fn test_alter_yaml_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(vm_path()))
        .and(header("Content-Type", "text/yaml"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"radl": "system node"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut vm = client(&server).virtual_machine(INF_ID, VM_ID);
    assert!(vm.alter("node: {}", TemplateType::Yaml).await.unwrap().is_ok());
}

#[tokio::test]
async fn test_alter_failure_keeps_radl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(vm_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"radl": "system node"})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(vm_path()))
        .respond_with(ResponseTemplate::new(400).set_body_json(error_body("Error altering VM")))
        .mount(&server)
        .await;

    let mut vm = client(&server).virtual_machine(INF_ID, VM_ID);
    vm.get_info().await.unwrap();

    let response = vm.alter("system node", TemplateType::Json).await.unwrap();
    assert_eq!(response.message(), Some("Error altering VM"));
    assert_eq!(vm.radl(), Some("system node"));
}

#[tokio::test]
async fn test_vm_cont_msg() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/contmsg", vm_path())))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"contmsg": "VM ready"})))
        .mount(&server)
        .await;

    let vm = client(&server).virtual_machine(INF_ID, VM_ID);
    let response = vm.get_cont_msg().await.unwrap();
    assert_eq!(response.into_data(), Some(json!("VM ready")));
}
