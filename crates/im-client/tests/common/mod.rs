use im_client::{AuthData, AuthDataItem, ImClient};
use serde_json::json;
use wiremock::MockServer;

pub const AUTH_HEADER: &str =
    "id = im; type = InfrastructureManager; username = user; password = pass; \\nid = dummy; type = Dummy; ";

#[allow(dead_code)]
pub const RADL: &str = "network publica (outbound = 'yes')
system node (
cpu.count>=1 and
memory.size>=512m and
net_interface.0.connection = 'publica' and
net_interface.0.dns_name = 'testnode' and
disk.0.os.name='linux' and
disk.0.os.flavour='ubuntu' and
disk.0.image.url = 'dummy://dummy.com' and
disk.0.os.credentials.username = 'dummy'
)
deploy node 1";

pub fn auth_data() -> AuthData {
    AuthData::new(vec![
        AuthDataItem::new("im", "InfrastructureManager")
            .with_field("username", "user")
            .with_field("password", "pass"),
        AuthDataItem::new("dummy", "Dummy"),
    ])
    .unwrap()
}

pub fn client(server: &MockServer) -> ImClient {
    ImClient::new(server.uri(), auth_data())
}

#[allow(dead_code)]
pub fn inf_url(server: &MockServer, inf_id: &str) -> String {
    format!("{}/infrastructures/{}", server.uri(), inf_id)
}

#[allow(dead_code)]
pub fn vm_url(server: &MockServer, inf_id: &str, vm_id: &str) -> String {
    format!("{}/vms/{}", inf_url(server, inf_id), vm_id)
}

/// `{"uri-list": [...]}` body for the given URLs
#[allow(dead_code)]
pub fn uri_list(uris: &[String]) -> serde_json::Value {
    let entries: Vec<_> = uris.iter().map(|uri| json!({ "uri": uri })).collect();
    json!({ "uri-list": entries })
}

#[allow(dead_code)]
pub fn error_body(message: &str) -> serde_json::Value {
    json!({ "message": message, "code": 400 })
}

/// The only request received by the server
#[allow(dead_code)]
pub async fn single_request(server: &MockServer) -> wiremock::Request {
    let mut requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1, "expected exactly one request");
    requests.remove(0)
}

#[allow(dead_code)]
pub fn header_value<'a>(request: &'a wiremock::Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|v| v.to_str().ok())
}
