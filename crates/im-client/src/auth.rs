//! Authentication data sent to the IM service
//!
//! Every request carries the whole credential block in the `Authorization`
//! header. The block is a list of items, one per cloud provider or service,
//! each rendered as `id = ...; type = ...; key = value; ...`.
//!
//! See <https://imdocs.readthedocs.io/en/latest/client.html#auth-file> for the
//! accepted item types and fields.

use crate::error::{ImError, Result};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Separator placed between items in the header value.
///
/// A header value cannot hold a raw line break, so the service expects the
/// escaped form.
const AUTH_LINE_SEPARATOR: &str = "\\n";

/// A single auth entry (one line of an auth file)
#[derive(Clone, PartialEq, Eq)]
pub struct AuthDataItem {
    id: String,
    auth_type: String,
    fields: Vec<(String, String)>,
}

impl AuthDataItem {
    pub fn new(id: impl Into<String>, auth_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            auth_type: auth_type.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field; fields are rendered in insertion order.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn auth_type(&self) -> &str {
        &self.auth_type
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Get a field value by key
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Format this item as an IM auth line.
    pub fn to_auth_line(&self) -> String {
        let mut line = format!("id = {}; type = {}; ", self.id, self.auth_type);
        for (key, value) in &self.fields {
            line.push_str(&format!("{} = {}; ", key, value));
        }
        line
    }
}

impl fmt::Debug for AuthDataItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.fields.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("AuthDataItem")
            .field("id", &self.id)
            .field("auth_type", &self.auth_type)
            .field("fields", &keys)
            .finish()
    }
}

/// Ordered list of auth items with unique IDs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthData {
    items: Vec<AuthDataItem>,
}

impl AuthData {
    /// Build the auth data, rejecting duplicated item IDs.
    pub fn new(items: Vec<AuthDataItem>) -> Result<Self> {
        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item.id.as_str()) {
                return Err(ImError::DuplicateAuthId(item.id.clone()));
            }
        }
        Ok(Self { items })
    }

    /// Parse the content of an IM auth file.
    ///
    /// One item per line, `key = value` pairs separated by `;`. Blank lines
    /// and lines starting with `#` are skipped. `id` and `type` are required.
    pub fn parse(content: &str) -> Result<Self> {
        let mut items = Vec::new();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            items.push(parse_auth_line(index + 1, line)?);
        }

        Self::new(items)
    }

    /// Read and parse an auth file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let auth = Self::parse(&content)?;
        tracing::debug!(
            "Loaded {} auth items from {}",
            auth.items.len(),
            path.display()
        );
        Ok(auth)
    }

    pub fn items(&self) -> &[AuthDataItem] {
        &self.items
    }

    /// Find an item by its ID
    pub fn get(&self, id: &str) -> Option<&AuthDataItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Format the whole block as the `Authorization` header value.
    pub fn format_auth_data(&self) -> String {
        self.items
            .iter()
            .map(AuthDataItem::to_auth_line)
            .collect::<Vec<_>>()
            .join(AUTH_LINE_SEPARATOR)
    }
}

fn parse_auth_line(line_no: usize, line: &str) -> Result<AuthDataItem> {
    let mut id = None;
    let mut auth_type = None;
    let mut fields = Vec::new();

    for part in line.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| ImError::InvalidAuthLine {
                line: line_no,
                reason: format!("expected 'key = value', found '{}'", part),
            })?;
        let key = key.trim();
        let value = value.trim().to_string();
        match key {
            "id" => id = Some(value),
            "type" => auth_type = Some(value),
            _ => fields.push((key.to_string(), value)),
        }
    }

    let id = id.ok_or_else(|| ImError::InvalidAuthLine {
        line: line_no,
        reason: "missing 'id'".to_string(),
    })?;
    let auth_type = auth_type.ok_or_else(|| ImError::InvalidAuthLine {
        line: line_no,
        reason: "missing 'type'".to_string(),
    })?;

    Ok(AuthDataItem {
        id,
        auth_type,
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_items() -> Vec<AuthDataItem> {
        vec![
            AuthDataItem::new("im", "InfrastructureManager")
                .with_field("username", "user")
                .with_field("password", "pass"),
            AuthDataItem::new("dummy", "Dummy"),
        ]
    }

    #[test]
    fn test_format_auth_data() {
        let auth = AuthData::new(sample_items()).unwrap();
        assert_eq!(
            auth.format_auth_data(),
            "id = im; type = InfrastructureManager; username = user; password = pass; \\nid = dummy; type = Dummy; "
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let items = vec![
            AuthDataItem::new("im", "InfrastructureManager"),
            AuthDataItem::new("one", "OpenNebula"),
            AuthDataItem::new("im", "Dummy"),
        ];
        match AuthData::new(items) {
            Err(ImError::DuplicateAuthId(id)) => assert_eq!(id, "im"),
            other => panic!("Expected DuplicateAuthId, got {:?}", other),
        }
    }

    #[test]
    fn test_order_preserved() {
        let auth = AuthData::new(sample_items()).unwrap();
        let ids: Vec<&str> = auth.items().iter().map(|i| i.id()).collect();
        assert_eq!(ids, vec!["im", "dummy"]);
    }

    #[test]
    fn test_empty_auth_data() {
        let auth = AuthData::new(Vec::new()).unwrap();
        assert_eq!(auth.format_auth_data(), "");
    }

    #[test]
    fn test_parse_auth_file() {
        let content = "# IM credentials\n\
            id = im; type = InfrastructureManager; username = user; password = pass\n\
            \n\
            id = dummy; type = Dummy;\n";
        let auth = AuthData::parse(content).unwrap();
        assert_eq!(auth, AuthData::new(sample_items()).unwrap());
        assert_eq!(auth.get("im").unwrap().field("password"), Some("pass"));
    }

    #[test]
    fn test_parse_missing_type() {
        let result = AuthData::parse("id = im; username = user");
        assert!(matches!(
            result,
            Err(ImError::InvalidAuthLine { line: 1, .. })
        ));
    }

    #[test]
    fn test_parse_malformed_pair() {
        let result = AuthData::parse("id = im; type = Dummy\nid = x; type = Dummy; garbage");
        assert!(matches!(
            result,
            Err(ImError::InvalidAuthLine { line: 2, .. })
        ));
    }

    #[test]
    fn test_parse_duplicate_ids() {
        let result = AuthData::parse("id = a; type = Dummy\nid = a; type = Dummy");
        assert!(matches!(result, Err(ImError::DuplicateAuthId(_))));
    }

    #[test]
    fn test_debug_hides_values() {
        let item = AuthDataItem::new("im", "InfrastructureManager").with_field("password", "secret");
        let debug = format!("{:?}", item);
        assert!(debug.contains("password"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.dat");
        std::fs::write(&path, "id = im; type = InfrastructureManager; token = abc\n").unwrap();

        let auth = AuthData::from_file(&path).unwrap();
        assert_eq!(
            auth.format_auth_data(),
            "id = im; type = InfrastructureManager; token = abc; "
        );
    }
}
