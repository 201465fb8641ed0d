//! Template formats accepted by the IM service

use crate::error::{ImError, Result};
use std::fmt;
use std::str::FromStr;

const ACCEPTED: &str = "radl, json, tosca or yaml";
const ACCEPTED_FOR_RECONFIGURE: &str = "radl, json";

/// Format of a template body sent to the IM service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemplateType {
    /// Resource Application Description Language
    #[default]
    Radl,
    Tosca,
    Yaml,
    Json,
}

impl TemplateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateType::Radl => "radl",
            TemplateType::Tosca => "tosca",
            TemplateType::Yaml => "yaml",
            TemplateType::Json => "json",
        }
    }

    /// `Content-Type` header value for a body of this format
    pub fn content_type(&self) -> &'static str {
        match self {
            TemplateType::Radl => "text/plain",
            TemplateType::Tosca | TemplateType::Yaml => "text/yaml",
            TemplateType::Json => "application/json",
        }
    }

    /// Content type for a reconfigure body, which only takes RADL or JSON.
    pub(crate) fn reconfigure_content_type(&self) -> Result<&'static str> {
        match self {
            TemplateType::Radl | TemplateType::Json => Ok(self.content_type()),
            TemplateType::Tosca | TemplateType::Yaml => Err(ImError::InvalidTemplateType {
                value: self.as_str().to_string(),
                accepted: ACCEPTED_FOR_RECONFIGURE,
            }),
        }
    }
}

impl FromStr for TemplateType {
    type Err = ImError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "radl" => Ok(TemplateType::Radl),
            "tosca" => Ok(TemplateType::Tosca),
            "yaml" => Ok(TemplateType::Yaml),
            "json" => Ok(TemplateType::Json),
            _ => Err(ImError::InvalidTemplateType {
                value: s.to_string(),
                accepted: ACCEPTED,
            }),
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types() {
        assert_eq!(TemplateType::Radl.content_type(), "text/plain");
        assert_eq!(TemplateType::Tosca.content_type(), "text/yaml");
        assert_eq!(TemplateType::Yaml.content_type(), "text/yaml");
        assert_eq!(TemplateType::Json.content_type(), "application/json");
    }

    #[test]
    fn test_parse() {
        assert_eq!("radl".parse::<TemplateType>().unwrap(), TemplateType::Radl);
        assert_eq!("tosca".parse::<TemplateType>().unwrap(), TemplateType::Tosca);
        assert_eq!("json".parse::<TemplateType>().unwrap(), TemplateType::Json);
        assert_eq!(TemplateType::default(), TemplateType::Radl);
    }

    #[test]
    fn test_parse_invalid() {
        let err = "invalid".parse::<TemplateType>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid template type 'invalid'. Only radl, json, tosca or yaml are accepted."
        );
        // matching is case sensitive
        assert!("RADL".parse::<TemplateType>().is_err());
    }

    #[test]
    fn test_reconfigure_rejects_yaml_formats() {
        assert_eq!(
            TemplateType::Json.reconfigure_content_type().unwrap(),
            "application/json"
        );
        assert!(matches!(
            TemplateType::Tosca.reconfigure_content_type(),
            Err(ImError::InvalidTemplateType { .. })
        ));
        assert!(TemplateType::Yaml.reconfigure_content_type().is_err());
    }
}
