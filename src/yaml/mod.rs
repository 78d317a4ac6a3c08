//! YAML record parsing with source-located diagnostics

pub mod diagnostics;

use serde::de::DeserializeOwned;
use std::path::Path;

pub use diagnostics::{YamlError, YamlSyntaxError};

/// Parse a YAML string, attaching `filename` to any syntax error
pub fn parse_yaml_str<T: DeserializeOwned + 'static>(content: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(content)
        .map_err(|e| YamlError::Syntax(YamlSyntaxError::from_serde_error(&e, content, filename)))
}

/// Read and parse a YAML record file
pub fn parse_yaml_file<T: DeserializeOwned + 'static>(path: &Path) -> Result<T, YamlError> {
    let content = std::fs::read_to_string(path)?;
    parse_yaml_str(&content, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct Sample {
        name: String,
        quantity: u32,
    }

    #[test]
    fn test_parse_valid_yaml() {
        let sample: Sample = parse_yaml_str("name: bolt\nquantity: 4\n", "sample.yaml").unwrap();
        assert_eq!(sample.name, "bolt");
        assert_eq!(sample.quantity, 4);
    }

    #[test]
    fn test_parse_type_error_is_syntax_error() {
        let err = parse_yaml_str::<Sample>("name: bolt\nquantity: many\n", "sample.yaml").unwrap_err();
        assert!(matches!(err, YamlError::Syntax(_)));
    }

    #[test]
    fn test_parse_missing_file_is_io_error() {
        let err = parse_yaml_file::<Sample>(Path::new("/nonexistent/sample.yaml")).unwrap_err();
        assert!(matches!(err, YamlError::Io(_)));
    }
}
