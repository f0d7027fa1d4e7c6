use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod buffer2;
pub mod file_format;
pub mod float_ext;
pub mod log_setup;
pub mod test_utils;

pub use file_format::{FileExtensionError, SerdeFormat};

#[derive(Debug, thiserror::Error)]
pub enum SerdeFormatError {
    #[error("YAML serialization failed")]
    Yaml(#[from] serde_yml::Error),
    #[error("JSON serialization failed")]
    Json(#[from] serde_json::Error),
}

pub type SerdeFormatResult<T> = Result<T, SerdeFormatError>;

pub fn serialize<T: Serialize>(value: &T, format: SerdeFormat) -> SerdeFormatResult<String> {
    match format {
        SerdeFormat::Yaml => Ok(serde_yml::to_string(value)?),
        SerdeFormat::Json => Ok(serde_json::to_string_pretty(value)?),
    }
}

pub fn deserialize<T: DeserializeOwned>(
    serialized: &str,
    format: SerdeFormat,
) -> SerdeFormatResult<T> {
    match format {
        SerdeFormat::Yaml => Ok(serde_yml::from_str(serialized)?),
        SerdeFormat::Json => Ok(serde_json::from_str(serialized)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        depth: u32,
    }

    #[test]
    fn test_roundtrip_all_formats() {
        let value = Sample {
            name: "tile".into(),
            depth: 5,
        };
        for format in [SerdeFormat::Yaml, SerdeFormat::Json] {
            let text = serialize(&value, format).unwrap();
            let back: Sample = deserialize(&text, format).unwrap();
            assert_eq!(back, value, "format {:?}", format);
        }
    }

    #[test]
    fn test_deserialize_reports_format_error() {
        let err = deserialize::<Sample>("{ not json", SerdeFormat::Json).unwrap_err();
        assert!(matches!(err, SerdeFormatError::Json(_)));
    }
}
