use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum FileExtensionError {
    #[error("Failed to get file extension")]
    MissingFileExtension,
    #[error("Unsupported file extension for file: {0}")]
    UnsupportedFileExtension(String),
}

pub type FileFormatResult<T> = Result<T, FileExtensionError>;

pub fn get_file_extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|os_str| os_str.to_str())
}

/// Text formats accepted for configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerdeFormat {
    Yaml,
    Json,
}

impl SerdeFormat {
    pub fn from_path(path: &Path) -> FileFormatResult<Self> {
        let ext = get_file_extension(path).ok_or(FileExtensionError::MissingFileExtension)?;

        if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") {
            Ok(Self::Yaml)
        } else if ext.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else {
            Err(FileExtensionError::UnsupportedFileExtension(
                path.display().to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_yaml_and_json() {
        assert_eq!(
            SerdeFormat::from_path(Path::new("render.yaml")).unwrap(),
            SerdeFormat::Yaml
        );
        assert_eq!(
            SerdeFormat::from_path(Path::new("render.YML")).unwrap(),
            SerdeFormat::Yaml
        );
        assert_eq!(
            SerdeFormat::from_path(Path::new("dir/render.json")).unwrap(),
            SerdeFormat::Json
        );
    }

    #[test]
    fn test_rejects_unknown_or_missing_extension() {
        assert!(matches!(
            SerdeFormat::from_path(Path::new("render")),
            Err(FileExtensionError::MissingFileExtension)
        ));
        assert!(matches!(
            SerdeFormat::from_path(Path::new("render.toml")),
            Err(FileExtensionError::UnsupportedFileExtension(_))
        ));
    }
}
