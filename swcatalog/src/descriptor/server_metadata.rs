//! Server metadata (`.smd`) property lists.

use std::fs;
use std::path::Path;

use plist::Value;
use tracing::{debug, warn};

use super::DescriptorError;

/// Localizations tried in order.
const LOCALIZATIONS: &[&str] = &["English", "en"];

/// Display title and version of a product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerMetadata {
    pub title: String,
    pub version: String,
}

impl ServerMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.version.is_empty()
    }
}

/// Parse a server metadata file; unreadable or malformed files yield the
/// empty result.
pub fn parse_server_metadata(path: &Path) -> ServerMetadata {
    match try_parse_server_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!(error = %e, "Ignoring server metadata");
            ServerMetadata::default()
        }
    }
}

/// Parse a server metadata file, reporting failures.
pub fn try_parse_server_metadata(path: &Path) -> Result<ServerMetadata, DescriptorError> {
    let bytes = fs::read(path).map_err(|e| DescriptorError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let document: Value = plist::from_bytes(&bytes).map_err(|e| DescriptorError::Plist {
        path: path.to_path_buf(),
        source: e,
    })?;

    let Some(root) = document.as_dictionary() else {
        return Ok(ServerMetadata::default());
    };

    let version = root
        .get("CFBundleShortVersionString")
        .and_then(Value::as_string)
        .unwrap_or_default()
        .to_string();

    let title = root
        .get("localization")
        .and_then(Value::as_dictionary)
        .and_then(|localization| {
            LOCALIZATIONS
                .iter()
                .find_map(|name| localization.get(name).and_then(Value::as_dictionary))
        })
        .and_then(|preferred| preferred.get("title"))
        .and_then(Value::as_string)
        .unwrap_or_default()
        .to_string();

    debug!(%title, %version, "Parsed server metadata");
    Ok(ServerMetadata { title, version })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SMD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>CFBundleShortVersionString</key>
    <string>10.15.1</string>
    <key>localization</key>
    <dict>
        <key>English</key>
        <dict>
            <key>title</key>
            <string>macOS Catalina</string>
            <key>description</key>
            <data>PGh0bWw+PC9odG1sPg==</data>
        </dict>
    </dict>
</dict>
</plist>
"#;

    fn write(temp: &TempDir, content: &str) -> std::path::PathBuf {
        let path = temp.path().join("product.smd");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_english() {
        let temp = TempDir::new().unwrap();
        let metadata = parse_server_metadata(&write(&temp, SMD));
        assert_eq!(metadata.title, "macOS Catalina");
        assert_eq!(metadata.version, "10.15.1");
    }

    #[test]
    fn test_falls_back_to_en() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, &SMD.replace("<key>English</key>", "<key>en</key>"));
        assert_eq!(parse_server_metadata(&path).title, "macOS Catalina");
    }

    #[test]
    fn test_missing_localization_keeps_version() {
        let temp = TempDir::new().unwrap();
        let path = write(&temp, &SMD.replace("<key>English</key>", "<key>fr</key>"));
        let metadata = parse_server_metadata(&path);
        assert_eq!(metadata.title, "");
        assert_eq!(metadata.version, "10.15.1");
    }

    #[test]
    fn test_missing_and_malformed_degrade_to_empty() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.smd");
        assert!(parse_server_metadata(&missing).is_empty());
        assert!(matches!(
            try_parse_server_metadata(&missing),
            Err(DescriptorError::Read { .. })
        ));

        let malformed = write(&temp, "<plist><dict>");
        assert!(parse_server_metadata(&malformed).is_empty());
        assert!(matches!(
            try_parse_server_metadata(&malformed),
            Err(DescriptorError::Plist { .. })
        ));
    }
}
