//! URL to local path mapping and mirror URL rewriting.

use std::path::{Component, Path, PathBuf};

use reqwest::Url;

use super::error::ReplicationError;

/// Extensions of large binary assets that a caching mirror serves.
const MIRRORED_EXTENSIONS: &[&str] = &["pkg", "dmg"];

/// Parse an asset URL.
pub fn parse_url(url: &str) -> Result<Url, ReplicationError> {
    Url::parse(url).map_err(|e| ReplicationError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Local path for `url` under `root`: the URL path, normalized.
///
/// Empty, `.` and `..` segments are resolved lexically and can never climb
/// above `root`.
pub fn local_path(url: &Url, root: &Path) -> PathBuf {
    let mut relative = PathBuf::new();
    for component in Path::new(url.path()).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::ParentDir => {
                relative.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    root.join(relative)
}

/// Last path segment of `url`, used in status text.
pub fn file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| url.host_str().unwrap_or_default())
        .to_string()
}

/// Whether `url` points at a package or disk image.
pub fn is_mirrored_asset(url: &Url) -> bool {
    Path::new(url.path())
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            MIRRORED_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
        .unwrap_or(false)
}

/// Rewrite `url` to fetch through `mirror`.
///
/// `mirror` is a `host:port`, optionally prefixed with a scheme; without one
/// the scheme of `url` is used. The origin of `url` is passed in the
/// `source` query parameter so the mirror can fetch through:
/// `<scheme>://<mirror><path>?source=<scheme>://<host>`.
pub fn mirror_url(url: &Url, mirror: &str) -> Result<Url, ReplicationError> {
    let (scheme, hostport) = match mirror.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => (url.scheme(), mirror),
    };
    let hostport = hostport.trim_end_matches('/');

    let origin_host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };

    let rewritten = format!(
        "{}://{}{}?source={}://{}",
        scheme,
        hostport,
        url.path(),
        url.scheme(),
        origin_host
    );
    parse_url(&rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_local_path_mirrors_url_path() {
        let path = local_path(
            &url("http://swcdn.apple.com/a/b/file.pkg"),
            Path::new("/tmp/work"),
        );
        assert_eq!(path, PathBuf::from("/tmp/work/a/b/file.pkg"));
    }

    #[test]
    fn test_local_path_never_escapes_root() {
        let path = local_path(&url("http://h/a/../../../etc/passwd"), Path::new("/root"));
        assert_eq!(path, PathBuf::from("/root/etc/passwd"));

        let path = local_path(&url("http://h//a//./b.pkg"), Path::new("/root"));
        assert_eq!(path, PathBuf::from("/root/a/b.pkg"));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(&url("http://h/a/InstallESD.dmg")), "InstallESD.dmg");
        assert_eq!(file_name(&url("http://h/")), "h");
    }

    #[test]
    fn test_is_mirrored_asset() {
        assert!(is_mirrored_asset(&url("http://h/a/Install.pkg")));
        assert!(is_mirrored_asset(&url("http://h/a/BaseSystem.DMG")));
        assert!(!is_mirrored_asset(&url("http://h/a/Install.pkm")));
        assert!(!is_mirrored_asset(&url("http://h/a/index.sucatalog")));
        assert!(!is_mirrored_asset(&url("http://h/pkg")));
    }

    #[test]
    fn test_mirror_url_rewrite() {
        let original = url("http://swcdn.apple.com/content/downloads/x/InstallAssistant.pkg");

        let rewritten = mirror_url(&original, "10.0.1.10:49232").unwrap();
        assert_eq!(
            rewritten.as_str(),
            "http://10.0.1.10:49232/content/downloads/x/InstallAssistant.pkg\
             ?source=http://swcdn.apple.com"
        );

        let with_scheme = mirror_url(&original, "https://cache.local:8443/").unwrap();
        assert_eq!(with_scheme.scheme(), "https");
        assert_eq!(with_scheme.host_str(), Some("cache.local"));
        assert_eq!(with_scheme.port(), Some(8443));
        assert_eq!(with_scheme.path(), original.path());
    }

    #[test]
    fn test_mirror_url_keeps_origin_port() {
        let original = url("http://origin.test:8080/a/b.dmg");
        let rewritten = mirror_url(&original, "m:1").unwrap();
        assert_eq!(rewritten.query(), Some("source=http://origin.test:8080"));
    }
}
