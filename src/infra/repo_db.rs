//! Published repository database
//!
//! A pacman repository database (`<name>.db.tar.gz`) holds one `desc` file
//! per package with `%NAME%` and `%VERSION%` entries. This module reads it
//! into a [`PublishedState`], and downloads it when asked.

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::core::reconcile::PublishedState;
use crate::error::RepoDbError;
use crate::infra::download::DownloadManager;

/// Parse a repository database file
pub fn parse_db(path: &Path) -> Result<PublishedState, RepoDbError> {
    let read_err = |e: std::io::Error| RepoDbError::Read {
        path: path.to_path_buf(),
        error: e.to_string(),
    };

    let file = File::open(path).map_err(read_err)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let mut packages = Vec::new();

    for entry in archive.entries().map_err(read_err)? {
        let mut entry = entry.map_err(read_err)?;
        let is_desc = entry
            .path()
            .map_err(read_err)?
            .to_str()
            .is_some_and(|p| p.ends_with("/desc"));
        if !is_desc {
            continue;
        }

        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).map_err(read_err)?;
        if let Some(pair) = parse_desc(&String::from_utf8_lossy(&bytes)) {
            packages.push(pair);
        }
    }

    tracing::info!("Repository database lists {} packages", packages.len());
    Ok(packages.into_iter().collect())
}

/// Extract `(name, version)` from a `desc` file
pub fn parse_desc(content: &str) -> Option<(String, String)> {
    let mut name = None;
    let mut version = None;
    let mut lines = content.lines().map(str::trim);

    while let Some(line) = lines.next() {
        match line {
            "%NAME%" => name = lines.next().map(str::to_string),
            "%VERSION%" => version = lines.next().map(str::to_string),
            _ => {}
        }
    }

    match (name, version) {
        (Some(n), Some(v)) if !n.is_empty() && !v.is_empty() => Some((n, v)),
        _ => None,
    }
}

/// Download and parse the published state
///
/// Never fails: when there is no URL, the download fails or the database
/// cannot be parsed, the empty state is returned. That forces a full
/// rebuild, which is safe but hides any incremental build opportunity.
pub async fn fetch_published(
    manager: &DownloadManager,
    url: Option<&str>,
    dest: &Path,
) -> PublishedState {
    let Some(url) = url else {
        tracing::warn!(
            "No repository location known; assuming nothing is published (full rebuild)"
        );
        return PublishedState::default();
    };

    tracing::info!("Downloading repository database from {url}");
    if let Err(e) = manager.download(url, dest).await {
        tracing::warn!(
            "Could not download repository database ({e}); assuming nothing is published (full rebuild)"
        );
        return PublishedState::default();
    }

    parse_db(dest).unwrap_or_else(|e| {
        tracing::warn!("{e}; assuming nothing is published (full rebuild)");
        PublishedState::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn db_bytes(packages: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (name, version) in packages {
            let desc = format!("%NAME%\n{name}\n\n%VERSION%\n{version}\n");
            let mut header = tar::Header::new_gnu();
            header.set_size(desc.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, format!("{name}-{version}/desc"), desc.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn manager() -> DownloadManager {
        DownloadManager::with_config(2, 1, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_fetch_published_downloads_and_parses() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/myrepo.db.tar.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(db_bytes(&[("zlib", "1.3-1")])))
            .mount(&mock_server)
            .await;

        let temp = TempDir::new().unwrap();
        let url = format!("{}/myrepo.db.tar.gz", mock_server.uri());
        let state = fetch_published(&manager(), Some(&url), &temp.path().join("db")).await;

        assert_eq!(state.get("zlib"), Some("1.3-1"));
    }

    #[tokio::test]
    async fn test_fetch_published_missing_db_is_empty() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let temp = TempDir::new().unwrap();
        let url = format!("{}/myrepo.db.tar.gz", mock_server.uri());
        let state = fetch_published(&manager(), Some(&url), &temp.path().join("db")).await;

        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_published_without_url_is_empty() {
        let temp = TempDir::new().unwrap();
        let state = fetch_published(&manager(), None, &temp.path().join("db")).await;
        assert!(state.is_empty());
    }

    #[test]
    fn test_parse_desc() {
        let desc = "%FILENAME%\nfoo-1.0-1-x86_64.pkg.tar.zst\n\n%NAME%\nfoo\n\n%VERSION%\n1.0-1\n\n%DESC%\nA package\n";
        assert_eq!(
            parse_desc(desc),
            Some(("foo".to_string(), "1.0-1".to_string()))
        );
    }

    #[test]
    fn test_parse_desc_missing_version() {
        assert_eq!(parse_desc("%NAME%\nfoo\n"), None);
    }
}
