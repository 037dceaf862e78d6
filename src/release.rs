//! Fetching upstream releases from GitHub
//!
//! Release metadata comes from the REST API, the source archive from the
//! release assets (or the tag's archive URL). Every request is retried with
//! exponential backoff before the run gives up.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::config::UpstreamConfig;
use crate::error::{Result, SyncError};
use crate::schema::ReleaseInfo;

const USER_AGENT: &str = concat!("meshcore-enum-sync/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    assets: Vec<GitHubAsset>,
}

#[derive(Debug, Deserialize)]
struct GitHubAsset {
    name: String,
    browser_download_url: String,
}

/// A release unpacked on disk
#[derive(Debug, Clone)]
pub struct DownloadedRelease {
    pub info: ReleaseInfo,
    /// Top-level directory of the extracted archive
    pub source_dir: PathBuf,
    /// Version inferred from the directory name or the tag
    pub version: String,
}

/// Run `op` up to `attempts` times, sleeping `base * 2^attempt` in between
pub async fn with_retries<T, F, Fut>(attempts: u32, base: Duration, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt + 1 >= attempts => {
                return Err(SyncError::Release {
                    message: format!("{} failed after {} attempts: {}", what, attempts, e),
                });
            }
            Err(e) => {
                let delay = base * 2u32.pow(attempt);
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {:?}",
                    what,
                    attempt + 1,
                    attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Client for the upstream repository's releases
pub struct ReleaseClient {
    client: reqwest::Client,
    config: UpstreamConfig,
    backoff: Duration,
}

impl ReleaseClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
            backoff: Duration::from_secs(1),
        })
    }

    /// Resolve the latest published release
    pub async fn latest_release(&self) -> Result<ReleaseInfo> {
        let url = format!(
            "{}/{}/releases/latest",
            self.config.api_base.trim_end_matches('/'),
            self.config.repo
        );
        tracing::debug!("Fetching release metadata from {}", url);

        let client = &self.client;
        let url = url.as_str();
        let release: GitHubRelease = with_retries(
            self.config.max_retries,
            self.backoff,
            "Fetching release metadata",
            move || async move {
                let response = client
                    .get(url)
                    .header("Accept", "application/vnd.github.v3+json")
                    .send()
                    .await?
                    .error_for_status()?;
                Ok::<_, SyncError>(response.json::<GitHubRelease>().await?)
            },
        )
        .await?;

        Ok(release_info(release, &self.config.repo))
    }

    /// Release info for a pinned tag, without asking the API
    pub fn pinned_release(&self, tag: &str) -> ReleaseInfo {
        ReleaseInfo {
            tag: tag.to_string(),
            name: format!("Release {}", tag),
            download_url: tag_archive_url(&self.config.repo, tag),
            published_at: "unknown".to_string(),
        }
    }

    /// Download and unpack a release (`None` = latest) below `work_dir`
    pub async fn download(&self, tag: Option<&str>, work_dir: &Path) -> Result<DownloadedRelease> {
        let info = match tag {
            Some(tag) => self.pinned_release(tag),
            None => self.latest_release().await?,
        };
        tracing::info!("Downloading {} from {}", info.tag, info.download_url);

        let client = &self.client;
        let download_url = info.download_url.as_str();
        let bytes = with_retries(
            self.config.max_retries,
            self.backoff,
            "Downloading release archive",
            move || async move {
                let response = client.get(download_url).send().await?.error_for_status()?;
                Ok::<_, SyncError>(response.bytes().await?)
            },
        )
        .await?;

        let archive = work_dir.join(format!("{}.zip", sanitize_file_name(&info.tag)));
        fs::write(&archive, &bytes)?;

        let source_dir = extract_archive(&archive, &work_dir.join("source"))?;
        let dir_name = source_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let version = version_from_dir(&dir_name, &info.tag);
        tracing::info!("Extracted {} (version {})", source_dir.display(), version);

        Ok(DownloadedRelease {
            info,
            source_dir,
            version,
        })
    }
}

fn release_info(release: GitHubRelease, repo: &str) -> ReleaseInfo {
    let download_url = select_download_url(&release.assets, repo, &release.tag_name);
    ReleaseInfo {
        name: release.name.unwrap_or_else(|| release.tag_name.clone()),
        published_at: release.published_at.unwrap_or_else(|| "unknown".to_string()),
        tag: release.tag_name,
        download_url,
    }
}

/// First `.zip` asset with "source" in its name, else the tag archive
fn select_download_url(assets: &[GitHubAsset], repo: &str, tag: &str) -> String {
    assets
        .iter()
        .find(|a| a.name.ends_with(".zip") && a.name.to_lowercase().contains("source"))
        .map(|a| a.browser_download_url.clone())
        .unwrap_or_else(|| tag_archive_url(repo, tag))
}

fn tag_archive_url(repo: &str, tag: &str) -> String {
    format!("https://github.com/{}/archive/{}.zip", repo, tag)
}

fn sanitize_file_name(tag: &str) -> String {
    tag.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Unpack a zip archive and return its first top-level directory
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<PathBuf> {
    let file = fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)?;
    fs::create_dir_all(dest)?;
    zip.extract(dest)?;

    let mut dirs: Vec<PathBuf> = fs::read_dir(dest)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    dirs.into_iter().next().ok_or_else(|| SyncError::Archive {
        message: format!("no source directory in {}", archive.display()),
    })
}

/// Version from a `<repo>-<version>` directory name, else from the tag
pub fn version_from_dir(dir_name: &str, tag: &str) -> String {
    if let Some((_, candidate)) = dir_name.split_once('-') {
        if looks_like_version(candidate) {
            return candidate.trim_start_matches('v').to_string();
        }
    }
    let from_tag = tag.trim_start_matches('v');
    if !from_tag.is_empty() {
        return from_tag.to_string();
    }
    "unknown".to_string()
}

fn looks_like_version(text: &str) -> bool {
    let digits: String = text.chars().filter(|c| *c != '.' && *c != 'v').collect();
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}
