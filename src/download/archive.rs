use std::fs;
use tracing::info;

use super::scratch::Scratch;
use super::{replace_dir, DefaultFetcher};
use crate::contract::{GitClient, HttpClient, HttpResponse};
use crate::error::{BadResponseReason, FetchError};
use crate::extract::{extract_archive, ArchiveFormat};

/// Bodies shorter than this are error pages, not archives.
pub const MIN_ARCHIVE_BYTES: usize = 100;

/// Accept a response as an archive body, or say why not.
pub fn check_archive_response(url: &str, response: HttpResponse) -> Result<Vec<u8>, FetchError> {
    if response.status >= 400 {
        return Err(FetchError::BadResponse {
            url: url.to_string(),
            reason: BadResponseReason::Status(response.status),
        });
    }
    if response.body.len() < MIN_ARCHIVE_BYTES {
        return Err(FetchError::BadResponse {
            url: url.to_string(),
            reason: BadResponseReason::TooShort(response.body.len()),
        });
    }
    Ok(response.body)
}

impl<H: HttpClient, G: GitClient> DefaultFetcher<H, G> {
    pub(crate) async fn install_archive(
        &self,
        full_name: &str,
        url: &str,
        version: &str,
    ) -> Result<(), FetchError> {
        info!(full_name, url, "Downloading archive");
        let response = self
            .http
            .get(url)
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        let body = check_archive_response(url, response)?;
        let format = ArchiveFormat::sniff(&body);

        let archive_path = self.layout.scratch_archive(full_name);
        let extract_dir = self.layout.scratch_dir(full_name);
        let _scratch = Scratch::claim(vec![archive_path.clone(), extract_dir.clone()])
            .map_err(|e| FetchError::io(&extract_dir, e))?;

        if let Some(parent) = archive_path.parent() {
            fs::create_dir_all(parent).map_err(|e| FetchError::io(parent, e))?;
        }
        fs::write(&archive_path, &body).map_err(|e| FetchError::io(&archive_path, e))?;
        info!(full_name, bytes = body.len(), ?format, "Downloaded archive");
        drop(body);

        extract_archive(format, &archive_path, &extract_dir)?;
        let root = self
            .locator
            .locate_content_root(extract_dir.clone())
            .map_err(|e| FetchError::io(&extract_dir, e))?;

        replace_dir(&root, &self.layout.target_dir(full_name))?;
        info!(full_name, version, "Installed archive content");
        Ok(())
    }
}
