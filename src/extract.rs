//! Archive sniffing and extraction.
//!
//! The format is decided from the first bytes of the body only: a zip local
//! file header selects zip, everything else is treated as a tar (plain, gzip
//! or bzip2). Paths inside `.git` or `.svn` directories are never written.

use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Component, Path};
use tracing::{debug, warn};

use crate::error::FetchError;

/// `PK\x03\x04`, the zip local file header signature.
pub const ZIP_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
const BZIP2_MAGIC: [u8; 3] = *b"BZh";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
}

impl ArchiveFormat {
    pub fn sniff(body: &[u8]) -> Self {
        if body.starts_with(&ZIP_SIGNATURE) {
            ArchiveFormat::Zip
        } else {
            ArchiveFormat::Tar
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TarCompression {
    Plain,
    Gzip,
    Bzip2,
}

impl TarCompression {
    fn detect(magic: &[u8]) -> Self {
        if magic.starts_with(&GZIP_MAGIC) {
            TarCompression::Gzip
        } else if magic.starts_with(&BZIP2_MAGIC) {
            TarCompression::Bzip2
        } else {
            TarCompression::Plain
        }
    }
}

pub fn is_vcs_metadata(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => name == ".git" || name == ".svn",
        _ => false,
    })
}

/// Extract `archive` into `dest`, returning the number of files written.
pub fn extract_archive(
    format: ArchiveFormat,
    archive: &Path,
    dest: &Path,
) -> Result<usize, FetchError> {
    fs::create_dir_all(dest).map_err(|e| FetchError::io(dest, e))?;
    let written = match format {
        ArchiveFormat::Zip => extract_zip(archive, dest)?,
        ArchiveFormat::Tar => extract_tar(archive, dest)?,
    };
    debug!(?format, files = written, dest = %dest.display(), "Extracted archive");
    Ok(written)
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<usize, FetchError> {
    let file = File::open(archive).map_err(|e| FetchError::io(archive, e))?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file))?;
    let mut written = 0;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            warn!(name = entry.name(), "Skipping zip entry outside the extraction directory");
            continue;
        };
        if relative.as_os_str().is_empty() || is_vcs_metadata(&relative) {
            continue;
        }

        let out = dest.join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&out).map_err(|e| FetchError::io(&out, e))?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent).map_err(|e| FetchError::io(parent, e))?;
        }
        let mut target = File::create(&out).map_err(|e| FetchError::io(&out, e))?;
        io::copy(&mut entry, &mut target).map_err(|e| FetchError::io(&out, e))?;
        written += 1;
    }
    Ok(written)
}

fn extract_tar(archive: &Path, dest: &Path) -> Result<usize, FetchError> {
    let mut file = File::open(archive).map_err(|e| FetchError::io(archive, e))?;
    let mut magic = [0u8; 3];
    let read = file.read(&mut magic).map_err(|e| FetchError::io(archive, e))?;
    file.seek(SeekFrom::Start(0))
        .map_err(|e| FetchError::io(archive, e))?;

    let buffered = BufReader::new(file);
    let reader: Box<dyn Read> = match TarCompression::detect(&magic[..read]) {
        TarCompression::Gzip => Box::new(flate2::read::MultiGzDecoder::new(buffered)),
        TarCompression::Bzip2 => Box::new(bzip2::read::BzDecoder::new(buffered)),
        TarCompression::Plain => Box::new(buffered),
    };

    let mut tar = tar::Archive::new(reader);
    let mut written = 0;
    for entry in tar.entries().map_err(tar_error)? {
        let mut entry = entry.map_err(tar_error)?;
        let kind = entry.header().entry_type();
        if kind.is_pax_global_extensions() || kind.is_pax_local_extensions() {
            continue;
        }
        let path = entry.path().map_err(tar_error)?.into_owned();
        if is_vcs_metadata(&path) {
            continue;
        }
        if !entry.unpack_in(dest).map_err(tar_error)? {
            warn!(path = %path.display(), "Skipping tar entry outside the extraction directory");
            continue;
        }
        if kind.is_file() {
            written += 1;
        }
    }
    Ok(written)
}

fn tar_error(e: io::Error) -> FetchError {
    FetchError::Extract {
        message: e.to_string(),
    }
}
