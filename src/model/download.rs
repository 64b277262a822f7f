//! Fetching style artifacts from the ONNX model zoo.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Error, Result};

use super::StyleId;

/// Approximate artifact size, used when the server sends no content length.
const APPROX_ARTIFACT_SIZE: u64 = 6_700_000;

/// Make sure the artifact for `style` exists under `models_dir`, downloading it if not.
///
/// Blocking; call it outside an async context or through `spawn_blocking`.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the download fails.
pub fn fetch_artifact(style: StyleId, models_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(models_dir).map_err(|source| Error::ModelDir {
        path: models_dir.to_path_buf(),
        source,
    })?;

    let path = models_dir.join(style.artifact_file_name());
    if path.is_file() {
        tracing::debug!("Artifact already present: {}", path.display());
        return Ok(path);
    }

    download_file(style.download_url(), &path, style.artifact_file_name())?;
    Ok(path)
}

const PROGRESS_TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})";

/// Download a file from a URL to a path with progress indication.
fn download_file(url: &str, path: &Path, name: &str) -> Result<()> {
    tracing::info!("Downloading {name} from {url}");

    let response = reqwest::blocking::Client::new()
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(|source| Error::ModelDownload {
            name: name.to_string(),
            source,
        })?;

    let pb = ProgressBar::new(response.content_length().unwrap_or(APPROX_ARTIFACT_SIZE));
    if let Ok(style) = ProgressStyle::default_bar().template(PROGRESS_TEMPLATE) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(format!("Downloading {name}"));

    persist(response, path, &pb)?;

    pb.finish_with_message(format!("Downloaded {name}"));
    Ok(())
}

/// Stream `body` into `<path>.tmp` and rename it over `path`.
///
/// `path` only ever holds a complete file; the temporary is removed on failure.
fn persist<R: Read>(mut body: R, path: &Path, pb: &ProgressBar) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    let written = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&temp_path)?;
        std::io::copy(&mut body, &mut pb.wrap_write(&mut file))?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if let Err(err) = written {
        if let Err(cleanup) = fs::remove_file(&temp_path) {
            tracing::debug!("Could not remove {}: {cleanup}", temp_path.display());
        }
        return Err(err.into());
    }

    Ok(())
}
