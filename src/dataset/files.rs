//! Image directory listing and numeric ordering.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// List the regular, non-hidden files of `dir`, sorted by file name.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn list_image_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir.as_ref())? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        files.push(entry.path());
    }

    files.sort();
    Ok(files)
}

/// Extract the image number from names like `ILSVRC2012_val_00000042.JPEG`.
///
/// The number is the third `_`-separated token of the file name, with
/// everything from its first `.` removed.
///
/// # Errors
///
/// Returns [`Error::InvalidFileName`] if the token is missing or not a number.
pub fn image_number(path: &Path) -> Result<u64> {
    let invalid = |reason: &str| Error::InvalidFileName {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| invalid("file name is not valid UTF-8"))?;

    let token = name
        .split('_')
        .nth(2)
        .ok_or_else(|| invalid("expected at least three '_'-separated fields"))?;
    let digits = token.split('.').next().unwrap_or(token);

    digits
        .parse()
        .map_err(|_| invalid(&format!("{digits:?} is not an image number")))
}

/// List the files of `dir` ordered by their image number.
///
/// # Errors
///
/// Returns an error if the directory cannot be read or a file name carries
/// no image number.
pub fn sorted_image_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let files = list_image_files(dir)?;

    let mut numbered = files
        .into_iter()
        .map(|path| image_number(&path).map(|n| (n, path)))
        .collect::<Result<Vec<_>>>()?;
    numbered.sort_by_key(|(n, _)| *n);

    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}
