//! Category tables mapping numeric class IDs and synsets to words.
//!
//! Both readers take the same whitespace separated table, whose first line is
//! a header:
//! ```text
//! ID  WNID       words
//! 1   n02119789  kit fox, Vulpes macrotis
//! 2   n02100735  English setter
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};

/// Read the mapping from class ID to category words.
///
/// # Errors
///
/// Returns an error if the file cannot be read or an ID is not an integer.
pub fn read_image_id_mapping<P: AsRef<Path>>(path: P) -> Result<HashMap<u32, String>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    id_mapping(BufReader::new(file), path)
}

/// Parse the class ID table from any buffered reader.
///
/// # Errors
///
/// Returns an error on the first malformed row.
pub fn parse_image_id_mapping<R: BufRead>(reader: R) -> Result<HashMap<u32, String>> {
    id_mapping(reader, Path::new("<reader>"))
}

/// Read the mapping from category words to synset ID.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a row has fewer than two
/// columns.
pub fn read_label_to_synset_mapping<P: AsRef<Path>>(path: P) -> Result<HashMap<String, String>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    synset_mapping(BufReader::new(file), path)
}

/// Parse the words-to-synset table from any buffered reader.
///
/// # Errors
///
/// Returns an error on the first malformed row.
pub fn parse_label_to_synset_mapping<R: BufRead>(reader: R) -> Result<HashMap<String, String>> {
    synset_mapping(reader, Path::new("<reader>"))
}

fn id_mapping<R: BufRead>(reader: R, origin: &Path) -> Result<HashMap<u32, String>> {
    let mut id_to_category = HashMap::new();

    for_each_row(reader, origin, |line, columns| {
        let id: u32 = columns[0].parse().map_err(|err| Error::Parse {
            path: origin.to_path_buf(),
            line,
            reason: format!("invalid id {:?}: {err}", columns[0]),
        })?;
        id_to_category.insert(id, words(columns));
        Ok(())
    })?;

    tracing::debug!("Read {} id mappings from {}", id_to_category.len(), origin.display());
    Ok(id_to_category)
}

fn synset_mapping<R: BufRead>(reader: R, origin: &Path) -> Result<HashMap<String, String>> {
    let mut label_to_synset = HashMap::new();

    for_each_row(reader, origin, |line, columns| {
        let synset = columns.get(1).ok_or_else(|| Error::Parse {
            path: origin.to_path_buf(),
            line,
            reason: "missing synset column".to_string(),
        })?;
        label_to_synset.insert(words(columns), (*synset).to_string());
        Ok(())
    })?;

    tracing::debug!("Read {} synset mappings from {}", label_to_synset.len(), origin.display());
    Ok(label_to_synset)
}

/// Columns from index 2 onward joined with single spaces.
fn words(columns: &[&str]) -> String {
    columns.get(2..).map(|rest| rest.join(" ")).unwrap_or_default()
}

/// Call `row` with the 1-based line number and columns of every non-blank
/// line after the header.
fn for_each_row<R, F>(reader: R, origin: &Path, mut row: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(usize, &[&str]) -> Result<()>,
{
    let mut lines = reader.lines();

    if lines.next().transpose()?.is_none() {
        return Err(Error::Parse {
            path: origin.to_path_buf(),
            line: 1,
            reason: "missing header line".to_string(),
        });
    }

    for (idx, line) in lines.enumerate() {
        let line = line?;
        let columns: Vec<&str> = line.split_whitespace().collect();
        if columns.is_empty() {
            continue;
        }
        row(idx + 2, &columns)?;
    }

    Ok(())
}
