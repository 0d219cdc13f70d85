//! Validation ground-truth label files.
//!
//! One 1-indexed class label per line:
//! ```text
//! 490
//! 361
//! 171
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ndarray::Array2;

use crate::error::{Error, Result};

/// Number of classes in the ILSVRC classification task.
pub const ILSVRC_NUM_CLASSES: usize = 1000;

/// Labels read from a validation ground-truth file.
#[derive(Debug, Clone)]
pub struct ValidationLabels {
    /// Raw 1-indexed labels in file order.
    pub labels: Vec<u32>,
    /// One-hot rows, shape `(labels.len(), num_classes)`; label `k` sets column `k - 1`.
    pub one_hot: Array2<f32>,
}

impl ValidationLabels {
    /// Number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no labels were read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Read a validation label file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a line is not a label in
/// `1..=num_classes`.
pub fn read_validation_labels<P: AsRef<Path>>(path: P, num_classes: usize) -> Result<ValidationLabels> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let labels = parse_labels(BufReader::new(file), path, num_classes)?;

    tracing::debug!("Read {} labels from {}", labels.len(), path.display());
    Ok(labels)
}

/// Parse validation labels from any buffered reader.
///
/// # Errors
///
/// Returns an error on the first malformed line.
pub fn parse_validation_labels<R: BufRead>(reader: R, num_classes: usize) -> Result<ValidationLabels> {
    parse_labels(reader, Path::new("<reader>"), num_classes)
}

fn parse_labels<R: BufRead>(reader: R, origin: &Path, num_classes: usize) -> Result<ValidationLabels> {
    let parse_error = |line: usize, reason: String| Error::Parse {
        path: origin.to_path_buf(),
        line,
        reason,
    };

    let mut labels = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let label: u32 = trimmed
            .parse()
            .map_err(|err| parse_error(idx + 1, format!("invalid label {trimmed:?}: {err}")))?;

        if label == 0 || label as usize > num_classes {
            return Err(parse_error(
                idx + 1,
                format!("label {label} outside 1..={num_classes}"),
            ));
        }

        labels.push(label);
    }

    let one_hot = one_hot_encode(&labels, num_classes);
    Ok(ValidationLabels { labels, one_hot })
}

/// One-hot encode 1-indexed labels. Labels outside `1..=num_classes` leave
/// their row empty.
#[must_use]
pub fn one_hot_encode(labels: &[u32], num_classes: usize) -> Array2<f32> {
    let mut encoded = Array2::zeros((labels.len(), num_classes));

    for (i, &label) in labels.iter().enumerate() {
        let column = (label as usize).wrapping_sub(1);
        if column < num_classes {
            encoded[[i, column]] = 1.0;
        }
    }

    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_labels() {
        let parsed = parse_validation_labels(Cursor::new("3\n1\n 10 \n"), 10).unwrap();

        assert_eq!(parsed.labels, vec![3, 1, 10]);
        assert_eq!(parsed.one_hot.shape(), &[3, 10]);
        assert_eq!(parsed.one_hot[[0, 2]], 1.0);
        assert_eq!(parsed.one_hot[[1, 0]], 1.0);
        assert_eq!(parsed.one_hot[[2, 9]], 1.0);
        assert_eq!(parsed.one_hot.sum(), 3.0);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let parsed = parse_validation_labels(Cursor::new("5\n\n7\n\n"), 10).unwrap();
        assert_eq!(parsed.labels, vec![5, 7]);
    }

    #[test]
    fn test_malformed_line_is_fatal() {
        let err = parse_validation_labels(Cursor::new("5\nfive\n"), 10).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn test_label_out_of_range() {
        assert!(matches!(
            parse_validation_labels(Cursor::new("0\n"), 10),
            Err(Error::Parse { line: 1, .. })
        ));
        assert!(matches!(
            parse_validation_labels(Cursor::new("1\n11\n"), 10),
            Err(Error::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ground_truth.txt");
        std::fs::write(&path, "490\n361\n1000\n").unwrap();

        let parsed = read_validation_labels(&path, ILSVRC_NUM_CLASSES).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed.one_hot[[0, 489]], 1.0);
        assert_eq!(parsed.one_hot[[2, 999]], 1.0);
    }

    #[test]
    fn test_one_hot_encode() {
        let encoded = one_hot_encode(&[1, 4, 2], 4);

        assert_eq!(encoded.shape(), &[3, 4]);
        assert_eq!(encoded[[0, 0]], 1.0);
        assert_eq!(encoded[[1, 3]], 1.0);
        assert_eq!(encoded[[2, 1]], 1.0);
        assert_eq!(encoded[[2, 0]], 0.0);
    }
}
