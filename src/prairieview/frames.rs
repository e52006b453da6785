//! Per-frame timing collection

use serde::{Deserialize, Serialize};

use super::PrairieViewError;
use crate::xml::XmlElement;

/// Which timestamp attribute of a `Frame` to collect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingAttribute {
    /// Seconds since the start of the acquisition (`relativeTime`)
    Relative,
    /// Seconds since the software clock started (`absoluteTime`)
    Absolute,
}

impl TimingAttribute {
    /// XML attribute name
    pub fn attribute_name(self) -> &'static str {
        match self {
            TimingAttribute::Relative => "relativeTime",
            TimingAttribute::Absolute => "absoluteTime",
        }
    }
}

/// Collect one timestamp per `Frame` child of `sequence`, in document order.
///
/// Frames without the attribute are skipped; dropped frames are exported
/// without timing.
pub fn collect_frame_times(
    sequence: &XmlElement,
    timing: TimingAttribute,
) -> Result<Vec<f64>, PrairieViewError> {
    let key = timing.attribute_name();
    sequence
        .find_all("Frame")
        .filter_map(|frame| frame.attribute(key))
        .map(|raw| {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| PrairieViewError::MalformedValue {
                    field: key.to_string(),
                    value: raw.to_string(),
                })
        })
        .collect()
}

/// Rectangular row-major matrix of frame times (rows = sequences,
/// columns = frames). Serializes as a list of rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<Vec<f64>>", try_from = "Vec<Vec<f64>>")]
pub struct FrameTimeMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl FrameTimeMatrix {
    /// Stack rows into a matrix, failing if they differ in length
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, PrairieViewError> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some((row, bad)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(PrairieViewError::ShapeMismatch {
                row,
                expected: cols,
                found: bad.len(),
            });
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data: rows.into_iter().flatten().collect(),
        })
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether the matrix holds no values
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element at `(row, col)`
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col).copied()
        } else {
            None
        }
    }

    /// One row as a slice
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        (row < self.rows).then(|| &self.data[row * self.cols..(row + 1) * self.cols])
    }

    /// Iterate over rows
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.rows).map(move |r| &self.data[r * self.cols..(r + 1) * self.cols])
    }

    /// Copy out as nested rows
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.iter_rows().map(<[f64]>::to_vec).collect()
    }
}

impl From<FrameTimeMatrix> for Vec<Vec<f64>> {
    fn from(matrix: FrameTimeMatrix) -> Self {
        matrix.to_rows()
    }
}

impl TryFrom<Vec<Vec<f64>>> for FrameTimeMatrix {
    type Error = PrairieViewError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}
