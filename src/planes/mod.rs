//! # Plane Metadata Module
//!
//! SLM plane targeting parameters from a multiplane scan MAT file.
//!
//! The scan software saves one variable, `scan_data`, laid out as:
//!
//! ```text
//! scan_data            1x1 struct
//! └── planes           Nx1 cell, one row per plane
//!     └── {p,1}        1x1 struct
//!         ├── idx      1x1 numeric (integral)
//!         ├── pattern  1x1 numeric (integral)
//!         ├── x, y, z  1x1 numeric
//!         └── i_targ, i_est, w_est
//! ```
//!
//! Plane fields are read by declaration position, not by name, so files
//! written with abbreviated or renamed fields still load.


use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::mat::{MatArray, MatError, MatFile};

/// Name of the top-level variable
pub const SCAN_DATA_VARIABLE: &str = "scan_data";

/// Field of `scan_data` holding the planes
pub const PLANES_FIELD: &str = "planes";

/// Plane fields in declaration order
pub const PLANE_FIELDS: [&str; 8] = ["idx", "pattern", "x", "y", "z", "i_targ", "i_est", "w_est"];

/// Targeting parameters of one SLM plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneRecord {
    /// Plane index as saved by the scan software
    pub idx: i64,

    /// SLM pattern number
    pub pattern: i64,

    /// Target x position
    pub x: f64,

    /// Target y position
    pub y: f64,

    /// Target z position
    pub z: f64,

    /// Requested intensity
    #[serde(rename = "i_targ")]
    pub target_intensity: f64,

    /// Intensity estimated by the SLM calibration
    #[serde(rename = "i_est")]
    pub estimated_intensity: f64,

    /// Weight estimate
    #[serde(rename = "w_est")]
    pub weight_estimate: f64,
}

impl PlaneRecord {
    /// Field values paired with their source names, in declaration order
    pub fn fields(&self) -> [(&'static str, f64); 8] {
        [
            (PLANE_FIELDS[0], self.idx as f64),
            (PLANE_FIELDS[1], self.pattern as f64),
            (PLANE_FIELDS[2], self.x),
            (PLANE_FIELDS[3], self.y),
            (PLANE_FIELDS[4], self.z),
            (PLANE_FIELDS[5], self.target_intensity),
            (PLANE_FIELDS[6], self.estimated_intensity),
            (PLANE_FIELDS[7], self.weight_estimate),
        ]
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Load every plane record of a scan MAT file, keyed by row position
pub fn load_plane_metadata<P: AsRef<Path>>(
    path: P,
) -> Result<BTreeMap<usize, PlaneRecord>, MatError> {
    let path = path.as_ref();
    info!("Loading plane metadata from {}", path.display());
    let mat = MatFile::open(path)?;
    plane_metadata_from_mat(&mat)
}

/// Extract plane records from an already decoded MAT file
pub fn plane_metadata_from_mat(mat: &MatFile) -> Result<BTreeMap<usize, PlaneRecord>, MatError> {
    let scan_data = mat.require(SCAN_DATA_VARIABLE)?;
    let path = format!("{}.{}", SCAN_DATA_VARIABLE, PLANES_FIELD);

    expect_kind(scan_data, SCAN_DATA_VARIABLE, is_struct, "a struct")?;
    expect_single(scan_data, SCAN_DATA_VARIABLE)?;
    let planes = scan_data
        .field(0, 0, PLANES_FIELD)
        .ok_or_else(|| layout(SCAN_DATA_VARIABLE, "no 'planes' field"))?;

    expect_kind(planes, &path, is_cell, "a cell array")?;
    if planes.rows() > 0 {
        expect_column(planes, &path)?;
    } else {
        warn!("{} holds no planes", path);
    }

    let mut records = BTreeMap::new();
    for p in 0..planes.rows() {
        let plane_path = format!("{}{{{},1}}", path, p + 1);
        let plane = planes
            .cell(p, 0)
            .ok_or_else(|| layout(&plane_path, "missing cell"))?;
        records.insert(p, plane_record(plane, &plane_path)?);
    }

    debug!("Read {} plane record(s)", records.len());
    Ok(records)
}

fn plane_record(plane: &MatArray, path: &str) -> Result<PlaneRecord, MatError> {
    expect_kind(plane, path, is_struct, "a struct")?;
    expect_single(plane, path)?;
    let field_count = plane.field_names().len();
    if field_count < PLANE_FIELDS.len() {
        return Err(layout(
            path,
            &format!(
                "{} field(s), expected at least {}",
                field_count,
                PLANE_FIELDS.len()
            ),
        ));
    }

    let mut values = [0.0; 8];
    for (position, value) in values.iter_mut().enumerate() {
        let field_path = format!("{}.{}", path, PLANE_FIELDS[position]);
        let field = plane
            .field_at(0, 0, position)
            .ok_or_else(|| layout(&field_path, "missing field value"))?;
        expect_kind(field, &field_path, is_numeric, "a numeric array")?;
        expect_single(field, &field_path)?;
        *value = field
            .scalar()
            .ok_or_else(|| layout(&field_path, "empty numeric array"))?;
    }

    Ok(PlaneRecord {
        idx: integral(PLANE_FIELDS[0], values[0])?,
        pattern: integral(PLANE_FIELDS[1], values[1])?,
        x: values[2],
        y: values[3],
        z: values[4],
        target_intensity: values[5],
        estimated_intensity: values[6],
        weight_estimate: values[7],
    })
}

fn is_struct(array: &MatArray) -> bool {
    matches!(array, MatArray::Struct { .. })
}

fn is_cell(array: &MatArray) -> bool {
    matches!(array, MatArray::Cell { .. })
}

fn is_numeric(array: &MatArray) -> bool {
    matches!(array, MatArray::Numeric { .. })
}

fn expect_kind(
    array: &MatArray,
    path: &str,
    accept: fn(&MatArray) -> bool,
    expected: &str,
) -> Result<(), MatError> {
    if accept(array) {
        Ok(())
    } else {
        Err(layout(
            path,
            &format!("expected {}, found {}", expected, array.kind()),
        ))
    }
}

/// Exactly one element
fn expect_single(array: &MatArray, path: &str) -> Result<(), MatError> {
    if array.len() == 1 {
        Ok(())
    } else {
        Err(layout(
            path,
            &format!("expected 1x1, found {:?}", array.dims()),
        ))
    }
}

/// One plane per row in a single column
fn expect_column(array: &MatArray, path: &str) -> Result<(), MatError> {
    if array.cols() == 1 {
        Ok(())
    } else {
        Err(layout(
            path,
            &format!("expected Nx1, found {:?}", array.dims()),
        ))
    }
}

fn layout(path: &str, reason: &str) -> MatError {
    MatError::UnexpectedLayout {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

fn integral(field: &str, value: f64) -> Result<i64, MatError> {
    if value.is_finite() && value.fract() == 0.0 {
        Ok(value as i64)
    } else {
        Err(MatError::InvalidValue {
            field: field.to_string(),
            value,
        })
    }
}
