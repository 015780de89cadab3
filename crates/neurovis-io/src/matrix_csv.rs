//! Headerless numeric CSV matrices
//!
//! RDMs and channel × time arrays are exchanged as plain rows of numbers.
//! `nan` / `NaN` / `inf` are accepted; empty fields are not.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ndarray::{Array2, ArrayView2};

use crate::error::{IoError, IoResult};

/// Load a comma-separated matrix
pub fn load_matrix(path: impl AsRef<Path>) -> IoResult<Array2<f64>> {
    load_matrix_with_delimiter(path, b',')
}

/// Load a matrix with a custom field delimiter
pub fn load_matrix_with_delimiter(path: impl AsRef<Path>, delimiter: u8) -> IoResult<Array2<f64>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IoError::FileNotFound(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|e| IoError::OpenFailed(e.to_string()))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let mut values = Vec::new();
    let mut ncols: Option<usize> = None;
    let mut nrows = 0;

    for (row, result) in reader.records().enumerate() {
        let line = row + 1;
        let record = result.map_err(|e| IoError::Csv {
            line,
            message: e.to_string(),
        })?;

        match ncols {
            None => ncols = Some(record.len()),
            Some(n) if n != record.len() => {
                return Err(IoError::Csv {
                    line,
                    message: format!("expected {} fields, found {}", n, record.len()),
                })
            }
            Some(_) => {}
        }

        for field in record.iter() {
            let v: f64 = field.parse().map_err(|_| IoError::Csv {
                line,
                message: format!("'{}' is not a number", field),
            })?;
            values.push(v);
        }
        nrows += 1;
    }

    let ncols = ncols.unwrap_or(0);
    if nrows == 0 || ncols == 0 {
        return Err(IoError::InvalidFormat(format!("{}: empty matrix", path.display())));
    }

    tracing::debug!(path = %path.display(), nrows, ncols, "loaded matrix");
    Array2::from_shape_vec((nrows, ncols), values).map_err(|e| IoError::InvalidFormat(e.to_string()))
}

/// Write a matrix as comma-separated rows
pub fn write_matrix(path: impl AsRef<Path>, matrix: ArrayView2<f64>) -> IoResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(file));

    for (i, row) in matrix.rows().into_iter().enumerate() {
        let fields: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writer.write_record(&fields).map_err(|e| IoError::Csv {
            line: i + 1,
            message: e.to_string(),
        })?;
    }
    writer.flush()?;
    Ok(())
}
