// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Row/column presentation of flat result buffers.
//!
//! Each value is printed right-aligned in a field of [`CELL_WIDTH`] characters
//! with [`DECIMALS`] digits after the point; cells in a row are separated by a
//! single space and rows end with a newline.

use std::fmt::Write as _;
use std::io::{self, Write};

/// Field width of one formatted value.
pub const CELL_WIDTH: usize = 7;

/// Digits after the decimal point.
pub const DECIMALS: usize = 2;

/// Format `values` as rows of `columns` cells.
///
/// A trailing partial row is emitted as-is. `columns == 0` yields an empty
/// string.
#[must_use]
pub fn format_grid(values: &[f32], columns: usize) -> String {
    let mut out = String::new();
    if columns == 0 {
        return out;
    }
    for row in values.chunks(columns) {
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            // Writing into a String cannot fail.
            let _ = write!(out, "{value:>width$.prec$}", width = CELL_WIDTH, prec = DECIMALS);
        }
        out.push('\n');
    }
    out
}

/// Write the grid for `values` to `writer`.
///
/// # Errors
///
/// Propagates any I/O error from `writer`.
pub fn write_grid<W: Write>(writer: &mut W, values: &[f32], columns: usize) -> io::Result<()> {
    writer.write_all(format_grid(values, columns).as_bytes())?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_are_fixed_width() {
        let s = format_grid(&[0.0, 2.0, 30.0, 1234.5], 4);
        assert_eq!(s, "   0.00    2.00   30.00 1234.50\n");
    }

    #[test]
    fn test_rows_split_on_column_count() {
        let values: Vec<f32> = (0u8..16).map(f32::from).collect();
        let s = format_grid(&values, 4);
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines.len(), 4);
        for line in lines {
            assert_eq!(line.split_whitespace().count(), 4);
        }
    }

    #[test]
    fn test_partial_row_and_zero_columns() {
        assert_eq!(format_grid(&[1.0, 2.0, 3.0], 2), "   1.00    2.00\n   3.00\n");
        assert_eq!(format_grid(&[1.0], 0), "");
        assert_eq!(format_grid(&[], 4), "");
    }

    #[test]
    fn test_negative_values() {
        assert_eq!(format_grid(&[-1.5], 1), "  -1.50\n");
    }

    #[test]
    fn test_write_grid() {
        let mut buf = Vec::new();
        write_grid(&mut buf, &[1.0, 2.0], 2).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "   1.00    2.00\n");
    }
}
