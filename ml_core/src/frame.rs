use std::collections::BTreeSet;

use crate::FrameError;

/// A single named column of numeric cells.
///
/// Categorical columns store their level index as `f32`; the frame itself does
/// not distinguish the two, the response handling does.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    data: Vec<f32>,
}

impl Column {
    pub fn new(name: impl Into<String>, data: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// An immutable, columnar, in-memory table.
///
/// Row and column counts are fixed at creation. Frames are read-only after
/// creation and are shared across workers behind `Arc` without locking.
#[derive(Debug, Clone)]
pub struct Frame {
    columns: Vec<Column>,
    rows: usize,
}

impl Frame {
    /// Builds a frame from columns of equal length.
    ///
    /// # Errors
    /// `FrameError::Empty` if there are no columns or no rows,
    /// `FrameError::ColumnLengthMismatch` if column lengths differ.
    pub fn new(columns: Vec<Column>) -> Result<Self, FrameError> {
        let rows = columns.first().map_or(0, Column::len);
        if rows == 0 {
            return Err(FrameError::Empty);
        }

        for col in &columns {
            if col.len() != rows {
                return Err(FrameError::ColumnLengthMismatch {
                    column: col.name().to_owned(),
                    got: col.len(),
                    expected: rows,
                });
            }
        }

        Ok(Self { columns, rows })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.columns.len()
    }

    /// Typed access to a column by its stable index.
    pub fn column(&self, index: usize) -> Result<&Column, FrameError> {
        self.columns.get(index).ok_or(FrameError::ColumnOutOfRange {
            index,
            cols: self.cols(),
        })
    }

    /// Looks a column up by name.
    pub fn column_by_name(&self, name: &str) -> Option<(usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.name() == name)
    }
}

/// Designates the response column and the set of ignored columns.
///
/// Ignored columns are excluded from feature vectors but never removed from
/// the underlying frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRoles {
    response: usize,
    ignored: BTreeSet<usize>,
}

impl ColumnRoles {
    pub fn new(response: usize, ignored: impl IntoIterator<Item = usize>) -> Self {
        Self {
            response,
            ignored: ignored.into_iter().collect(),
        }
    }

    #[inline]
    pub fn response(&self) -> usize {
        self.response
    }

    #[inline]
    pub fn ignored(&self) -> &BTreeSet<usize> {
        &self.ignored
    }

    /// Resolves these roles against a concrete frame.
    ///
    /// # Errors
    /// `FrameError::ColumnOutOfRange` if the response is not a column of the
    /// frame, `FrameError::ResponseIgnored` if it is also ignored.
    pub fn layout(&self, frame: &Frame) -> Result<FeatureLayout, FrameError> {
        if self.response >= frame.cols() {
            return Err(FrameError::ColumnOutOfRange {
                index: self.response,
                cols: frame.cols(),
            });
        }
        if self.ignored.contains(&self.response) {
            return Err(FrameError::ResponseIgnored {
                index: self.response,
            });
        }

        let feature_cols = (0..frame.cols())
            .filter(|c| *c != self.response && !self.ignored.contains(c))
            .collect();

        Ok(FeatureLayout {
            feature_cols,
            response: self.response,
        })
    }
}

/// The resolved mapping from frame columns to model inputs.
///
/// Feature column order follows the frame's column order, with the response
/// and ignored columns skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureLayout {
    feature_cols: Vec<usize>,
    response: usize,
}

impl FeatureLayout {
    /// Number of model inputs this layout produces.
    #[inline]
    pub fn width(&self) -> usize {
        self.feature_cols.len()
    }

    #[inline]
    pub fn response(&self) -> usize {
        self.response
    }

    /// Copies one row's feature cells into `out`.
    ///
    /// # Panics
    /// If `out.len() != self.width()` or `row` is out of range; callers
    /// validate both once up front.
    pub fn fill_row(&self, frame: &Frame, row: usize, out: &mut [f32]) {
        assert_eq!(out.len(), self.feature_cols.len(), "feature buffer width");
        for (slot, &col) in out.iter_mut().zip(&self.feature_cols) {
            *slot = frame.column(col).expect("validated column").data()[row];
        }
    }

    /// The raw response cell for one row.
    pub fn response_value(&self, frame: &Frame, row: usize) -> f32 {
        frame.column(self.response).expect("validated column").data()[row]
    }

    /// Verifies that every column this layout references exists in `frame`,
    /// for layouts resolved against one frame and applied to another.
    pub fn check(&self, frame: &Frame) -> Result<(), FrameError> {
        for &col in self.feature_cols.iter().chain(std::iter::once(&self.response)) {
            if col >= frame.cols() {
                return Err(FrameError::ColumnOutOfRange {
                    index: col,
                    cols: frame.cols(),
                });
            }
        }
        Ok(())
    }

    /// Scans the response column and derives the number of classes.
    ///
    /// Labels must be non-negative integers stored as `f32`; the class count
    /// is `max + 1`, never less than 2.
    ///
    /// # Errors
    /// `FrameError::InvalidLabel` for negative or non-integral cells.
    pub fn class_count(&self, frame: &Frame) -> Result<usize, FrameError> {
        let data = frame.column(self.response)?.data();
        let mut max = 0usize;

        for (row, &value) in data.iter().enumerate() {
            if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
                return Err(FrameError::InvalidLabel { row, value });
            }
            max = max.max(value as usize);
        }

        Ok((max + 1).max(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> Frame {
        Frame::new(vec![
            Column::new("x0", vec![1.0, 2.0, 3.0]),
            Column::new("x1", vec![4.0, 5.0, 6.0]),
            Column::new("skip", vec![0.0, 0.0, 0.0]),
            Column::new("label", vec![0.0, 1.0, 1.0]),
        ])
        .unwrap()
    }

    #[test]
    fn frame_rejects_ragged_columns() {
        let err = Frame::new(vec![
            Column::new("a", vec![1.0, 2.0]),
            Column::new("b", vec![1.0]),
        ])
        .unwrap_err();

        assert!(matches!(err, FrameError::ColumnLengthMismatch { .. }));
    }

    #[test]
    fn frame_rejects_empty() {
        assert!(matches!(Frame::new(vec![]), Err(FrameError::Empty)));
    }

    #[test]
    fn layout_excludes_response_and_ignored() {
        let frame = sample_frame();
        let roles = ColumnRoles::new(3, [2]);
        let layout = roles.layout(&frame).unwrap();

        assert_eq!(layout.width(), 2);

        let mut row = [0.0f32; 2];
        layout.fill_row(&frame, 1, &mut row);
        assert_eq!(row, [2.0, 5.0]);
        assert_eq!(layout.response_value(&frame, 1), 1.0);
    }

    #[test]
    fn layout_rejects_ignored_response() {
        let frame = sample_frame();
        let err = ColumnRoles::new(3, [3]).layout(&frame).unwrap_err();
        assert!(matches!(err, FrameError::ResponseIgnored { index: 3 }));
    }

    #[test]
    fn layout_rejects_out_of_range_response() {
        let frame = sample_frame();
        let err = ColumnRoles::new(9, []).layout(&frame).unwrap_err();
        assert!(matches!(err, FrameError::ColumnOutOfRange { index: 9, .. }));
    }

    #[test]
    fn class_count_from_labels() {
        let frame = sample_frame();
        let layout = ColumnRoles::new(3, []).layout(&frame).unwrap();
        assert_eq!(layout.class_count(&frame).unwrap(), 2);
    }

    #[test]
    fn class_count_rejects_fractional_labels() {
        let frame = Frame::new(vec![
            Column::new("x", vec![1.0, 2.0]),
            Column::new("y", vec![0.5, 1.0]),
        ])
        .unwrap();
        let layout = ColumnRoles::new(1, []).layout(&frame).unwrap();

        let err = layout.class_count(&frame).unwrap_err();
        assert!(matches!(err, FrameError::InvalidLabel { row: 0, .. }));
    }
}
