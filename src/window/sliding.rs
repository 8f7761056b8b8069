//! The `rows x WIN_COLS` working buffer neighborhoods are sliced from.

use crate::window::{BorderPolicy, Geometry};

/// Scalar window shifted left by `vec_num` columns per step.
///
/// Lane `v` of the current step owns columns `v .. v + kernel_size` of every
/// row. The newest column group lands in the last `vec_num` columns.
#[derive(Clone, Debug)]
pub struct SlidingWindow<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
    vec_num: usize,
    radius: usize,
}

impl<T: Copy + Default> SlidingWindow<T> {
    /// Creates a zeroed window with `rows` rows for the given geometry.
    pub fn new(rows: usize, geometry: &Geometry) -> Self {
        let cols = geometry.win_cols();
        Self {
            data: vec![T::default(); rows * cols],
            rows,
            cols,
            vec_num: geometry.vec_num(),
            radius: geometry.radius(),
        }
    }

    /// Shifts every row left by `vec_num` and appends the column group.
    ///
    /// `group` holds `rows x vec_num` scalars, already corrected vertically.
    /// At `x == 0` the columns left of the first image column are filled by
    /// the border policy; at `x >= vec_cols` the new columns are.
    pub fn shift_and_refill(&mut self, group: &[T], x: usize, vec_cols: usize, border: BorderPolicy) {
        let lanes = self.vec_num;
        let newest = self.cols - lanes;
        let leading = newest - self.radius;
        for i in 0..self.rows {
            let row = &mut self.data[i * self.cols..(i + 1) * self.cols];
            row.copy_within(lanes.., 0);
            if x < vec_cols {
                row[newest..].copy_from_slice(&group[i * lanes..(i + 1) * lanes]);
            } else {
                border.fill_trailing(row, newest);
            }
            if x == 0 {
                border.fill_leading(row, leading, newest, group[i * lanes]);
            }
        }
    }

    /// Row `i` of the window.
    #[inline]
    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Tap at row `i`, column `j`.
    #[inline]
    pub fn at(&self, i: usize, j: usize) -> T {
        self.data[i * self.cols + j]
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }
}
