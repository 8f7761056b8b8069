//! Bounded history of the previous `size - 1` rows.

/// Per-column history of the last `size - 1` rows of a vectorized channel.
///
/// Rows are stored in `size - 1` slots. Slot order rotates once per image row,
/// so appending a vector overwrites the oldest sample of that column without
/// moving the others.
#[derive(Clone, Debug)]
pub struct LineBufferBank<T> {
    slots: Vec<T>,
    depth: usize,
    columns: usize,
    vec_num: usize,
    head: usize,
}

impl<T: Copy + Default> LineBufferBank<T> {
    /// Creates a zero-initialized bank for `columns` vectors of `vec_num` lanes.
    pub fn new(kernel_size: usize, columns: usize, vec_num: usize) -> Self {
        let depth = kernel_size.saturating_sub(1).max(1);
        Self {
            slots: vec![T::default(); depth * columns * vec_num],
            depth,
            columns,
            vec_num,
            head: 0,
        }
    }

    /// Number of history rows retained.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Reads the history at `column` and appends `input`.
    ///
    /// `out` receives `depth + 1` rows of `vec_num` lanes: the stored rows,
    /// oldest first, followed by `input`. Columns must be visited in
    /// increasing order and the slot order rotates after the last column.
    pub fn read_and_append(&mut self, column: usize, input: &[T], out: &mut [T]) {
        let lanes = self.vec_num;
        let row_len = self.columns * lanes;
        let base = column * lanes;
        for i in 0..self.depth {
            let slot = (self.head + i) % self.depth;
            let start = slot * row_len + base;
            out[i * lanes..(i + 1) * lanes].copy_from_slice(&self.slots[start..start + lanes]);
        }
        out[self.depth * lanes..(self.depth + 1) * lanes].copy_from_slice(&input[..lanes]);

        let oldest = self.head * row_len + base;
        self.slots[oldest..oldest + lanes].copy_from_slice(&input[..lanes]);
        if column + 1 == self.columns {
            self.head = (self.head + 1) % self.depth;
        }
    }
}
