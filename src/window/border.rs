//! Border extension rules for the vertical row group and the horizontal window edge.

/// How neighborhood taps outside the image are supplied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BorderPolicy {
    /// Outside taps copy the nearest image pixel.
    #[default]
    Replicate,
    /// Outside taps are zero.
    Constant,
    /// Outside taps are left as they are; the driver passes the input through
    /// for every output within the kernel radius of an edge.
    Undefined,
}

impl BorderPolicy {
    /// Returns `true` when border outputs bypass the operator.
    pub fn passes_through(self) -> bool {
        matches!(self, BorderPolicy::Undefined)
    }

    /// Corrects a `kernel_size x vec_num` row group read at step row `y`.
    ///
    /// Row `i` of the group holds image row `y + i - (kernel_size - 1)`.
    /// Rows above the image are replaced walking up from the center row, rows
    /// below it walking down, so replication always copies the nearest row
    /// that is still inside the image.
    pub fn correct_rows<E: Copy + Default>(
        self,
        rows: &mut [E],
        kernel_size: usize,
        vec_num: usize,
        y: usize,
        img_rows: usize,
    ) {
        if self.passes_through() {
            return;
        }
        let radius = kernel_size / 2;
        for i in (0..radius).rev() {
            if y + i + 1 < kernel_size {
                self.substitute_row(rows, vec_num, i, i + 1);
            }
        }
        for i in radius + 1..kernel_size {
            if y + i + 1 >= img_rows + kernel_size {
                self.substitute_row(rows, vec_num, i, i - 1);
            }
        }
    }

    fn substitute_row<E: Copy + Default>(
        self,
        rows: &mut [E],
        vec_num: usize,
        target: usize,
        source: usize,
    ) {
        let dst = target * vec_num;
        match self {
            BorderPolicy::Replicate => rows.copy_within(source * vec_num..(source + 1) * vec_num, dst),
            BorderPolicy::Constant => rows[dst..dst + vec_num].fill(E::default()),
            BorderPolicy::Undefined => {}
        }
    }

    /// Fills window columns `[from, to)` left of the first image column.
    pub(crate) fn fill_leading<E: Copy + Default>(
        self,
        row: &mut [E],
        from: usize,
        to: usize,
        first: E,
    ) {
        match self {
            BorderPolicy::Replicate => row[from..to].fill(first),
            BorderPolicy::Constant => row[from..to].fill(E::default()),
            BorderPolicy::Undefined => {}
        }
    }

    /// Fills window columns from `from` onward, right of the last image column.
    pub(crate) fn fill_trailing<E: Copy + Default>(self, row: &mut [E], from: usize) {
        match self {
            BorderPolicy::Replicate => {
                let last = row[from - 1];
                row[from..].fill(last);
            }
            BorderPolicy::Constant | BorderPolicy::Undefined => row[from..].fill(E::default()),
        }
    }
}
