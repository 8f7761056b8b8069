//! Coefficient generators used by the [`Kernel`](super::Kernel) factories.

/// Three-tap smoothing seed grown by repeated convolution.
const SMOOTH_SEED: [i32; 3] = [1, 2, 1];
/// Three-tap derivative seed.
const DERIV_SEED: [i32; 3] = [-1, 0, 1];

/// Binomial row of odd length `size`, e.g. `[1, 4, 6, 4, 1]` for 5.
pub fn binomial(size: usize) -> Vec<i32> {
    grow(&SMOOTH_SEED, size)
}

/// Smoothed central difference of odd length `size`, e.g. `[-1, -2, 0, 2, 1]` for 5.
pub fn central_difference(size: usize) -> Vec<i32> {
    grow(&DERIV_SEED, size)
}

fn grow(seed: &[i32], size: usize) -> Vec<i32> {
    let mut taps = seed.to_vec();
    while taps.len() < size {
        taps = convolve_1d(&taps, &SMOOTH_SEED);
    }
    taps
}

fn convolve_1d(a: &[i32], b: &[i32]) -> Vec<i32> {
    let mut out = vec![0; a.len() + b.len() - 1];
    for (i, &av) in a.iter().enumerate() {
        for (j, &bv) in b.iter().enumerate() {
            out[i + j] += av * bv;
        }
    }
    out
}

/// Row-major outer product `rows[i] * cols[j]`.
pub fn outer(rows: &[i32], cols: &[i32]) -> Vec<i32> {
    rows.iter()
        .flat_map(|&r| cols.iter().map(move |&c| r * c))
        .collect()
}

/// 3x3 Scharr X and Y taps.
pub fn scharr_taps() -> ([i32; 9], [i32; 9]) {
    (
        [3, 0, -3, 10, 0, -10, 3, 0, -3],
        [3, 10, 3, 0, 0, 0, -3, -10, -3],
    )
}

/// Full 2-D convolution of two `size x size` kernels into `(2*size-1)^2` taps.
pub fn convolve(a: &[i32], b: &[i32], size: usize) -> Vec<i32> {
    let out_size = 2 * size - 1;
    let mut out = vec![0; out_size * out_size];
    for ay in 0..size {
        for ax in 0..size {
            let av = a[ay * size + ax];
            if av == 0 {
                continue;
            }
            for by in 0..size {
                for bx in 0..size {
                    out[(ay + by) * out_size + ax + bx] += av * b[by * size + bx];
                }
            }
        }
    }
    out
}

/// Spreads `plane` by `scale`, filling the new taps with zero.
pub fn dilate_plane(plane: &[i32], size: usize, scale: usize) -> Vec<i32> {
    let out_size = (size - 1) * scale + 1;
    let mut out = vec![0; out_size * out_size];
    for y in 0..size {
        for x in 0..size {
            out[y * scale * out_size + x * scale] = plane[y * size + x];
        }
    }
    out
}
