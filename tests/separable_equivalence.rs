use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use streamfilter::{
    BorderPolicy, Filter, ImageView, Kernel, LineKernel, LineOperator, Operator, OwnedImage,
    SeparableFilter, StreamElement,
};

fn random_image(seed: u64, width: usize, height: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..width * height).map(|_| rng.random::<u8>()).collect()
}

fn two_d(
    data: &[u8],
    width: usize,
    height: usize,
    vec_num: usize,
    border: BorderPolicy,
    kernel: Kernel,
    op: Operator,
) -> OwnedImage<u8> {
    let filter = Filter::<u8, u8>::builder(width, height)
        .vec_num(vec_num)
        .border(border)
        .kernel(kernel)
        .output(op)
        .build()
        .unwrap();
    filter
        .apply(ImageView::from_slice(data, width, height).unwrap())
        .unwrap()
        .primary
}

fn separable(
    data: &[u8],
    width: usize,
    height: usize,
    vec_num: usize,
    border: BorderPolicy,
    kernel: LineKernel,
    op: LineOperator,
) -> OwnedImage<u8> {
    let filter = SeparableFilter::<u8>::builder(width, height)
        .vec_num(vec_num)
        .border(border)
        .operator(op)
        .kernel(kernel)
        .build()
        .unwrap();
    filter
        .apply(ImageView::from_slice(data, width, height).unwrap())
        .unwrap()
}

#[test]
fn separable_morphology_equals_two_dimensional() {
    let (w, h) = (24, 15);
    let data = random_image(21, w, h);
    for border in [BorderPolicy::Replicate, BorderPolicy::Constant] {
        for size in [3, 5, 7] {
            for vec_num in [1, 4] {
                for (line_op, op) in [
                    (LineOperator::Erode, Operator::Erode),
                    (LineOperator::Dilate, Operator::Dilate),
                ] {
                    let expected = two_d(
                        &data,
                        w,
                        h,
                        vec_num,
                        border,
                        Kernel::box_filter(size).unwrap(),
                        op,
                    );
                    let got = separable(
                        &data,
                        w,
                        h,
                        vec_num,
                        border,
                        LineKernel::box_filter(size).unwrap(),
                        line_op,
                    );
                    assert_eq!(got, expected, "{} {border:?} k={size} v={vec_num}", op.name());
                }
            }
        }
    }
}

#[test]
fn separable_smoothing_is_within_one_of_two_dimensional() {
    let (w, h) = (32, 12);
    let data = random_image(8, w, h);
    for border in [BorderPolicy::Replicate, BorderPolicy::Constant] {
        for size in [3, 5] {
            let cases = [
                (
                    Kernel::box_filter(size).unwrap(),
                    Operator::Box,
                    LineKernel::box_filter(size).unwrap(),
                    LineOperator::Box,
                ),
                (
                    Kernel::gaussian(size).unwrap(),
                    Operator::Gaussian,
                    LineKernel::gaussian(size).unwrap(),
                    LineOperator::Gaussian,
                ),
            ];
            for (kernel, op, line_kernel, line_op) in cases {
                let expected = two_d(&data, w, h, 8, border, kernel, op);
                let got = separable(&data, w, h, 8, border, line_kernel, line_op);
                for (i, (&a, &b)) in got.data().iter().zip(expected.data()).enumerate() {
                    let diff = (a as i32 - b as i32).abs();
                    assert!(diff <= 1, "{} {border:?} k={size} at {i}: {a} vs {b}", op.name());
                }
            }
        }
    }
}

#[test]
fn separable_undefined_border_passes_input_through() {
    let (w, h) = (16, 9);
    let data = random_image(2, w, h);
    let out = separable(
        &data,
        w,
        h,
        2,
        BorderPolicy::Undefined,
        LineKernel::gaussian(5).unwrap(),
        LineOperator::Gaussian,
    );
    for y in 0..h {
        for x in 0..w {
            if x < 2 || y < 2 || x + 2 >= w || y + 2 >= h {
                assert_eq!(out.data()[y * w + x], data[y * w + x], "({x}, {y})");
            }
        }
    }
}

#[test]
fn separable_streams_report_the_same_counts() {
    let (w, h) = (8, 6);
    let data = random_image(4, w, h);
    let filter = SeparableFilter::<u8>::builder(w, h)
        .vec_num(2)
        .operator(LineOperator::Dilate)
        .kernel(LineKernel::box_filter(3).unwrap())
        .build()
        .unwrap();
    let view = ImageView::from_slice(&data, w, h).unwrap();
    let mut out: Vec<StreamElement<u8>> = Vec::new();
    let stats = filter
        .run(streamfilter::stream::vectorize(view, 2), &mut out)
        .unwrap();
    assert_eq!(stats.consumed, 24);
    assert_eq!(stats.emitted, 24);
    assert!(out[0].is_first);
    assert!(out[23].is_last);
}
