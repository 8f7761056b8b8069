use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use streamfilter::stream::vectorize;
use streamfilter::{
    Filter, ImageView, Kernel, LineKernel, LineOperator, Operator, Pipeline, SeparableFilter,
    StreamElement,
};

fn make_image(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF;
            data.push(value as u8);
        }
    }
    data
}

fn bench_filters(c: &mut Criterion) {
    let width = 320;
    let height = 240;
    let image = make_image(width, height);
    let view = ImageView::from_slice(&image, width, height).unwrap();

    for vec_num in [1, 8] {
        let box5 = Filter::<u8, u8>::builder(width, height)
            .vec_num(vec_num)
            .kernel_size(5)
            .output(Operator::Box)
            .build()
            .unwrap();
        c.bench_function(&format!("box5_v{vec_num}"), |b| {
            b.iter(|| black_box(box5.apply(view).unwrap()));
        });
    }

    let gaussian = Filter::<u8, u8>::builder(width, height)
        .vec_num(4)
        .kernel(Kernel::gaussian(7).unwrap())
        .output(Operator::Gaussian)
        .build()
        .unwrap();
    c.bench_function("gaussian7_v4", |b| {
        b.iter(|| black_box(gaussian.apply(view).unwrap()));
    });

    let median = Filter::<u8, u8>::builder(width, height)
        .vec_num(4)
        .kernel_size(3)
        .output(Operator::Median)
        .build()
        .unwrap();
    c.bench_function("median3_v4", |b| {
        b.iter(|| black_box(median.apply(view).unwrap()));
    });

    let sobel = Filter::<u8, i16>::builder(width, height)
        .vec_num(4)
        .kernel(Kernel::sobel(3).unwrap())
        .output(Operator::DerivativeX)
        .output_plane(Operator::DerivativeY, 1)
        .build()
        .unwrap();
    c.bench_function("sobel3_pair_v4", |b| {
        b.iter(|| black_box(sobel.apply(view).unwrap()));
    });

    let separable = SeparableFilter::<u8>::builder(width, height)
        .vec_num(4)
        .operator(LineOperator::Gaussian)
        .kernel(LineKernel::gaussian(7).unwrap())
        .build()
        .unwrap();
    c.bench_function("separable_gaussian7_v4", |b| {
        b.iter(|| black_box(separable.apply(view).unwrap()));
    });

    let pipeline = Pipeline::<u8>::new(64)
        .stage(&gaussian)
        .stage(&separable)
        .stage(&median);
    c.bench_function("pipeline_three_stages_v4", |b| {
        b.iter(|| {
            let mut out: Vec<StreamElement<u8>> = Vec::with_capacity(width * height / 4);
            pipeline.run(vectorize(view, 4), &mut out).unwrap();
            black_box(out)
        });
    });
}

criterion_group!(benches, bench_filters);
criterion_main!(benches);
