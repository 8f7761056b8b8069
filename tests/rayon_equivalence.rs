#![cfg(feature = "rayon")]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use streamfilter::filter::rayon::{apply_batch_par, apply_pairs_par, apply_separable_par};
use streamfilter::{
    Filter, ImageView, Kernel, LineKernel, LineOperator, Operator, Plane, SeparableFilter,
};

fn frames(count: usize, width: usize, height: usize) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    (0..count)
        .map(|_| (0..width * height).map(|_| rng.random::<u8>()).collect())
        .collect()
}

#[test]
fn parallel_batch_matches_sequential() {
    let (w, h) = (32, 20);
    let data = frames(6, w, h);
    let views: Vec<_> = data
        .iter()
        .map(|d| ImageView::from_slice(d, w, h).unwrap())
        .collect();

    let filter = Filter::<u8, i16>::builder(w, h)
        .vec_num(4)
        .kernel(Kernel::sobel(3).unwrap())
        .output(Operator::DerivativeX)
        .output_plane(Operator::DerivativeY, 1)
        .build()
        .unwrap();

    let parallel = apply_batch_par(&filter, &views).unwrap();
    assert_eq!(parallel.len(), views.len());
    for (view, got) in views.iter().zip(&parallel) {
        let expected = filter.apply(*view).unwrap();
        assert_eq!(got.primary, expected.primary);
        assert_eq!(got.secondary, expected.secondary);
    }
}

#[test]
fn parallel_pairs_match_sequential() {
    let (w, h) = (16, 12);
    let data = frames(4, w, h);
    let views: Vec<_> = data
        .iter()
        .map(|d| ImageView::from_slice(d, w, h).unwrap())
        .collect();
    let pairs: Vec<_> = views.chunks(2).map(|p| (p[0], p[1])).collect();

    let filter = Filter::<u8, u8>::builder(w, h)
        .vec_num(2)
        .kernel_size(3)
        .output(Operator::Box)
        .output(Operator::Forward(Plane::Secondary))
        .build()
        .unwrap();

    let parallel = apply_pairs_par(&filter, &pairs).unwrap();
    for ((a, b), got) in pairs.iter().zip(&parallel) {
        let expected = filter.apply_pair(*a, *b).unwrap();
        assert_eq!(got.primary, expected.primary);
        assert_eq!(got.secondary, expected.secondary);
    }
}

#[test]
fn parallel_separable_matches_sequential() {
    let (w, h) = (24, 18);
    let data = frames(5, w, h);
    let views: Vec<_> = data
        .iter()
        .map(|d| ImageView::from_slice(d, w, h).unwrap())
        .collect();

    let filter = SeparableFilter::<u8>::builder(w, h)
        .vec_num(8)
        .operator(LineOperator::Gaussian)
        .kernel(LineKernel::gaussian(5).unwrap())
        .build()
        .unwrap();

    let parallel = apply_separable_par(&filter, &views).unwrap();
    for (view, got) in views.iter().zip(&parallel) {
        assert_eq!(*got, filter.apply(*view).unwrap());
    }
}
