use streamfilter::{
    BorderPolicy, Filter, FilterError, ImageView, Kernel, LineKernel, Normalization, Operator,
    OwnedImage,
};

#[test]
fn image_view_rejects_invalid_dimensions() {
    let data = [0u8; 4];

    let err = ImageView::from_slice(&data, 0, 1).err().unwrap();
    assert_eq!(
        err,
        FilterError::InvalidDimensions {
            width: 0,
            height: 1,
        }
    );

    let err = ImageView::from_slice(&data, 1, 0).err().unwrap();
    assert_eq!(
        err,
        FilterError::InvalidDimensions {
            width: 1,
            height: 0,
        }
    );
}

#[test]
fn image_view_rejects_invalid_stride() {
    let data = [0u8; 8];

    let err = ImageView::new(&data, 4, 1, 3).err().unwrap();
    assert_eq!(
        err,
        FilterError::InvalidStride {
            width: 4,
            stride: 3,
        }
    );
}

#[test]
fn image_view_rejects_small_buffer() {
    let data = [0u16; 3];

    let err = ImageView::new(&data, 2, 2, 2).err().unwrap();
    assert_eq!(err, FilterError::BufferTooSmall { needed: 4, got: 3 });
}

#[test]
fn roi_copies_into_contiguous_image() {
    let data: Vec<u8> = (0u8..16).collect();
    let view = ImageView::from_slice(&data, 4, 4).unwrap();
    let roi = view.roi(1, 1, 2, 2).unwrap();
    assert_eq!(roi.stride(), 4);

    let owned = OwnedImage::from_view(roi).unwrap();
    assert_eq!(owned.data(), &[5u8, 6, 9, 10]);
    assert_eq!(owned.view().stride(), 2);
    assert!(view.roi(3, 3, 2, 2).is_err());
}

#[test]
fn nine_tap_normalization_matches_reference_pair() {
    let norm = Normalization::from_sum(9).unwrap();
    assert_eq!(norm, Normalization { mult: 58254, shift: 19 });
    assert_eq!(Kernel::box_filter(3).unwrap().normalization(), norm);
    assert_eq!(
        Kernel::gaussian(3).unwrap().normalization(),
        Normalization { mult: 1, shift: 4 }
    );
}

#[test]
fn kernel_constructors_validate_shape() {
    assert_eq!(
        Kernel::box_filter(4).err().unwrap(),
        FilterError::InvalidKernelSize { size: 4 }
    );
    assert_eq!(
        Kernel::custom(3, vec![1; 8]).err().unwrap(),
        FilterError::KernelShape { expected: 9, got: 8 }
    );
    assert_eq!(
        Kernel::custom(3, vec![0; 9]).err().unwrap(),
        FilterError::DegenerateKernel {
            reason: "kernel weight sum is zero"
        }
    );
    assert_eq!(
        LineKernel::new(vec![1, 70000, 1]).err().unwrap(),
        FilterError::CoefficientOutOfRange { value: 70000 }
    );
}

#[test]
fn builder_rejects_unsupported_operator_geometry() {
    let err = Filter::<u8, u8>::builder(16, 16)
        .kernel_size(5)
        .output(Operator::SegmentTest)
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, FilterError::UnsupportedOperator { operator: "segment_test", .. }));

    let err = Filter::<u8, u8>::builder(16, 16)
        .kernel_size(5)
        .output(Operator::OrientedNonMaxSuppression { quantization: 8 })
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, FilterError::UnsupportedOperator { .. }));

    let err = Filter::<u8, u8>::builder(16, 16)
        .kernel_size(3)
        .output(Operator::Hysteresis { lower: 10, upper: 5 })
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, FilterError::UnsupportedOperator { operator: "hysteresis", .. }));
}

#[test]
fn builder_rejects_bad_stream_geometry() {
    let err = Filter::<u8, u8>::builder(10, 4)
        .vec_num(4)
        .kernel_size(3)
        .output(Operator::Box)
        .build()
        .err()
        .unwrap();
    assert_eq!(err, FilterError::WidthNotVectorAligned { width: 10, vec_num: 4 });

    let err = Filter::<u8, u8>::builder(8, 4)
        .vec_num(3)
        .kernel_size(3)
        .output(Operator::Box)
        .build()
        .err()
        .unwrap();
    assert_eq!(err, FilterError::InvalidVectorWidth { vec_num: 3 });
}

#[test]
fn diffusion_requires_matching_output_type() {
    let err = Filter::<u8, u16>::builder(8, 8)
        .kernel_size(3)
        .output(Operator::Diffusion { step: 1 << 16 })
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, FilterError::UnsupportedPixelType { operator: "diffusion", .. }));
}

#[test]
fn dilated_kernels_only_for_weighted_operators() {
    let dilated = Kernel::gaussian(3).unwrap().dilated(2).unwrap();
    assert_eq!(dilated.size(), 5);

    let ok = Filter::<u8, u8>::builder(16, 16)
        .kernel(dilated.clone())
        .output(Operator::Gaussian)
        .build();
    assert!(ok.is_ok());

    let err = Filter::<u8, u8>::builder(16, 16)
        .kernel(dilated)
        .output(Operator::Median)
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, FilterError::UnsupportedOperator { operator: "median", .. }));
}

#[test]
fn border_policy_defaults_to_replicate() {
    assert_eq!(BorderPolicy::default(), BorderPolicy::Replicate);
}

#[test]
fn lowlevel_parts_assemble_a_custom_row_pass() {
    use streamfilter::lowlevel::{binomial, outer, sort_network, Geometry, SlidingWindow};

    let row = binomial(5);
    assert_eq!(
        Kernel::gaussian(5).unwrap().plane(0).unwrap(),
        outer(&row, &row).as_slice()
    );

    let mut values = vec![5, -2, 9, 0, 3];
    sort_network(&mut values);
    assert_eq!(values, vec![-2, 0, 3, 5, 9]);

    // One image row through a 1-row window; lane 0 sees the 3 taps of output x.
    let geometry = Geometry::new(4, 1, 3, 1).unwrap();
    let mut window = SlidingWindow::<u8>::new(1, &geometry);
    let pixels = [4u8, 8, 15, 16];
    let mut maxima = Vec::new();
    for x in 0..geometry.vec_cols() + geometry.overhead() {
        let group = [pixels.get(x).copied().unwrap_or(0)];
        window.shift_and_refill(&group, x, geometry.vec_cols(), BorderPolicy::Replicate);
        if x >= geometry.overhead() {
            maxima.push(*window.row(0)[..3].iter().max().unwrap());
        }
    }
    assert_eq!(maxima, vec![8, 15, 16, 16]);
}
