use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use streamfilter::io::{load_gray_u16, load_gray_u8, save_gray_u16, save_gray_u8};
use streamfilter::stream::{collect_frame, vectorize, StreamElement};
use streamfilter::{
    contrast_square, BorderPolicy, Conversion, Filter, FilterOutput, FilterResult, HessianSource,
    Kernel, LineKernel, LineOperator, Operator, OwnedImage, Pixel, Precision, SeparableFilter,
    StreamStats,
};
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Streamfilter CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum DepthConfig {
    #[default]
    U8,
    U16,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum BorderConfig {
    #[default]
    Replicate,
    Constant,
    Undefined,
}

impl From<BorderConfig> for BorderPolicy {
    fn from(value: BorderConfig) -> Self {
        match value {
            BorderConfig::Replicate => BorderPolicy::Replicate,
            BorderConfig::Constant => BorderPolicy::Constant,
            BorderConfig::Undefined => BorderPolicy::Undefined,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum ConversionConfig {
    #[default]
    Wrap,
    Saturate,
}

impl From<ConversionConfig> for Conversion {
    fn from(value: ConversionConfig) -> Self {
        match value {
            ConversionConfig::Wrap => Conversion::Wrap,
            ConversionConfig::Saturate => Conversion::Saturate,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum OperatorConfig {
    #[default]
    Box,
    Gaussian,
    Erode,
    Dilate,
    Median,
    DerivativeX,
    DerivativeY,
    Convolve,
    NonMaxSuppression,
    SegmentTest,
    Hysteresis,
    OrientedNonMaxSuppression,
    Diffusion,
    Conductivity,
    HessianDeterminant,
}

impl OperatorConfig {
    fn is_signed(self) -> bool {
        matches!(
            self,
            OperatorConfig::DerivativeX | OperatorConfig::DerivativeY | OperatorConfig::HessianDeterminant
        )
    }

    fn line_operator(self) -> Option<LineOperator> {
        match self {
            OperatorConfig::Box => Some(LineOperator::Box),
            OperatorConfig::Gaussian => Some(LineOperator::Gaussian),
            OperatorConfig::Erode => Some(LineOperator::Erode),
            OperatorConfig::Dilate => Some(LineOperator::Dilate),
            _ => None,
        }
    }

    /// Kernel plane read by default: derivative-y uses the vertical plane.
    fn default_plane(self) -> usize {
        match self {
            OperatorConfig::DerivativeY => 1,
            _ => 0,
        }
    }

    fn default_kernel(self) -> KernelConfig {
        match self {
            OperatorConfig::Gaussian => KernelConfig::Gaussian,
            OperatorConfig::DerivativeX | OperatorConfig::DerivativeY => KernelConfig::Sobel,
            OperatorConfig::HessianDeterminant => KernelConfig::ScharrSecondOrder,
            _ => KernelConfig::Box,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum PrecisionConfig {
    LowPower,
    Standard,
    #[default]
    High,
}

impl From<PrecisionConfig> for Precision {
    fn from(value: PrecisionConfig) -> Self {
        match value {
            PrecisionConfig::LowPower => Precision::LowPower,
            PrecisionConfig::Standard => Precision::Standard,
            PrecisionConfig::High => Precision::High,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum KernelConfig {
    Box,
    Gaussian,
    Sobel,
    Scharr,
    ScharrSecondOrder,
    Custom,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
struct ParamsConfig {
    lower: i64,
    upper: i64,
    quantization: u32,
    step: f64,
    contrast: f64,
    precision: PrecisionConfig,
    post_shift: u32,
}

impl Default for ParamsConfig {
    fn default() -> Self {
        Self {
            lower: 64,
            upper: 128,
            quantization: 8,
            step: 1.0,
            contrast: 0.1,
            precision: PrecisionConfig::High,
            post_shift: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
struct RoiConfig {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
struct Config {
    input_path: String,
    secondary_path: Option<String>,
    output_path: Option<String>,
    secondary_output_path: Option<String>,
    depth: DepthConfig,
    operator: OperatorConfig,
    secondary_operator: Option<OperatorConfig>,
    kernel: Option<KernelConfig>,
    kernel_size: usize,
    taps: Vec<i32>,
    dilation: usize,
    plane: Option<usize>,
    secondary_plane: Option<usize>,
    border: BorderConfig,
    conversion: ConversionConfig,
    vec_num: usize,
    output_step: usize,
    separable: bool,
    params: ParamsConfig,
    roi: Option<RoiConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: String::new(),
            secondary_path: None,
            output_path: None,
            secondary_output_path: None,
            depth: DepthConfig::U8,
            operator: OperatorConfig::Box,
            secondary_operator: None,
            kernel: None,
            kernel_size: 3,
            taps: Vec::new(),
            dilation: 1,
            plane: None,
            secondary_plane: None,
            border: BorderConfig::Replicate,
            conversion: ConversionConfig::Wrap,
            vec_num: 1,
            output_step: 0,
            separable: false,
            params: ParamsConfig::default(),
            roi: None,
        }
    }
}

impl Config {
    fn operator(&self, op: OperatorConfig) -> Operator {
        let p = &self.params;
        match op {
            OperatorConfig::Box => Operator::Box,
            OperatorConfig::Gaussian => Operator::Gaussian,
            OperatorConfig::Erode => Operator::Erode,
            OperatorConfig::Dilate => Operator::Dilate,
            OperatorConfig::Median => Operator::Median,
            OperatorConfig::DerivativeX => Operator::DerivativeX,
            OperatorConfig::DerivativeY => Operator::DerivativeY,
            OperatorConfig::Convolve => Operator::Convolve,
            OperatorConfig::NonMaxSuppression => Operator::NonMaxSuppression,
            OperatorConfig::SegmentTest => Operator::SegmentTest,
            OperatorConfig::Hysteresis => Operator::Hysteresis {
                lower: p.lower,
                upper: p.upper,
            },
            OperatorConfig::OrientedNonMaxSuppression => Operator::OrientedNonMaxSuppression {
                quantization: p.quantization,
            },
            OperatorConfig::Diffusion => Operator::Diffusion {
                step: (p.step.max(0.0) * 65536.0).min(u32::MAX as f64) as u32,
            },
            OperatorConfig::Conductivity => Operator::Conductivity {
                contrast_square: contrast_square(p.contrast),
                precision: p.precision.into(),
            },
            // Loaded images are unsigned, so only the intensity source applies.
            OperatorConfig::HessianDeterminant => Operator::HessianDeterminant {
                post_shift: p.post_shift,
                source: HessianSource::Intensity,
            },
        }
    }

    fn kernel(&self) -> FilterResult<Kernel> {
        let size = self.kernel_size;
        let base = match self.kernel.unwrap_or(self.operator.default_kernel()) {
            KernelConfig::Box => Kernel::box_filter(size)?,
            KernelConfig::Gaussian => Kernel::gaussian(size)?,
            KernelConfig::Sobel => Kernel::sobel(size)?,
            KernelConfig::Scharr => Kernel::scharr()?,
            KernelConfig::ScharrSecondOrder => Kernel::scharr_second_order()?,
            KernelConfig::Custom => Kernel::custom(size, self.taps.clone())?,
        };
        if self.dilation > 1 {
            base.dilated(self.dilation)
        } else {
            Ok(base)
        }
    }

    fn line_kernel(&self) -> FilterResult<LineKernel> {
        match self.kernel.unwrap_or(self.operator.default_kernel()) {
            KernelConfig::Gaussian => LineKernel::gaussian(self.kernel_size),
            KernelConfig::Custom => LineKernel::new(self.taps.clone()),
            _ => LineKernel::box_filter(self.kernel_size),
        }
    }
}

/// Grayscale depths the CLI can load and save.
trait Depth: Pixel {
    fn load(path: &str) -> FilterResult<OwnedImage<Self>>;
    fn save(path: &str, img: &OwnedImage<Self>) -> FilterResult<()>;
}

impl Depth for u8 {
    fn load(path: &str) -> FilterResult<OwnedImage<Self>> {
        load_gray_u8(path)
    }

    fn save(path: &str, img: &OwnedImage<Self>) -> FilterResult<()> {
        save_gray_u8(path, img)
    }
}

impl Depth for u16 {
    fn load(path: &str) -> FilterResult<OwnedImage<Self>> {
        load_gray_u16(path)
    }

    fn save(path: &str, img: &OwnedImage<Self>) -> FilterResult<()> {
        save_gray_u16(path, img)
    }
}

#[derive(Debug, Serialize)]
struct PlaneSummary {
    min: i64,
    max: i64,
    mean: f64,
}

impl PlaneSummary {
    fn of<T: Pixel>(data: &[T]) -> Self {
        let values = data.iter().map(|p| p.to_i64());
        let min = values.clone().min().unwrap_or(0);
        let max = values.clone().max().unwrap_or(0);
        let mean = if data.is_empty() {
            0.0
        } else {
            values.sum::<i64>() as f64 / data.len() as f64
        };
        Self { min, max, mean }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    width: usize,
    height: usize,
    operator: &'static str,
    steps: usize,
    consumed: usize,
    emitted: usize,
    primary: PlaneSummary,
    secondary: Option<PlaneSummary>,
}

struct Outcome<T> {
    stats: StreamStats,
    primary: OwnedImage<T>,
    secondary: Option<OwnedImage<T>>,
    summaries: (PlaneSummary, Option<PlaneSummary>),
}

fn load_input<T: Depth>(path: &str, roi: Option<RoiConfig>) -> FilterResult<OwnedImage<T>> {
    let image = T::load(path)?;
    match roi {
        Some(r) => OwnedImage::from_view(image.view().roi(r.x, r.y, r.width, r.height)?),
        None => Ok(image),
    }
}

/// Signed results are stored as magnitudes saturated to the input depth.
fn magnitude<T: Depth>(img: &OwnedImage<i32>) -> FilterResult<OwnedImage<T>> {
    let data = img
        .data()
        .iter()
        .map(|&v| T::from_i64((v as i64).abs(), Conversion::Saturate))
        .collect();
    OwnedImage::from_vec(data, img.width(), img.height())
}

fn process<T: Depth>(config: &Config) -> Result<Outcome<T>, Box<dyn std::error::Error>> {
    let input = load_input::<T>(&config.input_path, config.roi)?;
    let secondary_input = match &config.secondary_path {
        Some(path) => Some(load_input::<T>(path, config.roi)?),
        None => None,
    };
    let (width, height) = (input.width(), input.height());

    if config.separable {
        let operator = config
            .operator
            .line_operator()
            .ok_or("separable mode supports box, gaussian, erode and dilate")?;
        if config.output_step > 0 {
            return Err("separable mode does not support output_step".into());
        }
        let filter = SeparableFilter::<T>::builder(width, height)
            .vec_num(config.vec_num)
            .border(config.border.into())
            .conversion(config.conversion.into())
            .operator(operator)
            .kernel(config.line_kernel()?)
            .build()?;
        let mut out: Vec<StreamElement<T>> = Vec::with_capacity(filter.geometry().vectors());
        let stats = filter.run(vectorize(input.view(), config.vec_num), &mut out)?;
        let primary = collect_frame(out, width, height)?;
        let summary = PlaneSummary::of(primary.data());
        return Ok(Outcome {
            stats,
            primary,
            secondary: None,
            summaries: (summary, None),
        });
    }

    let kernel = config.kernel()?;
    let mut outputs = vec![(
        config.operator,
        config.plane.unwrap_or(config.operator.default_plane()),
    )];
    if let Some(op) = config.secondary_operator {
        outputs.push((op, config.secondary_plane.unwrap_or(op.default_plane())));
    }

    if outputs.iter().any(|(op, _)| op.is_signed()) {
        let mut builder = Filter::<T, i32>::builder(width, height)
            .vec_num(config.vec_num)
            .step(config.output_step)
            .border(config.border.into())
            .conversion(config.conversion.into())
            .kernel(kernel);
        for &(op, plane) in &outputs {
            builder = builder.output_plane(config.operator(op), plane);
        }
        let filter = builder.build()?;
        let (out, stats) = run_filter(&filter, &input, secondary_input.as_ref())?;
        let summaries = (
            PlaneSummary::of(out.primary.data()),
            out.secondary.as_ref().map(|img| PlaneSummary::of(img.data())),
        );
        return Ok(Outcome {
            stats,
            primary: magnitude(&out.primary)?,
            secondary: out.secondary.as_ref().map(magnitude).transpose()?,
            summaries,
        });
    }

    let mut builder = Filter::<T, T>::builder(width, height)
        .vec_num(config.vec_num)
        .step(config.output_step)
        .border(config.border.into())
        .conversion(config.conversion.into())
        .kernel(kernel);
    for &(op, plane) in &outputs {
        builder = builder.output_plane(config.operator(op), plane);
    }
    let filter = builder.build()?;
    let (out, stats) = run_filter(&filter, &input, secondary_input.as_ref())?;
    let summaries = (
        PlaneSummary::of(out.primary.data()),
        out.secondary.as_ref().map(|img| PlaneSummary::of(img.data())),
    );
    Ok(Outcome {
        stats,
        primary: out.primary,
        secondary: out.secondary,
        summaries,
    })
}

fn run_filter<I: Pixel, O: Pixel>(
    filter: &Filter<I, O>,
    input: &OwnedImage<I>,
    secondary: Option<&OwnedImage<I>>,
) -> FilterResult<(FilterOutput<O>, StreamStats)> {
    let vec_num = filter.geometry().vec_num();
    let (width, height) = (filter.output_width(), filter.output_height());
    let mut first: Vec<StreamElement<O>> = Vec::with_capacity(filter.output_vectors());
    let mut second: Vec<StreamElement<O>> = Vec::new();
    let stats = filter.run_with(
        vectorize(input.view(), vec_num),
        secondary.map(|img| vectorize(img.view(), vec_num)),
        &mut first,
        &mut second,
    )?;
    let secondary = if filter.outputs().len() > 1 {
        Some(collect_frame(second, width, height)?)
    } else {
        None
    };
    Ok((
        FilterOutput {
            primary: collect_frame(first, width, height)?,
            secondary,
        },
        stats,
    ))
}

fn finish<T: Depth>(config: &Config, outcome: Outcome<T>) -> Result<Report, Box<dyn std::error::Error>> {
    if let Some(path) = &config.output_path {
        T::save(path, &outcome.primary)?;
    }
    if let (Some(path), Some(img)) = (&config.secondary_output_path, &outcome.secondary) {
        T::save(path, img)?;
    }
    let (primary, secondary) = outcome.summaries;
    Ok(Report {
        width: outcome.primary.width(),
        height: outcome.primary.height(),
        operator: config.operator(config.operator).name(),
        steps: outcome.stats.steps,
        consumed: outcome.stats.consumed,
        emitted: outcome.stats.emitted,
        primary,
        secondary,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("streamfilter=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.input_path.is_empty() {
        return Err("input_path must be set in the config".into());
    }

    let report = match config.depth {
        DepthConfig::U8 => finish(&config, process::<u8>(&config)?)?,
        DepthConfig::U16 => finish(&config, process::<u16>(&config)?)?,
    };
    tracing::info!(
        operator = report.operator,
        steps = report.steps,
        emitted = report.emitted,
        "filter finished"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Config, KernelConfig, OperatorConfig};
    use streamfilter::{BorderPolicy, Operator};

    #[test]
    fn example_config_parses() {
        let config: Config = serde_json::from_str(super::EXAMPLE_JSON).unwrap();
        assert!(!config.input_path.is_empty());
        assert!(config.kernel().is_ok());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: Config = serde_json::from_str(r#"{"input_path": "a.png"}"#).unwrap();
        assert_eq!(config.kernel_size, 3);
        assert_eq!(config.vec_num, 1);
        assert_eq!(BorderPolicy::from(config.border), BorderPolicy::Replicate);
        assert_eq!(config.operator(config.operator), Operator::Box);
    }

    #[test]
    fn hysteresis_params_map_to_operator() {
        let config: Config = serde_json::from_str(
            r#"{"input_path": "a.png", "operator": "hysteresis", "params": {"lower": 10, "upper": 90}}"#,
        )
        .unwrap();
        assert_eq!(
            config.operator(config.operator),
            Operator::Hysteresis { lower: 10, upper: 90 }
        );
    }

    #[test]
    fn conductivity_precision_and_step_are_configurable() {
        let config: Config = serde_json::from_str(
            r#"{"input_path": "a.png", "operator": "conductivity", "output_step": 1,
                "params": {"contrast": 0.5, "precision": "low_power"}}"#,
        )
        .unwrap();
        assert_eq!(config.output_step, 1);
        assert_eq!(
            config.operator(config.operator),
            Operator::Conductivity {
                contrast_square: streamfilter::contrast_square(0.5),
                precision: streamfilter::Precision::LowPower,
            }
        );
    }

    #[test]
    fn derivatives_default_to_sobel() {
        assert_eq!(OperatorConfig::DerivativeX.default_kernel(), KernelConfig::Sobel);
        let config: Config =
            serde_json::from_str(r#"{"input_path": "a.png", "operator": "derivative_y", "kernel_size": 5}"#)
                .unwrap();
        let kernel = config.kernel().unwrap();
        assert_eq!(kernel.size(), 5);
        assert_eq!(kernel.plane_count(), 2);
    }
}
