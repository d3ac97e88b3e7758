use icc::{IccError, IccProfile, MatrixBasedTransformTosRgb, MonochromeTransformTosRgb};
use jp2::{BitDepth, ColourSpecification, EnumeratedColourSpace};
use jpc::DataKind;
use log::{debug, info, warn};
use std::error;
use std::fmt;

/// Error values that may be returned from the colour pipeline.
#[derive(Debug, PartialEq)]
pub enum ColourError {
    /// The enumerated colourspace is not one the pipeline can map.
    UnknownColourSpace,

    /// The colour space does not define a mapping for this many components.
    UnsupportedComponentCount {
        colour_space: &'static str,
        count: usize,
    },

    /// The sample planes do not agree with each other or with the components.
    SampleMismatch { reason: &'static str },

    /// The component precision cannot be mapped with 32-bit samples, or is
    /// too wide for an ICC lookup table.
    UnsupportedBitDepth { bits: u8, fixed_point: u8 },

    /// The embedded ICC profile could not be used.
    Icc(IccError),
}

impl error::Error for ColourError {}
impl fmt::Display for ColourError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnknownColourSpace => write!(f, "unknown colour space"),
            Self::UnsupportedComponentCount {
                colour_space,
                count,
            } => write!(
                f,
                "{} colour space does not support {} components",
                colour_space, count
            ),
            Self::SampleMismatch { reason } => write!(f, "sample mismatch: {}", reason),
            Self::UnsupportedBitDepth { bits, fixed_point } => write!(
                f,
                "unsupported bit depth {} with {} fractional bits",
                bits, fixed_point
            ),
            Self::Icc(err) => write!(f, "ICC profile: {}", err),
        }
    }
}

impl From<IccError> for ColourError {
    fn from(err: IccError) -> ColourError {
        ColourError::Icc(err)
    }
}

/// Widest nominal range whose level shifted samples fit an `i32`.
pub const MAX_NOMINAL_RANGE_BITS: u8 = 30;

/// Widest nominal range an ICC transform builds lookup tables for.
pub const MAX_ICC_NOMINAL_RANGE_BITS: u8 = 16;

/// Description of one decoded image component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentInfo {
    /// Nominal range of the samples, in bits.
    pub nominal_range_bits: u8,

    /// Fractional bits of the fixed point representation, 0 for plain
    /// integers.
    pub fixed_point: u8,

    pub is_signed: bool,
}

impl ComponentInfo {
    pub fn new(nominal_range_bits: u8, fixed_point: u8, is_signed: bool) -> ComponentInfo {
        ComponentInfo {
            nominal_range_bits,
            fixed_point,
            is_signed,
        }
    }

    /// Integer component described by a JP2 bit depth.
    pub fn from_bit_depth(depth: BitDepth) -> ComponentInfo {
        ComponentInfo::new(depth.value(), 0, depth.is_signed())
    }

    fn check(&self, max_bits: u8) -> Result<(), ColourError> {
        if (1..=max_bits).contains(&self.nominal_range_bits) && self.fixed_point < 31 {
            Ok(())
        } else {
            Err(ColourError::UnsupportedBitDepth {
                bits: self.nominal_range_bits,
                fixed_point: self.fixed_point,
            })
        }
    }

    // Only valid once `check` has passed.
    fn shift(&self) -> i32 {
        1 << (self.nominal_range_bits - 1)
    }

    fn max_value(&self) -> i32 {
        (1 << self.nominal_range_bits) - 1
    }

    fn to_unsigned_int(&self, sample: i32) -> i32 {
        (sample >> self.fixed_point)
            .saturating_add(self.shift())
            .clamp(0, self.max_value())
    }

    fn to_unsigned_float(&self, sample: f32) -> f32 {
        (sample / (1i32 << self.fixed_point) as f32 + self.shift() as f32)
            .clamp(0.0, self.max_value() as f32)
    }
}

/// Samples of one component plane.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentSamples {
    Int(Vec<i32>),
    Float(Vec<f32>),
}

impl ComponentSamples {
    pub fn len(&self) -> usize {
        match self {
            Self::Int(samples) => samples.len(),
            Self::Float(samples) => samples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> DataKind {
        match self {
            Self::Int(_) => DataKind::Int,
            Self::Float(_) => DataKind::Float,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Mapping {
    Identity,
    Sycc,
    EsRgb,
    Monochrome(MonochromeTransformTosRgb),
    Matrix(MatrixBasedTransformTosRgb),
}

/// Mapping from decoded component samples to sRGB.
///
/// Chosen once from the colour specification of a JP2 file, then applied to
/// any number of tiles or images with the same components.
#[derive(Debug, Clone, PartialEq)]
pub struct ColourTransform {
    mapping: Mapping,
    components: Vec<ComponentInfo>,
}

impl ColourTransform {
    pub fn new(
        specification: &ColourSpecification,
        components: &[ComponentInfo],
    ) -> Result<ColourTransform, ColourError> {
        for component in components {
            component.check(MAX_NOMINAL_RANGE_BITS)?;
        }

        let count = components.len();
        let mapping = match specification {
            ColourSpecification::Enumerated(colour_space) => match colour_space {
                EnumeratedColourSpace::sRGB | EnumeratedColourSpace::GreyScale => {
                    Mapping::Identity
                }
                EnumeratedColourSpace::sYCC => match count {
                    1 => Mapping::Identity,
                    3 => Mapping::Sycc,
                    _ => {
                        return Err(ColourError::UnsupportedComponentCount {
                            colour_space: "sYCC",
                            count,
                        })
                    }
                },
                EnumeratedColourSpace::esRGB => match count {
                    1 | 3 => Mapping::EsRgb,
                    _ => {
                        return Err(ColourError::UnsupportedComponentCount {
                            colour_space: "e-sRGB",
                            count,
                        })
                    }
                },
                EnumeratedColourSpace::Unknown => return Err(ColourError::UnknownColourSpace),
            },
            ColourSpecification::IccProfiled(data) => icc_mapping(data, components)?,
        };

        info!(
            "Colour transform {} for {} components",
            mapping_name(&mapping),
            count
        );
        Ok(ColourTransform {
            mapping,
            components: components.to_vec(),
        })
    }

    pub fn components(&self) -> &[ComponentInfo] {
        &self.components
    }

    pub fn is_identity(&self) -> bool {
        self.mapping == Mapping::Identity
    }

    /// Map one set of component planes.
    ///
    /// There must be one plane per component, all of the same kind and length.
    pub fn apply(
        &self,
        planes: &[ComponentSamples],
    ) -> Result<Vec<ComponentSamples>, ColourError> {
        self.check(planes)?;

        match &self.mapping {
            Mapping::Identity => Ok(planes.to_vec()),
            Mapping::Sycc => Ok(sycc_to_rgb(planes)),
            Mapping::EsRgb => Ok(planes
                .iter()
                .zip(&self.components)
                .map(|(plane, component)| esrgb_to_srgb(plane, component))
                .collect()),
            Mapping::Monochrome(transform) => {
                let component = &self.components[0];
                let out = match &planes[0] {
                    ComponentSamples::Int(samples) => {
                        let input: Vec<i32> = samples
                            .iter()
                            .map(|v| component.to_unsigned_int(*v))
                            .collect();
                        ComponentSamples::Int(transform.apply_int(&input))
                    }
                    ComponentSamples::Float(samples) => {
                        let input: Vec<f32> = samples
                            .iter()
                            .map(|v| component.to_unsigned_float(*v))
                            .collect();
                        ComponentSamples::Float(transform.apply_float(&input))
                    }
                };
                Ok(vec![out])
            }
            Mapping::Matrix(transform) => {
                if planes[0].kind() == DataKind::Int {
                    let input = self.unsigned_int_planes(planes);
                    let [r, g, b] = transform.apply_int([&input[0], &input[1], &input[2]]);
                    Ok(vec![
                        ComponentSamples::Int(r),
                        ComponentSamples::Int(g),
                        ComponentSamples::Int(b),
                    ])
                } else {
                    let input = self.unsigned_float_planes(planes);
                    let [r, g, b] = transform.apply_float([&input[0], &input[1], &input[2]]);
                    Ok(vec![
                        ComponentSamples::Float(r),
                        ComponentSamples::Float(g),
                        ComponentSamples::Float(b),
                    ])
                }
            }
        }
    }

    fn check(&self, planes: &[ComponentSamples]) -> Result<(), ColourError> {
        if planes.len() != self.components.len() {
            return Err(ColourError::SampleMismatch {
                reason: "one plane per component is required",
            });
        }
        if let Some(first) = planes.first() {
            for plane in &planes[1..] {
                if plane.kind() != first.kind() {
                    return Err(ColourError::SampleMismatch {
                        reason: "planes mix integer and float samples",
                    });
                }
                if plane.len() != first.len() {
                    return Err(ColourError::SampleMismatch {
                        reason: "planes differ in length",
                    });
                }
            }
        }
        Ok(())
    }

    fn unsigned_int_planes(&self, planes: &[ComponentSamples]) -> Vec<Vec<i32>> {
        planes
            .iter()
            .zip(&self.components)
            .map(|(plane, component)| match plane {
                ComponentSamples::Int(samples) => samples
                    .iter()
                    .map(|v| component.to_unsigned_int(*v))
                    .collect(),
                ComponentSamples::Float(_) => vec![],
            })
            .collect()
    }

    fn unsigned_float_planes(&self, planes: &[ComponentSamples]) -> Vec<Vec<f32>> {
        planes
            .iter()
            .zip(&self.components)
            .map(|(plane, component)| match plane {
                ComponentSamples::Float(samples) => samples
                    .iter()
                    .map(|v| component.to_unsigned_float(*v))
                    .collect(),
                ComponentSamples::Int(_) => vec![],
            })
            .collect()
    }
}

fn mapping_name(mapping: &Mapping) -> &'static str {
    match mapping {
        Mapping::Identity => "identity",
        Mapping::Sycc => "sYCC",
        Mapping::EsRgb => "e-sRGB",
        Mapping::Monochrome(_) => "ICC monochrome",
        Mapping::Matrix(_) => "ICC matrix",
    }
}

fn icc_mapping(data: &[u8], components: &[ComponentInfo]) -> Result<Mapping, ColourError> {
    let profile = IccProfile::decode(data)?;
    let restricted = profile.restricted()?;
    debug!(
        "Restricted ICC profile with {} components",
        restricted.num_components()
    );

    for component in components {
        component.check(MAX_ICC_NOMINAL_RANGE_BITS)?;
    }
    if components.iter().any(|c| c.is_signed) {
        warn!("ICC profile applied to signed components");
    }

    match components {
        [gray] => Ok(Mapping::Monochrome(MonochromeTransformTosRgb::new(
            &restricted,
            gray.max_value(),
            gray.shift(),
        )?)),
        [r, g, b] => Ok(Mapping::Matrix(MatrixBasedTransformTosRgb::new(
            &restricted,
            [r.max_value(), g.max_value(), b.max_value()],
            [r.shift(), g.shift(), b.shift()],
        )?)),
        _ => Err(ColourError::UnsupportedComponentCount {
            colour_space: "ICC profiled",
            count: components.len(),
        }),
    }
}

// YCbCr to RGB, Rec. 601 weights
const CR_TO_R: f64 = 1.402;
const CB_TO_G: f64 = -0.34413;
const CR_TO_G: f64 = -0.71414;
const CB_TO_B: f64 = 1.772;

fn sycc_to_rgb(planes: &[ComponentSamples]) -> Vec<ComponentSamples> {
    match (&planes[0], &planes[1], &planes[2]) {
        (ComponentSamples::Int(y), ComponentSamples::Int(cb), ComponentSamples::Int(cr)) => {
            let (mut r, mut g, mut b) = (vec![], vec![], vec![]);
            for ((y, cb), cr) in y.iter().zip(cb).zip(cr) {
                let (y, cb, cr) = (*y as f64, *cb as f64, *cr as f64);
                r.push((y + CR_TO_R * cr) as i32);
                g.push((y + CB_TO_G * cb + CR_TO_G * cr) as i32);
                b.push((y + CB_TO_B * cb) as i32);
            }
            vec![
                ComponentSamples::Int(r),
                ComponentSamples::Int(g),
                ComponentSamples::Int(b),
            ]
        }
        (ComponentSamples::Float(y), ComponentSamples::Float(cb), ComponentSamples::Float(cr)) => {
            let (mut r, mut g, mut b) = (vec![], vec![], vec![]);
            for ((y, cb), cr) in y.iter().zip(cb).zip(cr) {
                let (y, cb, cr) = (*y as f64, *cb as f64, *cr as f64);
                r.push((y + CR_TO_R * cr) as f32);
                g.push((y + CB_TO_G * cb + CR_TO_G * cr) as f32);
                b.push((y + CB_TO_B * cb) as f32);
            }
            vec![
                ComponentSamples::Float(r),
                ComponentSamples::Float(g),
                ComponentSamples::Float(b),
            ]
        }
        // kinds are checked before mapping
        _ => planes.to_vec(),
    }
}

fn esrgb_to_srgb(plane: &ComponentSamples, component: &ComponentInfo) -> ComponentSamples {
    match plane {
        ComponentSamples::Int(samples) => {
            let colours = 2f64.powi(component.nominal_range_bits as i32);
            let half = (colours / 2.0) as i64;
            let offset = (colours * 0.375) as i64;
            ComponentSamples::Int(
                samples
                    .iter()
                    .map(|v| {
                        ((i64::from(*v) + half - offset) * 2 - half)
                            .clamp(i64::from(i32::MIN), i64::from(i32::MAX))
                            as i32
                    })
                    .collect(),
            )
        }
        ComponentSamples::Float(_) => {
            warn!("e-sRGB mapping of float samples is not supported, passed through");
            plane.clone()
        }
    }
}
