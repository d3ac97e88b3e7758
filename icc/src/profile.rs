use log::{debug, warn};

use crate::header::{
    IccProfileHeader, XyzNumber, ICC_HEADER_LENGTH, PROFILE_CLASS_DISPLAY, PROFILE_CLASS_INPUT,
    PROFILE_CONNECTION_SPACE_XYZ,
};
use crate::tags::{
    CurveType, TagTable, TAG_BLUE_COLORANT, TAG_BLUE_TRC, TAG_GRAY_TRC, TAG_GREEN_COLORANT,
    TAG_GREEN_TRC, TAG_RED_COLORANT, TAG_RED_TRC,
};
use crate::IccError;

/// A decoded ICC profile, header and tags.
#[derive(Debug, Clone, PartialEq)]
pub struct IccProfile {
    header: IccProfileHeader,
    tags: TagTable,
}

impl IccProfile {
    pub fn new(header: IccProfileHeader, tags: TagTable) -> IccProfile {
        IccProfile { header, tags }
    }

    /// Decode and validate a profile as found in a Colour Specification box.
    ///
    /// The declared size must fit in `data`, the profile class must be input
    /// or display and the connection space must be XYZ. Bytes past the
    /// declared size are ignored.
    pub fn decode(data: &[u8]) -> Result<IccProfile, IccError> {
        let header = IccProfileHeader::decode(data)?;

        let size = header.size() as usize;
        if size > data.len() {
            return Err(IccError::Truncated {
                expected: size,
                available: data.len(),
            });
        }
        if size < ICC_HEADER_LENGTH {
            return Err(IccError::Truncated {
                expected: ICC_HEADER_LENGTH,
                available: size,
            });
        }

        match header.profile_class() {
            PROFILE_CLASS_INPUT => {}
            PROFILE_CLASS_DISPLAY => {
                warn!("ICC profile has display device class, treating it as an input profile")
            }
            class => return Err(IccError::InvalidProfileClass { class }),
        }

        if header.pcs() != PROFILE_CONNECTION_SPACE_XYZ {
            return Err(IccError::InvalidPcs { pcs: header.pcs() });
        }

        let tags = TagTable::decode(&data[..size])?;
        debug!("ICC profile with {} tags", tags.len());

        Ok(IccProfile { header, tags })
    }

    /// Encode the profile, the header size field is set to the encoded length.
    pub fn encode(&self) -> Vec<u8> {
        let table = self.tags.encode();
        let mut header = self.header.clone();
        header.set_size((ICC_HEADER_LENGTH + table.len()) as u32);

        let mut out = Vec::with_capacity(ICC_HEADER_LENGTH + table.len());
        out.extend_from_slice(&header.encode());
        out.extend(table);
        out
    }

    pub fn header(&self) -> &IccProfileHeader {
        &self.header
    }

    pub fn tags(&self) -> &TagTable {
        &self.tags
    }

    pub fn is_display_class(&self) -> bool {
        self.header.profile_class() == PROFILE_CLASS_DISPLAY
    }

    /// Reduce the profile to the curves and colorants a restricted profile
    /// is made of.
    ///
    /// A gray TRC makes a monochrome profile even when colour tags are
    /// present as well.
    pub fn restricted(&self) -> Result<RestrictedIccProfile, IccError> {
        if self.tags.contains(TAG_GRAY_TRC) {
            return Ok(RestrictedIccProfile::Monochrome {
                gray_trc: self.tags.curve(TAG_GRAY_TRC)?.clone(),
            });
        }

        if self.tags.contains(TAG_RED_TRC) {
            let trc = [
                self.tags.curve(TAG_RED_TRC)?.clone(),
                self.tags.curve(TAG_GREEN_TRC)?.clone(),
                self.tags.curve(TAG_BLUE_TRC)?.clone(),
            ];
            let colorants = [
                self.tags.xyz(TAG_RED_COLORANT)?,
                self.tags.xyz(TAG_GREEN_COLORANT)?,
                self.tags.xyz(TAG_BLUE_COLORANT)?,
            ];
            return Ok(RestrictedIccProfile::ThreeComponentMatrix { trc, colorants });
        }

        Err(IccError::MissingCurveData)
    }
}

/// The data of a Monochrome Input or Three-Component Matrix-Based Input
/// profile.
#[derive(Debug, Clone, PartialEq)]
pub enum RestrictedIccProfile {
    Monochrome {
        gray_trc: CurveType,
    },
    ThreeComponentMatrix {
        /// Red, green and blue TRCs.
        trc: [CurveType; 3],
        /// Red, green and blue colorants.
        colorants: [XyzNumber; 3],
    },
}

impl RestrictedIccProfile {
    pub fn is_monochrome(&self) -> bool {
        matches!(self, RestrictedIccProfile::Monochrome { .. })
    }

    /// Number of colour channels the profile describes.
    pub fn num_components(&self) -> usize {
        match self {
            RestrictedIccProfile::Monochrome { .. } => 1,
            RestrictedIccProfile::ThreeComponentMatrix { .. } => 3,
        }
    }

    /// Colorants as a matrix from linear RGB to PCS XYZ.
    ///
    /// Rows are X, Y and Z, columns red, green and blue.
    pub fn colorant_matrix(&self) -> Option<[[f64; 3]; 3]> {
        match self {
            RestrictedIccProfile::Monochrome { .. } => None,
            RestrictedIccProfile::ThreeComponentMatrix { colorants, .. } => Some([
                [
                    colorants[0].x_f64(),
                    colorants[1].x_f64(),
                    colorants[2].x_f64(),
                ],
                [
                    colorants[0].y_f64(),
                    colorants[1].y_f64(),
                    colorants[2].y_f64(),
                ],
                [
                    colorants[0].z_f64(),
                    colorants[1].z_f64(),
                    colorants[2].z_f64(),
                ],
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{Tag, XyzType};
    use crate::tests::init_logger;

    fn gray_profile() -> IccProfile {
        let mut header = IccProfileHeader::default();
        header.set_colour_space(*b"GRAY");
        let mut tags = TagTable::new();
        tags.insert(TAG_GRAY_TRC, Tag::Curve(CurveType::gamma(2.2)));
        IccProfile::new(header, tags)
    }

    fn rgb_profile() -> IccProfile {
        let mut tags = TagTable::new();
        for (trc, colorant, xyz) in [
            (TAG_RED_TRC, TAG_RED_COLORANT, XyzNumber::new(0x6FA2, 0x38F5, 0x0390)),
            (TAG_GREEN_TRC, TAG_GREEN_COLORANT, XyzNumber::new(0x6299, 0xB785, 0x18DA)),
            (TAG_BLUE_TRC, TAG_BLUE_COLORANT, XyzNumber::new(0x24A0, 0x0F84, 0xB6CF)),
        ] {
            tags.insert(trc, Tag::Curve(CurveType::new(vec![])));
            tags.insert(colorant, Tag::Xyz(XyzType::new(vec![xyz])));
        }
        IccProfile::new(IccProfileHeader::default(), tags)
    }

    #[test]
    fn test_encode_sets_size() {
        let encoded = gray_profile().encode();
        assert_eq!(
            u32::from_be_bytes([encoded[0], encoded[1], encoded[2], encoded[3]]) as usize,
            encoded.len()
        );
        // header + count + one entry + 14 byte curve padded to 16
        assert_eq!(encoded.len(), 128 + 4 + 12 + 16);
    }

    #[test]
    fn test_decode_encode_stable() {
        init_logger();
        let encoded = rgb_profile().encode();
        let decoded = IccProfile::decode(&encoded).unwrap();
        assert_eq!(decoded.encode(), encoded);
        assert_eq!(decoded.tags().len(), 6);
    }

    #[test]
    fn test_declared_size_exceeds_data() {
        let encoded = gray_profile().encode();
        let length = encoded.len();
        assert_eq!(
            IccProfile::decode(&encoded[..length - 4]),
            Err(IccError::Truncated {
                expected: length,
                available: length - 4
            })
        );
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut encoded = gray_profile().encode();
        encoded.extend_from_slice(&[0xAA; 7]);
        assert!(IccProfile::decode(&encoded).is_ok());
    }

    #[test]
    fn test_profile_class() {
        init_logger();
        let mut profile = gray_profile();
        profile.header.set_profile_class(PROFILE_CLASS_DISPLAY);
        let decoded = IccProfile::decode(&profile.encode()).unwrap();
        assert!(decoded.is_display_class());

        profile.header.set_profile_class(*b"prtr");
        assert_eq!(
            IccProfile::decode(&profile.encode()),
            Err(IccError::InvalidProfileClass { class: *b"prtr" })
        );
    }

    #[test]
    fn test_lab_pcs_rejected() {
        let mut profile = gray_profile();
        profile.header.set_pcs(*b"Lab ");
        assert_eq!(
            IccProfile::decode(&profile.encode()),
            Err(IccError::InvalidPcs { pcs: *b"Lab " })
        );
    }

    #[test]
    fn test_restricted_monochrome() {
        let restricted = gray_profile().restricted().unwrap();
        assert!(restricted.is_monochrome());
        assert_eq!(restricted.num_components(), 1);
        assert_eq!(restricted.colorant_matrix(), None);
    }

    #[test]
    fn test_restricted_matrix() {
        let restricted = rgb_profile().restricted().unwrap();
        assert_eq!(restricted.num_components(), 3);
        let matrix = restricted.colorant_matrix().unwrap();
        assert_eq!(matrix[0][0], 0x6FA2 as f64 / 65536.0);
        assert_eq!(matrix[1][1], 0xB785 as f64 / 65536.0);
        assert_eq!(matrix[2][2], 0xB6CF as f64 / 65536.0);
        assert_eq!(matrix[2][0], 0x0390 as f64 / 65536.0);
    }

    #[test]
    fn test_restricted_missing_curves() {
        let mut tags = TagTable::new();
        tags.insert(TAG_GREEN_TRC, Tag::Curve(CurveType::new(vec![])));
        let profile = IccProfile::new(IccProfileHeader::default(), tags);
        assert_eq!(profile.restricted(), Err(IccError::MissingCurveData));
    }

    #[test]
    fn test_restricted_missing_colorant() {
        let mut tags = TagTable::new();
        for trc in [TAG_RED_TRC, TAG_GREEN_TRC, TAG_BLUE_TRC] {
            tags.insert(trc, Tag::Curve(CurveType::new(vec![])));
        }
        let profile = IccProfile::new(IccProfileHeader::default(), tags);
        assert_eq!(
            profile.restricted(),
            Err(IccError::MissingTag {
                tag: TAG_RED_COLORANT
            })
        );
    }
}
