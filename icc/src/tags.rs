//! Tag table and the tag types used by restricted profiles.

use log::{debug, warn};

use crate::header::{XyzNumber, ICC_HEADER_LENGTH};
use crate::{be_u32, signature_at, IccError, Signature};

pub const TAG_GRAY_TRC: Signature = *b"kTRC";
pub const TAG_RED_TRC: Signature = *b"rTRC";
pub const TAG_GREEN_TRC: Signature = *b"gTRC";
pub const TAG_BLUE_TRC: Signature = *b"bTRC";
pub const TAG_RED_COLORANT: Signature = *b"rXYZ";
pub const TAG_GREEN_COLORANT: Signature = *b"gXYZ";
pub const TAG_BLUE_COLORANT: Signature = *b"bXYZ";
pub const TAG_MEDIA_WHITE_POINT: Signature = *b"wtpt";
pub const TAG_COPYRIGHT: Signature = *b"cprt";
pub const TAG_DESCRIPTION: Signature = *b"desc";

pub const TYPE_CURVE: Signature = *b"curv";
pub const TYPE_XYZ: Signature = *b"XYZ ";

// Type signature plus four reserved bytes.
const TYPE_HEADER_LENGTH: usize = 8;
// Tag count followed by (signature, offset, size) entries.
const TAG_COUNT_LENGTH: usize = 4;
const TAG_ENTRY_LENGTH: usize = 12;

/// A tone reproduction curve, ‘curv’.
///
/// No entries is the identity, a single entry is a gamma in u8Fixed8Number
/// form, otherwise the entries sample the curve uniformly over [0, 1].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurveType {
    entries: Vec<u16>,
}

impl CurveType {
    pub fn new(entries: Vec<u16>) -> CurveType {
        CurveType { entries }
    }

    /// Curve holding a single gamma value.
    pub fn gamma(gamma: f64) -> CurveType {
        CurveType {
            entries: vec![(gamma * 256.0 + 0.5).floor() as u16],
        }
    }

    fn decode(tag: Signature, data: &[u8]) -> Result<CurveType, IccError> {
        if data.len() < TYPE_HEADER_LENGTH + 4 {
            return Err(IccError::TagMalformed { tag });
        }
        let count = be_u32(data, TYPE_HEADER_LENGTH) as usize;
        let start = TYPE_HEADER_LENGTH + 4;
        if data.len() < start + count * 2 {
            return Err(IccError::TagMalformed { tag });
        }
        let entries = data[start..start + count * 2]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        Ok(CurveType { entries })
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&TYPE_CURVE);
        out.extend_from_slice(&[0u8; 4]);
        out.extend_from_slice(&(self.entries.len() as u32).to_be_bytes());
        for entry in &self.entries {
            out.extend_from_slice(&entry.to_be_bytes());
        }
    }

    pub fn entries(&self) -> &[u16] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry `index` as a value in [0, 1].
    pub fn value(&self, index: usize) -> f64 {
        self.entries[index] as f64 / 65535.0
    }

    /// The gamma of a single entry curve.
    pub fn gamma_value(&self) -> Option<f64> {
        match self.entries.as_slice() {
            [gamma] => Some(*gamma as f64 / 256.0),
            _ => None,
        }
    }
}

/// An array of XYZ numbers, ‘XYZ ’.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XyzType {
    values: Vec<XyzNumber>,
}

impl XyzType {
    pub fn new(values: Vec<XyzNumber>) -> XyzType {
        XyzType { values }
    }

    fn decode(tag: Signature, data: &[u8]) -> Result<XyzType, IccError> {
        if data.len() < TYPE_HEADER_LENGTH + XyzNumber::LENGTH {
            return Err(IccError::TagMalformed { tag });
        }
        let values = data[TYPE_HEADER_LENGTH..]
            .chunks_exact(XyzNumber::LENGTH)
            .map(|chunk| XyzNumber::read(chunk, 0))
            .collect();
        Ok(XyzType { values })
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&TYPE_XYZ);
        out.extend_from_slice(&[0u8; 4]);
        for value in &self.values {
            value.write(out);
        }
    }

    pub fn values(&self) -> &[XyzNumber] {
        &self.values
    }

    /// The first XYZ value, the only one for colorant and white point tags.
    pub fn first(&self) -> Option<XyzNumber> {
        self.values.first().copied()
    }
}

/// Decoded tag data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    Curve(CurveType),
    Xyz(XyzType),
    /// Any other type, kept as raw bytes including the type signature.
    Other(Vec<u8>),
}

impl Tag {
    fn decode(tag: Signature, data: &[u8]) -> Result<Tag, IccError> {
        if data.len() < 4 {
            return Err(IccError::TagMalformed { tag });
        }
        match signature_at(data, 0) {
            TYPE_CURVE => Ok(Tag::Curve(CurveType::decode(tag, data)?)),
            TYPE_XYZ => Ok(Tag::Xyz(XyzType::decode(tag, data)?)),
            _ => Ok(Tag::Other(data.to_vec())),
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Tag::Curve(curve) => curve.encode(out),
            Tag::Xyz(xyz) => xyz.encode(out),
            Tag::Other(data) => out.extend_from_slice(data),
        }
    }

    /// Type signature of the tag data.
    pub fn type_signature(&self) -> Signature {
        match self {
            Tag::Curve(_) => TYPE_CURVE,
            Tag::Xyz(_) => TYPE_XYZ,
            Tag::Other(data) if data.len() >= 4 => signature_at(data, 0),
            Tag::Other(_) => [0u8; 4],
        }
    }
}

/// Tags of a profile in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagTable {
    tags: Vec<(Signature, Tag)>,
}

impl TagTable {
    pub fn new() -> TagTable {
        TagTable::default()
    }

    /// Decode the tag table following the header of `profile`.
    ///
    /// Tags that share their data with an earlier entry are decoded again, so
    /// the table never refers to other entries.
    pub fn decode(profile: &[u8]) -> Result<TagTable, IccError> {
        let table_start = ICC_HEADER_LENGTH;
        if profile.len() < table_start + TAG_COUNT_LENGTH {
            return Err(IccError::Truncated {
                expected: table_start + TAG_COUNT_LENGTH,
                available: profile.len(),
            });
        }

        let count = be_u32(profile, table_start) as usize;
        let entries_end = table_start + TAG_COUNT_LENGTH + count * TAG_ENTRY_LENGTH;
        if profile.len() < entries_end {
            return Err(IccError::Truncated {
                expected: entries_end,
                available: profile.len(),
            });
        }

        let mut tags = Vec::with_capacity(count);
        for index in 0..count {
            let entry = table_start + TAG_COUNT_LENGTH + index * TAG_ENTRY_LENGTH;
            let tag = signature_at(profile, entry);
            let offset = be_u32(profile, entry + 4);
            let size = be_u32(profile, entry + 8);

            let start = offset as usize;
            let end = start.checked_add(size as usize);
            let data = match end {
                Some(end) if end <= profile.len() => &profile[start..end],
                _ => {
                    return Err(IccError::TagOutOfBounds {
                        tag,
                        offset,
                        count: size,
                    })
                }
            };

            debug!(
                "ICC tag {:?} at {} length {}",
                String::from_utf8_lossy(&tag),
                offset,
                size
            );

            if tags.iter().any(|(seen, _)| *seen == tag) {
                warn!(
                    "ignoring duplicate ICC tag {:?}",
                    String::from_utf8_lossy(&tag)
                );
                continue;
            }
            tags.push((tag, Tag::decode(tag, data)?));
        }

        Ok(TagTable { tags })
    }

    /// Encode the tag table and tag data, data offsets are relative to the
    /// start of the profile and each tag is padded to four bytes.
    pub fn encode(&self) -> Vec<u8> {
        let table_length = TAG_COUNT_LENGTH + self.tags.len() * TAG_ENTRY_LENGTH;
        let mut data = vec![];
        let mut entries = Vec::with_capacity(self.tags.len());

        for (tag, value) in &self.tags {
            let offset = ICC_HEADER_LENGTH + table_length + data.len();
            let before = data.len();
            value.encode(&mut data);
            let size = data.len() - before;
            entries.push((*tag, offset as u32, size as u32));
            while data.len() % 4 != 0 {
                data.push(0);
            }
        }

        let mut out = Vec::with_capacity(table_length + data.len());
        out.extend_from_slice(&(self.tags.len() as u32).to_be_bytes());
        for (tag, offset, size) in entries {
            out.extend_from_slice(&tag);
            out.extend_from_slice(&offset.to_be_bytes());
            out.extend_from_slice(&size.to_be_bytes());
        }
        out.extend(data);
        out
    }

    /// Add a tag, replacing any tag with the same signature.
    pub fn insert(&mut self, signature: Signature, tag: Tag) {
        match self.tags.iter_mut().find(|(seen, _)| *seen == signature) {
            Some(entry) => entry.1 = tag,
            None => self.tags.push((signature, tag)),
        }
    }

    pub fn get(&self, signature: Signature) -> Option<&Tag> {
        self.tags
            .iter()
            .find(|(seen, _)| *seen == signature)
            .map(|(_, tag)| tag)
    }

    pub fn contains(&self, signature: Signature) -> bool {
        self.get(signature).is_some()
    }

    /// The curve stored under `signature`.
    pub fn curve(&self, signature: Signature) -> Result<&CurveType, IccError> {
        match self.get(signature) {
            Some(Tag::Curve(curve)) => Ok(curve),
            Some(other) => Err(IccError::WrongTagType {
                tag: signature,
                found: other.type_signature(),
            }),
            None => Err(IccError::MissingTag { tag: signature }),
        }
    }

    /// The single XYZ value stored under `signature`.
    pub fn xyz(&self, signature: Signature) -> Result<XyzNumber, IccError> {
        match self.get(signature) {
            Some(Tag::Xyz(xyz)) => xyz
                .first()
                .ok_or(IccError::TagMalformed { tag: signature }),
            Some(other) => Err(IccError::WrongTagType {
                tag: signature,
                found: other.type_signature(),
            }),
            None => Err(IccError::MissingTag { tag: signature }),
        }
    }

    pub fn signatures(&self) -> impl Iterator<Item = Signature> + '_ {
        self.tags.iter().map(|(signature, _)| *signature)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
