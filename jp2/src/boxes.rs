//! Box headers and the box tree.
//!
//! Every box starts with an 8-byte header, a 4-byte big endian length (LBox)
//! followed by a 4-byte type (TBox). The length includes the header itself.
//! Superboxes contain nothing but other boxes, so a file is read as a tree of
//! headers whose leaves are decoded by the typed box readers.

use log::debug;
use std::error;
use std::io;

use crate::{BoxType, BoxTypes, JP2Error};

/// Length of LBox and TBox.
pub const BOX_HEADER_LENGTH: u64 = 8;

/// Position and extent of a single box within the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    box_type: BoxType,
    offset: u64,
    length: u64,
}

impl BoxHeader {
    pub fn new(box_type: BoxType, offset: u64, length: u64) -> BoxHeader {
        BoxHeader {
            box_type,
            offset,
            length,
        }
    }

    /// Read the header of the box starting at `offset`.
    ///
    /// `bound` is the first byte past the region the box must fit in, usually
    /// the length of the source or the end of the enclosing superbox.
    pub fn read<R: io::Read + io::Seek>(
        reader: &mut R,
        offset: u64,
        bound: u64,
    ) -> Result<BoxHeader, Box<dyn error::Error>> {
        reader.seek(io::SeekFrom::Start(offset))?;

        let mut box_length = [0u8; 4];
        let mut box_type: BoxType = [0u8; 4];
        reader.read_exact(&mut box_length)?;
        reader.read_exact(&mut box_type)?;

        let length = match u32::from_be_bytes(box_length) as u64 {
            // The box contains all bytes up to the end of the enclosing region.
            0 => bound.saturating_sub(offset),
            // The actual length is in XLBox, which is not supported.
            1 => return Err(JP2Error::BoxExtendedLength { box_type, offset }.into()),
            // The values 2-7 are reserved for ISO use.
            2..=7 => return Err(JP2Error::BoxMalformed { box_type, offset }.into()),
            length => length,
        };

        if offset + length > bound {
            return Err(JP2Error::BoxOutOfBounds {
                box_type,
                offset,
                length,
                bound,
            }
            .into());
        }

        debug!(
            "Box {} ({:?}) at {} length {}",
            BoxTypes::new(box_type),
            box_type,
            offset,
            length
        );

        Ok(BoxHeader {
            box_type,
            offset,
            length,
        })
    }

    /// Box type (TBox).
    pub fn box_type(&self) -> BoxType {
        self.box_type
    }

    /// Offset of the first byte of the box header.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Box length (LBox) including the header.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Offset of the first byte after the header.
    pub fn data_start(&self) -> u64 {
        self.offset + BOX_HEADER_LENGTH
    }

    /// Offset of the first byte after the box.
    pub fn box_end(&self) -> u64 {
        self.offset + self.length
    }

    /// Length of the box contents (DBox).
    pub fn data_length(&self) -> u64 {
        self.length.saturating_sub(BOX_HEADER_LENGTH)
    }

    /// Label used in diagnostics, `None` for unrecognised types.
    pub fn label(&self) -> Option<BoxTypes> {
        match BoxTypes::new(self.box_type) {
            BoxTypes::Unknown => None,
            label => Some(label),
        }
    }
}

/// A box and, for superboxes, the boxes it contains.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxNode {
    header: BoxHeader,
    children: Vec<BoxNode>,
}

impl BoxNode {
    /// Node for `header`, reading the children of superboxes.
    pub fn read<R: io::Read + io::Seek>(
        reader: &mut R,
        header: BoxHeader,
    ) -> Result<BoxNode, Box<dyn error::Error>> {
        let children = if BoxTypes::new(header.box_type).is_superbox() {
            read_boxes(reader, header.data_start(), header.box_end())?
        } else {
            vec![]
        };
        Ok(BoxNode { header, children })
    }

    pub fn header(&self) -> &BoxHeader {
        &self.header
    }

    pub fn children(&self) -> &[BoxNode] {
        &self.children
    }

    /// First direct child of the given type.
    pub fn child(&self, box_type: BoxType) -> Option<&BoxNode> {
        self.children
            .iter()
            .find(|child| child.header.box_type == box_type)
    }
}

/// Walk the sibling boxes in `[start, end)`.
///
/// Superboxes are descended into, each child must fit within its parent.
pub fn read_boxes<R: io::Read + io::Seek>(
    reader: &mut R,
    start: u64,
    end: u64,
) -> Result<Vec<BoxNode>, Box<dyn error::Error>> {
    let mut nodes = vec![];
    let mut offset = start;

    while offset < end {
        if end - offset < BOX_HEADER_LENGTH {
            return Err(JP2Error::BoxMalformed {
                box_type: [0u8; 4],
                offset,
            }
            .into());
        }

        let header = BoxHeader::read(reader, offset, end)?;
        offset = header.box_end();
        nodes.push(BoxNode::read(reader, header)?);
    }

    Ok(nodes)
}

/// Length of the source, the reader position is left unchanged.
pub fn source_length<R: io::Seek>(reader: &mut R) -> Result<u64, io::Error> {
    let position = reader.stream_position()?;
    let length = reader.seek(io::SeekFrom::End(0))?;
    reader.seek(io::SeekFrom::Start(position))?;
    Ok(length)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn boxed(box_type: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = ((data.len() + 8) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(box_type);
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn test_header_extents() {
        let mut input = vec![0u8; 4];
        input.extend(boxed(b"xml ", b"<a/>"));
        let length = input.len() as u64;
        let mut cursor = Cursor::new(input);

        let header = BoxHeader::read(&mut cursor, 4, length).unwrap();
        assert_eq!(header.box_type(), *b"xml ");
        assert_eq!(header.offset(), 4);
        assert_eq!(header.length(), 12);
        assert_eq!(header.data_start(), 12);
        assert_eq!(header.box_end(), 16);
        assert_eq!(header.data_length(), 4);
        assert_eq!(header.label(), Some(BoxTypes::Xml));
    }

    #[test]
    fn test_header_zero_length_runs_to_end() {
        let mut input = vec![0, 0, 0, 0];
        input.extend_from_slice(b"jp2c");
        input.extend_from_slice(&[0xFF, 0x4F, 0xFF, 0x51]);
        let mut cursor = Cursor::new(input);

        let header = BoxHeader::read(&mut cursor, 0, 12).unwrap();
        assert_eq!(header.length(), 12);
        assert_eq!(header.box_end(), 12);
    }

    #[test]
    fn test_header_extended_length() {
        let mut input = vec![0, 0, 0, 1];
        input.extend_from_slice(b"jp2c");
        input.extend_from_slice(&[0u8; 8]);
        let mut cursor = Cursor::new(input);

        let err = BoxHeader::read(&mut cursor, 0, 16).unwrap_err();
        match err.downcast_ref::<JP2Error>() {
            Some(JP2Error::BoxExtendedLength { box_type, offset }) => {
                assert_eq!(box_type, b"jp2c");
                assert_eq!(*offset, 0);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_header_out_of_bounds() {
        let mut input = vec![0, 0, 0, 0x40];
        input.extend_from_slice(b"colr");
        input.extend_from_slice(&[1, 0, 0]);
        let mut cursor = Cursor::new(input);

        let err = BoxHeader::read(&mut cursor, 0, 11).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<JP2Error>(),
            Some(JP2Error::BoxOutOfBounds { length: 0x40, .. })
        ));
    }

    #[test]
    fn test_unknown_type_is_unlabelled() {
        let input = boxed(b"zzzz", &[]);
        let mut cursor = Cursor::new(input);
        let header = BoxHeader::read(&mut cursor, 0, 8).unwrap();
        assert_eq!(header.label(), None);
    }

    #[test]
    fn test_read_boxes_descends_superboxes() {
        let mut ihdr = boxed(b"ihdr", &[0u8; 14]);
        ihdr.extend(boxed(b"colr", &[1, 0, 0, 0, 0, 0, 16]));
        let mut input = boxed(b"jp2h", &ihdr);
        input.extend(boxed(b"xml ", b"<a/>"));
        let length = input.len() as u64;
        let mut cursor = Cursor::new(input);

        let nodes = read_boxes(&mut cursor, 0, length).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].children().len(), 2);
        assert_eq!(nodes[0].children()[1].header().box_type(), *b"colr");
        assert!(nodes[0].child(*b"ihdr").is_some());
        assert!(nodes[1].children().is_empty());
    }

    #[test]
    fn test_read_boxes_child_exceeding_parent() {
        // colr claims 0x20 bytes but jp2h only holds 15
        let mut colr = vec![0, 0, 0, 0x20];
        colr.extend_from_slice(b"colr");
        colr.extend_from_slice(&[1, 0, 0, 0, 0, 0, 16]);
        let mut input = boxed(b"jp2h", &colr);
        input.extend_from_slice(&[0u8; 32]);
        let length = input.len() as u64;
        let mut cursor = Cursor::new(input);

        let err = read_boxes(&mut cursor, 0, length).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<JP2Error>(),
            Some(JP2Error::BoxOutOfBounds { bound: 23, .. })
        ));
    }
}
