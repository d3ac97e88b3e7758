//! Helpers to assemble JP2 files in memory.

pub fn boxed(box_type: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = ((data.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(box_type);
    out.extend_from_slice(data);
    out
}

pub fn image_header(width: u32, height: u32, components: u16, bits: u8) -> Vec<u8> {
    let mut data = height.to_be_bytes().to_vec();
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&components.to_be_bytes());
    data.extend_from_slice(&[bits, 7, 0, 0]);
    boxed(b"ihdr", &data)
}

pub fn enumerated_colour(code: u32) -> Vec<u8> {
    let mut data = vec![1, 0, 0];
    data.extend_from_slice(&code.to_be_bytes());
    boxed(b"colr", &data)
}

pub struct Jp2Builder {
    compatibility_list: Vec<[u8; 4]>,
    header: Vec<Vec<u8>>,
    trailing: Vec<Vec<u8>>,
}

impl Jp2Builder {
    pub fn new() -> Self {
        Jp2Builder {
            compatibility_list: vec![*b"jp2 "],
            header: vec![],
            trailing: vec![],
        }
    }

    pub fn compatibility_list(mut self, list: Vec<[u8; 4]>) -> Self {
        self.compatibility_list = list;
        self
    }

    /// Box inside the JP2 Header box.
    pub fn header_box(mut self, data: Vec<u8>) -> Self {
        self.header.push(data);
        self
    }

    /// Top level box after the JP2 Header box.
    pub fn top_level_box(mut self, data: Vec<u8>) -> Self {
        self.trailing.push(data);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = boxed(b"jP  ", &[13, 10, 135, 10]);

        let mut ftyp = b"jp2 ".to_vec();
        ftyp.extend_from_slice(&[0, 0, 0, 0]);
        for entry in &self.compatibility_list {
            ftyp.extend_from_slice(entry);
        }
        out.extend(boxed(b"ftyp", &ftyp));

        out.extend(boxed(b"jp2h", &self.header.concat()));
        for data in self.trailing {
            out.extend(data);
        }
        out
    }
}
