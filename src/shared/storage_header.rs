use crc32fast::Hasher as Crc32Hasher;
use std::io::{self, Read, Write};

/// Fixed 20-byte preamble written at offset 0 of every file this crate owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryHeader {
    pub magic: [u8; 8],
    pub version: u16,
    pub flags: u16,
    pub reserved: u32,
    pub header_crc32: u32,
}

impl BinaryHeader {
    pub const LEN_WITHOUT_CRC: usize = 8 + 2 + 2 + 4;
    pub const TOTAL_LEN: usize = Self::LEN_WITHOUT_CRC + 4;

    pub fn new(magic: [u8; 8], version: u16, flags: u16) -> Self {
        let mut header = Self {
            magic,
            version,
            flags,
            reserved: 0,
            header_crc32: 0,
        };
        header.header_crc32 = crc32(&header.body_bytes());
        header
    }

    fn body_bytes(&self) -> [u8; Self::LEN_WITHOUT_CRC] {
        let mut buf = [0u8; Self::LEN_WITHOUT_CRC];
        buf[..8].copy_from_slice(&self.magic);
        buf[8..10].copy_from_slice(&self.version.to_le_bytes());
        buf[10..12].copy_from_slice(&self.flags.to_le_bytes());
        buf[12..16].copy_from_slice(&self.reserved.to_le_bytes());
        buf
    }

    pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        w.write_all(&self.body_bytes())?;
        w.write_all(&self.header_crc32.to_le_bytes())
    }

    pub fn read_from<R: Read>(mut r: R) -> io::Result<Self> {
        let mut buf = [0u8; Self::TOTAL_LEN];
        r.read_exact(&mut buf)?;

        let mut magic = [0u8; 8];
        magic.copy_from_slice(&buf[..8]);
        let header = Self {
            magic,
            version: u16::from_le_bytes([buf[8], buf[9]]),
            flags: u16::from_le_bytes([buf[10], buf[11]]),
            reserved: u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]),
            header_crc32: u32::from_le_bytes([buf[16], buf[17], buf[18], buf[19]]),
        };

        if crc32(&buf[..Self::LEN_WITHOUT_CRC]) != header.header_crc32 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "header CRC mismatch",
            ));
        }
        Ok(header)
    }

    /// Reads a header and checks it against the expected file kind.
    pub fn read_expecting<R: Read>(r: R, kind: FileKind) -> io::Result<Self> {
        let header = Self::read_from(r)?;
        if header.magic != kind.magic() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "invalid magic"));
        }
        if header.version != kind.version() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported version {}", header.version),
            ));
        }
        Ok(header)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    WalLog,
    TabletFile,
}

impl FileKind {
    pub const fn magic(&self) -> [u8; 8] {
        match self {
            FileKind::WalLog => *b"OIWALLOG",
            FileKind::TabletFile => *b"OITABLET",
        }
    }

    pub const fn version(&self) -> u16 {
        1
    }

    pub fn header(&self) -> BinaryHeader {
        BinaryHeader::new(self.magic(), self.version(), 0)
    }
}

pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Crc32Hasher::new();
    hasher.update(data);
    hasher.finalize()
}
