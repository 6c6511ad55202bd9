use super::pixel::PixelFormat;
use crate::error::{DecodeError, UrfError};
use byteorder::{BigEndian, ByteOrder};
use num_enum::{FromPrimitive, IntoPrimitive, TryFromPrimitive};

/// Magic at the start of every URF file. The byte at offset 7 is not checked.
pub const URF_MAGIC: &[u8; 8] = b"UNIRAST\0";
pub const URF_HEADER_SIZE: usize = 12;
pub const URF_PAGE_HEADER_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UrfHeader {
    /// Number of pages announced by the writer, `0` if unknown.
    pub page_count: u32,
}

impl UrfHeader {
    /// Parse the file header. The trailing byte of the magic is normalized to NUL
    /// before comparison, so any value there is accepted.
    pub fn from_bytes(content: &[u8; URF_HEADER_SIZE]) -> Result<Self, UrfError> {
        let mut magic = [0u8; 8];
        magic.copy_from_slice(&content[..8]);
        magic[7] = 0;
        if magic != *URF_MAGIC {
            return Err(UrfError::InvalidMagic);
        }
        Ok(UrfHeader {
            page_count: BigEndian::read_u32(&content[8..12]),
        })
    }

    pub fn to_bytes(&self) -> [u8; URF_HEADER_SIZE] {
        let mut target = [0u8; URF_HEADER_SIZE];
        target[..8].copy_from_slice(URF_MAGIC);
        BigEndian::write_u32(&mut target[8..12], self.page_count);
        target
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum UrfColorSpace {
    /// Luminance (gamma 2.2)
    #[allow(non_camel_case_types)]
    sGray,
    /// Red, green, blue (sRGB)
    #[allow(non_camel_case_types)]
    sRGB,
    /// CIE Lab
    CIELab,
    /// Red, green, blue (Adobe RGB)
    AdobeRGB,
    /// Luminance (DeviceGray)
    Gray,
    /// Red, green, blue (DeviceRGB)
    RGB,
    /// Cyan, magenta, yellow, black (DeviceCMYK)
    CMYK,
}

impl UrfColorSpace {
    pub fn num_colors(&self) -> usize {
        match self {
            UrfColorSpace::sGray | UrfColorSpace::Gray => 1,
            UrfColorSpace::sRGB
            | UrfColorSpace::RGB
            | UrfColorSpace::CIELab
            | UrfColorSpace::AdobeRGB => 3,
            UrfColorSpace::CMYK => 4,
        }
    }

    /// The byte value a blank (`-128`) run paints with: white paper.
    pub fn blank_byte(&self) -> u8 {
        match self {
            UrfColorSpace::CMYK => 0x00,
            _ => 0xff,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum UrfMediaType {
    Auto,
    Stationery,
    Transparency,
    Envelope,
    Cardstock,
    Labels,
    StationeryLetterhead,
    Disc,
    PhotographicMatte,
    PhotographicSatin,
    PhotographicSemiGloss,
    PhotographicGlossy,
    PhotographicHighGloss,
    Other,
    /// A value this crate has no name for, kept as read.
    #[num_enum(catch_all)]
    Unknown(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum UrfDuplex {
    NoDuplex = 1,
    ShortSide,
    LongSide,
    #[num_enum(catch_all)]
    Unknown(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum UrfQuality {
    Default = 0,
    Draft = 3,
    Normal,
    High,
    #[num_enum(catch_all)]
    Unknown(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum UrfMediaPosition {
    Auto = 0,
    Main,
    Alternate,
    LargeCapacity,
    Manual,
    Envelope,
    Disc,
    Photo,
    Hagaki,
    MainRoll,
    AlternateRoll,
    Top,
    Middle,
    Bottom,
    Side,
    Left,
    Right,
    Center,
    Rear,
    ByPassTray,
    Tray1,
    Tray2,
    Tray3,
    Tray4,
    Tray5,
    Tray6,
    Tray7,
    Tray8,
    Tray9,
    Tray10,
    Tray11,
    Tray12,
    Tray13,
    Tray14,
    Tray15,
    Tray16,
    Tray17,
    Tray18,
    Tray19,
    Tray20,
    Roll1,
    Roll2,
    Roll3,
    Roll4,
    Roll5,
    Roll6,
    Roll7,
    Roll8,
    Roll9,
    Roll10,
    #[num_enum(catch_all)]
    Unknown(u8),
}

/// Per-page header, 32 bytes on the wire, all multi-byte fields big-endian.
///
/// | offset | size | field            |
/// |--------|------|------------------|
/// | 0      | 1    | bits per pixel   |
/// | 1      | 1    | colour space     |
/// | 2      | 1    | duplex           |
/// | 3      | 1    | quality          |
/// | 4      | 1    | media position   |
/// | 5      | 1    | media type       |
/// | 6      | 6    | reserved         |
/// | 12     | 4    | width            |
/// | 16     | 4    | height           |
/// | 20     | 4    | dots per inch    |
/// | 24     | 8    | reserved         |
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UrfPageHeader {
    pub bits_per_pixel: u8,
    pub color_space: UrfColorSpace,
    pub duplex: UrfDuplex,
    pub quality: UrfQuality,
    pub media_position: UrfMediaPosition,
    pub media_type: UrfMediaType,
    pub width: u32,
    pub height: u32,
    pub dot_per_inch: u32,
}

impl UrfPageHeader {
    pub fn from_bytes(content: &[u8; URF_PAGE_HEADER_SIZE]) -> Result<Self, UrfError> {
        Ok(UrfPageHeader {
            bits_per_pixel: content[0],
            color_space: UrfColorSpace::try_from_primitive(content[1])?,
            duplex: UrfDuplex::from_primitive(content[2]),
            quality: UrfQuality::from_primitive(content[3]),
            media_position: UrfMediaPosition::from_primitive(content[4]),
            media_type: UrfMediaType::from_primitive(content[5]),
            width: BigEndian::read_u32(&content[12..16]),
            height: BigEndian::read_u32(&content[16..20]),
            dot_per_inch: BigEndian::read_u32(&content[20..24]),
        })
    }

    pub fn to_bytes(&self) -> [u8; URF_PAGE_HEADER_SIZE] {
        let mut target = [0u8; URF_PAGE_HEADER_SIZE];
        target[0] = self.bits_per_pixel;
        target[1] = self.color_space as u8;
        target[2] = self.duplex.into();
        target[3] = self.quality.into();
        target[4] = self.media_position.into();
        target[5] = self.media_type.into();
        BigEndian::write_u32(&mut target[12..16], self.width);
        BigEndian::write_u32(&mut target[16..20], self.height);
        BigEndian::write_u32(&mut target[20..24], self.dot_per_inch);
        target
    }

    /// The printing hints this crate has no name for, as `(field, raw value)` pairs.
    /// They do not affect decoding.
    pub fn unknown_fields(&self) -> Vec<(&'static str, u8)> {
        let mut fields = Vec::new();
        if let UrfDuplex::Unknown(value) = self.duplex {
            fields.push(("duplex", value));
        }
        if let UrfQuality::Unknown(value) = self.quality {
            fields.push(("quality", value));
        }
        if let UrfMediaPosition::Unknown(value) = self.media_position {
            fields.push(("media position", value));
        }
        if let UrfMediaType::Unknown(value) = self.media_type {
            fields.push(("media type", value));
        }
        fields
    }

    pub fn pixel_format(&self) -> Result<PixelFormat, DecodeError> {
        PixelFormat::new(self.bits_per_pixel)
    }

    pub fn fill_byte(&self) -> u8 {
        self.color_space.blank_byte()
    }

    /// Size of the decoded page in bytes, `None` on overflow.
    pub fn num_bytes(&self) -> Option<u64> {
        (self.width as u64 * self.height as u64).checked_mul((self.bits_per_pixel / 8) as u64)
    }
}
