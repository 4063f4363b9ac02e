// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ICO file header decoding.

use {
    crate::{
        error::{Error, Result},
        tree::FixedLayout,
    },
    byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt},
    std::io::{Read, Write},
};

/// The `ICONDIR` header at the start of every `.ico` file and group icon.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IconDir {
    pub reserved: u16,
    /// 1 for icons, 2 for cursors.
    pub kind: u16,
    pub count: u16,
}

impl IconDir {
    pub const SIZE: u64 = 6;

    pub fn from_reader(reader: &mut impl Read) -> Result<Self> {
        Ok(Self {
            reserved: reader.read_u16::<LittleEndian>()?,
            kind: reader.read_u16::<LittleEndian>()?,
            count: reader.read_u16::<LittleEndian>()?,
        })
    }
}

impl FixedLayout for IconDir {
    fn layout_size(&self) -> u64 {
        Self::SIZE
    }

    fn write_le(&self, dest: &mut dyn Write) -> std::io::Result<()> {
        dest.write_u16::<LittleEndian>(self.reserved)?;
        dest.write_u16::<LittleEndian>(self.kind)?;
        dest.write_u16::<LittleEndian>(self.count)
    }
}

/// Fields shared by `ICONDIRENTRY` in files and `GRPICONDIRENTRY` in resources.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IconEntryCommon {
    /// Width in pixels. 0 means 256.
    pub width: u8,
    /// Height in pixels. 0 means 256.
    pub height: u8,
    pub color_count: u8,
    pub reserved: u8,
    pub planes: u16,
    pub bit_count: u16,
    /// Length of the image data.
    pub bytes_in_res: u32,
}

impl IconEntryCommon {
    pub const SIZE: u64 = 12;

    pub fn from_reader(reader: &mut impl Read) -> Result<Self> {
        Ok(Self {
            width: reader.read_u8()?,
            height: reader.read_u8()?,
            color_count: reader.read_u8()?,
            reserved: reader.read_u8()?,
            planes: reader.read_u16::<LittleEndian>()?,
            bit_count: reader.read_u16::<LittleEndian>()?,
            bytes_in_res: reader.read_u32::<LittleEndian>()?,
        })
    }
}

impl FixedLayout for IconEntryCommon {
    fn layout_size(&self) -> u64 {
        Self::SIZE
    }

    fn write_le(&self, dest: &mut dyn Write) -> std::io::Result<()> {
        dest.write_u8(self.width)?;
        dest.write_u8(self.height)?;
        dest.write_u8(self.color_count)?;
        dest.write_u8(self.reserved)?;
        dest.write_u16::<LittleEndian>(self.planes)?;
        dest.write_u16::<LittleEndian>(self.bit_count)?;
        dest.write_u32::<LittleEndian>(self.bytes_in_res)
    }
}

/// Describes one image inside an `.ico` file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IconImage {
    pub common: IconEntryCommon,
    /// Offset of the image data from the start of the file.
    pub image_offset: u32,
}

impl IconImage {
    pub fn from_reader(reader: &mut impl Read) -> Result<Self> {
        let common = IconEntryCommon::from_reader(reader)?;
        let image_offset = reader.read_u32::<LittleEndian>()?;

        Ok(Self {
            common,
            image_offset,
        })
    }

    /// Length of the image data.
    pub(crate) fn len(&self) -> u32 {
        self.common.bytes_in_res
    }
}

/// Decode the directory of an `.ico` file.
///
/// Only headers are read. Image data stays in the file and is addressed by
/// [IconImage::image_offset] and `bytes_in_res`.
pub fn decode_headers(reader: &mut impl Read) -> Result<Vec<IconImage>> {
    let dir = IconDir::from_reader(reader)?;

    if dir.reserved != 0 || dir.kind != 1 {
        return Err(Error::IcoBadHeader {
            reserved: dir.reserved,
            kind: dir.kind,
        });
    }

    (0..dir.count)
        .map(|_| IconImage::from_reader(reader))
        .collect::<Result<Vec<_>>>()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build an `.ico` file holding square images with the given pixel data.
    pub(crate) fn ico_file(images: &[(u8, &[u8])]) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        IconDir {
            reserved: 0,
            kind: 1,
            count: images.len() as u16,
        }
        .write_le(&mut data)?;

        let mut offset = IconDir::SIZE as u32 + 16 * images.len() as u32;
        for (size, pixels) in images {
            IconEntryCommon {
                width: *size,
                height: *size,
                color_count: 0,
                reserved: 0,
                planes: 1,
                bit_count: 32,
                bytes_in_res: pixels.len() as u32,
            }
            .write_le(&mut data)?;
            data.write_u32::<LittleEndian>(offset)?;
            offset += pixels.len() as u32;
        }

        for (_, pixels) in images {
            data.extend_from_slice(pixels);
        }

        Ok(data)
    }

    #[test]
    fn decode_two_images() -> Result<()> {
        let data = ico_file(&[(16, &b"sixteen"[..]), (32, &b"thirty-two"[..])])?;

        let images = decode_headers(&mut std::io::Cursor::new(&data))?;
        assert_eq!(images.len(), 2);

        assert_eq!(images[0].common.width, 16);
        assert_eq!(images[0].common.bit_count, 32);
        assert_eq!(images[0].len(), 7);
        assert_eq!(images[0].image_offset, 6 + 32);

        assert_eq!(images[1].common.height, 32);
        assert_eq!(images[1].len(), 10);
        assert_eq!(images[1].image_offset, 6 + 32 + 7);

        let start = images[1].image_offset as usize;
        assert_eq!(&data[start..start + 10], b"thirty-two");

        Ok(())
    }

    #[test]
    fn decode_empty_directory() -> Result<()> {
        let data = ico_file(&[])?;

        assert!(decode_headers(&mut std::io::Cursor::new(&data))?.is_empty());

        Ok(())
    }

    #[test]
    fn reject_cursor_file() {
        let data = [0u8, 0, 2, 0, 0, 0];

        assert!(matches!(
            decode_headers(&mut std::io::Cursor::new(&data)),
            Err(Error::IcoBadHeader {
                reserved: 0,
                kind: 2
            })
        ));
    }

    #[test]
    fn truncated_directory() {
        let data = [0u8, 0, 1, 0, 3, 0, 16, 16];

        assert!(matches!(
            decode_headers(&mut std::io::Cursor::new(&data)),
            Err(Error::Io(_))
        ));
    }
}
