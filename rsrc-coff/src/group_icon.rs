// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Group icon resources.

An `.ico` file is embedded as one `RT_ICON` resource per image plus a single
`RT_GROUP_ICON` resource. The group resource mirrors the `.ico` directory
but refers to images by resource id instead of file offset.
*/

use {
    crate::{
        coff::{ResourceData, ResourceSink, ResourceType},
        error::{Error, Result},
        ico::{decode_headers, IconDir, IconEntryCommon},
        ids::IdAllocator,
        source::SizedFile,
        tree::FixedLayout,
    },
    byteorder::{LittleEndian, WriteBytesExt},
    std::io::{BufReader, Write},
};

/// `GRPICONDIRENTRY`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupIconEntry {
    pub common: IconEntryCommon,
    /// Resource id of the `RT_ICON` holding the image.
    pub id: u16,
}

impl FixedLayout for GroupIconEntry {
    fn layout_size(&self) -> u64 {
        IconEntryCommon::SIZE + 2
    }

    fn write_le(&self, dest: &mut dyn Write) -> std::io::Result<()> {
        self.common.write_le(dest)?;
        dest.write_u16::<LittleEndian>(self.id)
    }
}

/// `GRPICONDIR`: an icon directory header followed by its entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupIconDirectory {
    header: IconDir,
    entries: Vec<GroupIconEntry>,
}

impl Default for GroupIconDirectory {
    fn default() -> Self {
        Self {
            header: IconDir {
                reserved: 0,
                kind: 1,
                count: 0,
            },
            entries: vec![],
        }
    }
}

impl GroupIconDirectory {
    pub fn header(&self) -> &IconDir {
        &self.header
    }

    pub fn entries(&self) -> &[GroupIconEntry] {
        &self.entries
    }

    fn push(&mut self, entry: GroupIconEntry) {
        self.entries.push(entry);
        self.header.count = self.entries.len() as u16;
    }
}

impl FixedLayout for GroupIconDirectory {
    fn layout_size(&self) -> u64 {
        self.header.layout_size() + self.entries.layout_size()
    }

    fn write_le(&self, dest: &mut dyn Write) -> std::io::Result<()> {
        self.header.write_le(dest)?;
        self.entries.write_le(dest)
    }
}

/// Identifiers assigned while registering one `.ico` file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IconGroup {
    /// Id of the `RT_GROUP_ICON` resource.
    pub group_id: u16,
    /// Ids of the `RT_ICON` resources, in file order.
    pub image_ids: Vec<u16>,
}

/// Register the images of an `.ico` file and a group icon referencing them.
///
/// Each image gets the next id from `ids` in file order, and the group gets
/// the id after that. Image data is not read here; each icon resource refers
/// to its byte range in `file`.
///
/// Returns `None` without registering anything if the file holds no images.
pub fn add_icon_group<'a>(
    file: &'a SizedFile,
    ids: &mut IdAllocator,
    sink: &mut impl ResourceSink<'a>,
) -> Result<Option<IconGroup>> {
    let images = decode_headers(&mut BufReader::new(file.rewound()?))?;

    if images.is_empty() {
        return Ok(None);
    }

    for image in &images {
        let end = image.image_offset as u64 + image.len() as u64;
        if end > file.len() {
            return Err(Error::IcoImageOutOfBounds {
                path: file.path().to_path_buf(),
                offset: image.image_offset,
                len: image.len(),
            });
        }
    }

    let mut directory = GroupIconDirectory::default();
    let mut image_ids = Vec::with_capacity(images.len());

    for image in images {
        let id = ids.allocate()?;

        sink.add_resource(
            ResourceType::Icon,
            id,
            ResourceData::Source(file.region(image.image_offset as u64, image.len() as u64)),
        )?;

        directory.push(GroupIconEntry {
            common: image.common,
            id,
        });
        image_ids.push(id);
    }

    let group_id = ids.allocate()?;
    sink.add_resource(
        ResourceType::GroupIcon,
        group_id,
        ResourceData::Structured(Box::new(directory)),
    )?;

    Ok(Some(IconGroup {
        group_id,
        image_ids,
    }))
}
