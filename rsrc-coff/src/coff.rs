// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! COFF object files holding a single data section.

Two flavors are supported. A resources object has a `.rsrc` section
containing a resource directory tree (type, then id, then language) that a
linker merges into the resource table of the final executable. A raw data
object has an `.rdata` section holding opaque blobs, each marked by an
external symbol.

Content is added to a [Coff] while it is mutable. [Coff::freeze] then
computes every offset and size, after which the instance can only be
written.
*/

use {
    crate::{
        error::{Error, Result},
        source::SizedSource,
        tree::{nodes_size, write_tree, FixedLayout, Node, Padding, Tree},
    },
    byteorder::{LittleEndian, WriteBytesExt},
    log::debug,
    std::{io::Write, str::FromStr},
};

/// Section name of resource objects.
pub const SECTION_RSRC: [u8; 8] = *b".rsrc\0\0\0";
/// Section name of raw data objects.
pub const SECTION_RDATA: [u8; 8] = *b".rdata\0\0";

/// `IMAGE_SCN_CNT_INITIALIZED_DATA | IMAGE_SCN_MEM_READ`.
const SECTION_CHARACTERISTICS: u32 = 0x4000_0040;
/// `IMAGE_FILE_32BIT_MACHINE | IMAGE_FILE_LINE_NUMS_STRIPPED`.
const RSRC_FILE_CHARACTERISTICS: u16 = 0x0104;
/// As above plus `IMAGE_FILE_RELOCS_STRIPPED`.
const RDATA_FILE_CHARACTERISTICS: u16 = 0x0105;

/// High bit of `OffsetToData` marking a subdirectory.
const SUBDIRECTORY: u32 = 0x8000_0000;
/// en-US.
const LANGUAGE_ID: u32 = 0x0409;

const STORAGE_CLASS_EXTERNAL: u8 = 2;
const STORAGE_CLASS_STATIC: u8 = 3;

/// Alignment of payloads in `.rsrc`.
const RESOURCE_DATA_ALIGNMENT: u64 = 8;

/// Target machine of an object file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Architecture {
    I386,
    Amd64,
    Arm,
    Arm64,
}

impl Architecture {
    /// `IMAGE_FILE_MACHINE_*` value.
    pub fn machine(&self) -> u16 {
        match self {
            Self::I386 => 0x014c,
            Self::Amd64 => 0x8664,
            Self::Arm => 0x01c4,
            Self::Arm64 => 0xaa64,
        }
    }

    /// The `ADDR32NB` relocation type for this machine.
    pub fn image_relative_relocation(&self) -> u16 {
        match self {
            Self::I386 => 0x0007,
            Self::Amd64 => 0x0003,
            Self::Arm => 0x0002,
            Self::Arm64 => 0x0002,
        }
    }
}

impl FromStr for Architecture {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "386" => Ok(Self::I386),
            "amd64" => Ok(Self::Amd64),
            "arm" => Ok(Self::Arm),
            "arm64" => Ok(Self::Arm64),
            _ => Err(Error::UnsupportedArchitecture(s.to_string())),
        }
    }
}

/// Resource type codes (`RT_*`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResourceType {
    Icon,
    GroupIcon,
    Version,
    Manifest,
}

impl From<ResourceType> for u32 {
    fn from(source: ResourceType) -> u32 {
        match source {
            ResourceType::Icon => 3,
            ResourceType::GroupIcon => 14,
            ResourceType::Version => 16,
            ResourceType::Manifest => 24,
        }
    }
}

/// `IMAGE_FILE_HEADER`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FileHeader {
    pub machine: u16,
    pub number_of_sections: u16,
    pub time_date_stamp: u32,
    pub pointer_to_symbol_table: u32,
    pub number_of_symbols: u32,
    pub size_of_optional_header: u16,
    pub characteristics: u16,
}

impl FileHeader {
    pub const SIZE: u64 = 20;
}

impl FixedLayout for FileHeader {
    fn layout_size(&self) -> u64 {
        Self::SIZE
    }

    fn write_le(&self, dest: &mut dyn Write) -> std::io::Result<()> {
        dest.write_u16::<LittleEndian>(self.machine)?;
        dest.write_u16::<LittleEndian>(self.number_of_sections)?;
        dest.write_u32::<LittleEndian>(self.time_date_stamp)?;
        dest.write_u32::<LittleEndian>(self.pointer_to_symbol_table)?;
        dest.write_u32::<LittleEndian>(self.number_of_symbols)?;
        dest.write_u16::<LittleEndian>(self.size_of_optional_header)?;
        dest.write_u16::<LittleEndian>(self.characteristics)
    }
}

/// `IMAGE_SECTION_HEADER`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SectionHeader {
    pub name: [u8; 8],
    pub virtual_size: u32,
    pub virtual_address: u32,
    pub size_of_raw_data: u32,
    pub pointer_to_raw_data: u32,
    pub pointer_to_relocations: u32,
    pub pointer_to_line_numbers: u32,
    pub number_of_relocations: u16,
    pub number_of_line_numbers: u16,
    pub characteristics: u32,
}

impl SectionHeader {
    pub const SIZE: u64 = 40;
}

impl FixedLayout for SectionHeader {
    fn layout_size(&self) -> u64 {
        Self::SIZE
    }

    fn write_le(&self, dest: &mut dyn Write) -> std::io::Result<()> {
        dest.write_all(&self.name)?;
        dest.write_u32::<LittleEndian>(self.virtual_size)?;
        dest.write_u32::<LittleEndian>(self.virtual_address)?;
        dest.write_u32::<LittleEndian>(self.size_of_raw_data)?;
        dest.write_u32::<LittleEndian>(self.pointer_to_raw_data)?;
        dest.write_u32::<LittleEndian>(self.pointer_to_relocations)?;
        dest.write_u32::<LittleEndian>(self.pointer_to_line_numbers)?;
        dest.write_u16::<LittleEndian>(self.number_of_relocations)?;
        dest.write_u16::<LittleEndian>(self.number_of_line_numbers)?;
        dest.write_u32::<LittleEndian>(self.characteristics)
    }
}

/// `IMAGE_RESOURCE_DIRECTORY`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResourceDirectory {
    pub characteristics: u32,
    pub time_date_stamp: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub number_of_named_entries: u16,
    pub number_of_id_entries: u16,
}

impl ResourceDirectory {
    pub const SIZE: u64 = 16;
}

impl FixedLayout for ResourceDirectory {
    fn layout_size(&self) -> u64 {
        Self::SIZE
    }

    fn write_le(&self, dest: &mut dyn Write) -> std::io::Result<()> {
        dest.write_u32::<LittleEndian>(self.characteristics)?;
        dest.write_u32::<LittleEndian>(self.time_date_stamp)?;
        dest.write_u16::<LittleEndian>(self.major_version)?;
        dest.write_u16::<LittleEndian>(self.minor_version)?;
        dest.write_u16::<LittleEndian>(self.number_of_named_entries)?;
        dest.write_u16::<LittleEndian>(self.number_of_id_entries)
    }
}

/// `IMAGE_RESOURCE_DIRECTORY_ENTRY`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name_or_id: u32,
    pub offset_to_data: u32,
}

impl DirectoryEntry {
    pub const SIZE: u64 = 8;
}

impl FixedLayout for DirectoryEntry {
    fn layout_size(&self) -> u64 {
        Self::SIZE
    }

    fn write_le(&self, dest: &mut dyn Write) -> std::io::Result<()> {
        dest.write_u32::<LittleEndian>(self.name_or_id)?;
        dest.write_u32::<LittleEndian>(self.offset_to_data)
    }
}

/// A resource directory followed by its entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectoryTable {
    pub header: ResourceDirectory,
    pub entries: Vec<DirectoryEntry>,
}

impl DirectoryTable {
    fn size_for(count: usize) -> u64 {
        ResourceDirectory::SIZE + DirectoryEntry::SIZE * count as u64
    }

    fn with_id_entries(entries: Vec<DirectoryEntry>) -> Self {
        Self {
            header: ResourceDirectory {
                number_of_id_entries: entries.len() as u16,
                ..Default::default()
            },
            entries,
        }
    }
}

impl FixedLayout for DirectoryTable {
    fn layout_size(&self) -> u64 {
        Self::size_for(self.entries.len())
    }

    fn write_le(&self, dest: &mut dyn Write) -> std::io::Result<()> {
        self.header.write_le(dest)?;
        self.entries.write_le(dest)
    }
}

/// `IMAGE_RESOURCE_DATA_ENTRY`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DataEntry {
    pub offset_to_data: u32,
    pub size: u32,
    pub code_page: u32,
    pub reserved: u32,
}

impl DataEntry {
    pub const SIZE: u64 = 16;
}

impl FixedLayout for DataEntry {
    fn layout_size(&self) -> u64 {
        Self::SIZE
    }

    fn write_le(&self, dest: &mut dyn Write) -> std::io::Result<()> {
        dest.write_u32::<LittleEndian>(self.offset_to_data)?;
        dest.write_u32::<LittleEndian>(self.size)?;
        dest.write_u32::<LittleEndian>(self.code_page)?;
        dest.write_u32::<LittleEndian>(self.reserved)
    }
}

/// `IMAGE_RELOCATION`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Relocation {
    pub virtual_address: u32,
    pub symbol_table_index: u32,
    pub kind: u16,
}

impl Relocation {
    pub const SIZE: u64 = 10;
}

impl FixedLayout for Relocation {
    fn layout_size(&self) -> u64 {
        Self::SIZE
    }

    fn write_le(&self, dest: &mut dyn Write) -> std::io::Result<()> {
        dest.write_u32::<LittleEndian>(self.virtual_address)?;
        dest.write_u32::<LittleEndian>(self.symbol_table_index)?;
        dest.write_u16::<LittleEndian>(self.kind)
    }
}

/// `IMAGE_SYMBOL`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Symbol {
    /// Either a NUL padded short name or 4 zero bytes plus a string table offset.
    pub name: [u8; 8],
    pub value: u32,
    pub section_number: u16,
    pub kind: u16,
    pub storage_class: u8,
    pub number_of_aux_symbols: u8,
}

impl Symbol {
    pub const SIZE: u64 = 18;
}

impl FixedLayout for Symbol {
    fn layout_size(&self) -> u64 {
        Self::SIZE
    }

    fn write_le(&self, dest: &mut dyn Write) -> std::io::Result<()> {
        dest.write_all(&self.name)?;
        dest.write_u32::<LittleEndian>(self.value)?;
        dest.write_u16::<LittleEndian>(self.section_number)?;
        dest.write_u16::<LittleEndian>(self.kind)?;
        dest.write_u8(self.storage_class)?;
        dest.write_u8(self.number_of_aux_symbols)
    }
}

/// The string table following the symbol table.
///
/// Offsets into the table count its 4 byte length prefix.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringTable {
    strings: Vec<u8>,
}

impl StringTable {
    /// Append a NUL terminated string and return its offset.
    pub fn add(&mut self, s: &str) -> u32 {
        let offset = 4 + self.strings.len() as u32;
        self.strings.extend_from_slice(s.as_bytes());
        self.strings.push(0);

        offset
    }

    /// Encode a symbol name, spilling to this table if it is longer than 8 bytes.
    pub fn symbol_name(&mut self, name: &str) -> [u8; 8] {
        let mut encoded = [0u8; 8];

        if name.len() <= 8 {
            encoded[..name.len()].copy_from_slice(name.as_bytes());
        } else {
            let offset = self.add(name);
            encoded[4..].copy_from_slice(&offset.to_le_bytes());
        }

        encoded
    }
}

impl FixedLayout for StringTable {
    fn layout_size(&self) -> u64 {
        4 + self.strings.len() as u64
    }

    fn write_le(&self, dest: &mut dyn Write) -> std::io::Result<()> {
        dest.write_u32::<LittleEndian>(self.layout_size() as u32)?;
        dest.write_all(&self.strings)
    }
}

/// The content of a resource.
pub enum ResourceData<'a> {
    /// Bytes copied verbatim from a source.
    Source(SizedSource<'a>),
    /// A value encoded at write time.
    Structured(Box<dyn FixedLayout + 'a>),
}

impl<'a> ResourceData<'a> {
    pub(crate) fn len(&self) -> u64 {
        match self {
            Self::Source(source) => source.len(),
            Self::Structured(value) => value.layout_size(),
        }
    }

    fn node(&self) -> Node<'_> {
        match self {
            Self::Source(source) => Node::Payload(source),
            Self::Structured(value) => Node::Fixed(&**value),
        }
    }
}

impl<'a> std::fmt::Debug for ResourceData<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source(source) => f.debug_tuple("Source").field(source).finish(),
            Self::Structured(value) => write!(f, "Structured({} bytes)", value.layout_size()),
        }
    }
}

/// A typed, numbered resource.
#[derive(Debug)]
pub struct ResourceEntry<'a> {
    kind: ResourceType,
    id: u16,
    data: ResourceData<'a>,
}

impl<'a> ResourceEntry<'a> {
    pub fn kind(&self) -> ResourceType {
        self.kind
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn data(&self) -> &ResourceData<'a> {
        &self.data
    }

    fn sort_key(&self) -> (u32, u16) {
        (self.kind.into(), self.id)
    }
}

/// A blob in a raw data object and the symbol marking its start.
#[derive(Debug)]
pub struct DataBlob<'a> {
    symbol: String,
    data: SizedSource<'a>,
}

impl<'a> DataBlob<'a> {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn data(&self) -> &SizedSource<'a> {
        &self.data
    }
}

#[derive(Debug)]
enum Content<'a> {
    Resources(Vec<ResourceEntry<'a>>),
    RawData(Vec<DataBlob<'a>>),
}

/// Everything computed by [Coff::freeze].
#[derive(Debug, Default)]
struct Layout {
    file_header: FileHeader,
    section_header: SectionHeader,
    /// Directory tables in depth-first order.
    directories: Vec<DirectoryTable>,
    data_entries: Vec<DataEntry>,
    /// Content indices in output order, each with the padding that follows it.
    data_order: Vec<(usize, Padding)>,
    relocations: Vec<Relocation>,
    symbols: Vec<Symbol>,
    string_table: StringTable,
}

/// Receives resources as they are registered.
pub trait ResourceSink<'a> {
    fn add_resource(&mut self, kind: ResourceType, id: u16, data: ResourceData<'a>) -> Result<()>;
}

/// A COFF object file under construction.
#[derive(Debug)]
pub struct Coff<'a> {
    architecture: Architecture,
    content: Content<'a>,
    layout: Option<Layout>,
}

impl<'a> Coff<'a> {
    /// A resources object (`.rsrc` section).
    pub fn new_resources() -> Self {
        Self {
            architecture: Architecture::I386,
            content: Content::Resources(vec![]),
            layout: None,
        }
    }

    /// A raw data object (`.rdata` section).
    pub fn new_raw_data() -> Self {
        Self {
            architecture: Architecture::I386,
            content: Content::RawData(vec![]),
            layout: None,
        }
    }

    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    /// Set the target architecture from its name (`386`, `amd64`, `arm`, `arm64`).
    pub fn set_architecture(&mut self, name: &str) -> Result<()> {
        self.ensure_mutable()?;
        self.architecture = Architecture::from_str(name)?;

        Ok(())
    }

    pub fn is_frozen(&self) -> bool {
        self.layout.is_some()
    }

    /// Registered resources in registration order.
    ///
    /// Empty for raw data objects.
    pub fn resources(&self) -> &[ResourceEntry<'a>] {
        match &self.content {
            Content::Resources(entries) => entries,
            Content::RawData(_) => &[],
        }
    }

    /// Added data blobs in order.
    ///
    /// Empty for resources objects.
    pub fn data_blobs(&self) -> &[DataBlob<'a>] {
        match &self.content {
            Content::Resources(_) => &[],
            Content::RawData(blobs) => blobs,
        }
    }

    fn ensure_mutable(&self) -> Result<()> {
        if self.is_frozen() {
            Err(Error::ContainerFrozen)
        } else {
            Ok(())
        }
    }

    /// Register a resource.
    ///
    /// Each (type, id) pair may only be registered once.
    pub fn add_resource(
        &mut self,
        kind: ResourceType,
        id: u16,
        data: ResourceData<'a>,
    ) -> Result<()> {
        self.ensure_mutable()?;
        check_payload_len(data.len())?;

        let entries = match &mut self.content {
            Content::Resources(entries) => entries,
            Content::RawData(_) => return Err(Error::ContainerKindMismatch("resources")),
        };

        if entries.iter().any(|e| e.kind == kind && e.id == id) {
            return Err(Error::DuplicateResource {
                kind: kind.into(),
                id,
            });
        }

        entries.push(ResourceEntry { kind, id, data });

        Ok(())
    }

    /// Add a blob to a raw data object under an external symbol.
    pub fn add_data(&mut self, symbol: impl ToString, data: SizedSource<'a>) -> Result<()> {
        self.ensure_mutable()?;
        check_payload_len(data.len())?;

        match &mut self.content {
            Content::RawData(blobs) => {
                blobs.push(DataBlob {
                    symbol: symbol.to_string(),
                    data,
                });

                Ok(())
            }
            Content::Resources(_) => Err(Error::ContainerKindMismatch("raw data")),
        }
    }

    /// Compute the final layout. No content can be added afterwards.
    pub fn freeze(&mut self) -> Result<()> {
        self.ensure_mutable()?;

        let layout = match &self.content {
            Content::Resources(entries) => layout_resources(self.architecture, entries)?,
            Content::RawData(blobs) => layout_raw_data(self.architecture, blobs)?,
        };

        debug!(
            "froze {} section: {} bytes of raw data, {} relocations, {} symbols",
            String::from_utf8_lossy(&layout.section_header.name).trim_end_matches('\0'),
            layout.section_header.size_of_raw_data,
            layout.relocations.len(),
            layout.symbols.len()
        );

        self.layout = Some(layout);

        Ok(())
    }

    /// Total size of the object file. Requires a frozen instance.
    pub fn file_size(&self) -> Result<u64> {
        if !self.is_frozen() {
            return Err(Error::ContainerNotFrozen);
        }

        Ok(nodes_size(&self.nodes()))
    }

    /// Write the object file. Requires a frozen instance.
    ///
    /// Returns the number of bytes written.
    pub fn write_to<W: Write>(&self, dest: &mut W) -> Result<u64> {
        if !self.is_frozen() {
            return Err(Error::ContainerNotFrozen);
        }

        write_tree(self, dest)
    }
}

impl<'a> ResourceSink<'a> for Coff<'a> {
    fn add_resource(&mut self, kind: ResourceType, id: u16, data: ResourceData<'a>) -> Result<()> {
        Coff::add_resource(self, kind, id, data)
    }
}

impl<'a> Tree for Coff<'a> {
    fn collect_nodes<'n>(&'n self, nodes: &mut Vec<Node<'n>>) {
        let layout = match &self.layout {
            Some(layout) => layout,
            None => return,
        };

        nodes.push(Node::Fixed(&layout.file_header));
        nodes.push(Node::Fixed(&layout.section_header));

        for table in &layout.directories {
            nodes.push(Node::Fixed(table));
        }
        nodes.push(Node::Fixed(&layout.data_entries));

        for (index, padding) in &layout.data_order {
            match &self.content {
                Content::Resources(entries) => nodes.push(entries[*index].data.node()),
                Content::RawData(blobs) => nodes.push(Node::Payload(&blobs[*index].data)),
            }
            nodes.push(Node::Fixed(padding));
        }

        nodes.push(Node::Fixed(&layout.relocations));
        nodes.push(Node::Fixed(&layout.symbols));
        nodes.push(Node::Fixed(&layout.string_table));
    }
}

fn check_payload_len(len: u64) -> Result<()> {
    if len > u32::MAX as u64 {
        Err(Error::PayloadTooLarge(len))
    } else {
        Ok(())
    }
}

fn to_u32(value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::PayloadTooLarge(value))
}

/// Offset of raw section data in the file: one file header, one section header.
const RAW_DATA_POINTER: u64 = FileHeader::SIZE + SectionHeader::SIZE;

fn layout_resources(architecture: Architecture, entries: &[ResourceEntry<'_>]) -> Result<Layout> {
    // Leaves sorted by type then id; the sort is stable.
    let mut leaves = (0..entries.len()).collect::<Vec<_>>();
    leaves.sort_by_key(|i| entries[*i].sort_key());

    let mut types: Vec<(u32, Vec<usize>)> = vec![];
    for index in leaves {
        let kind = u32::from(entries[index].kind);
        if let Some((last, members)) = types.last_mut() {
            if *last == kind {
                members.push(index);
                continue;
            }
        }
        types.push((kind, vec![index]));
    }

    let leaf_table_size = DirectoryTable::size_for(1);
    let directories_size = DirectoryTable::size_for(types.len())
        + types
            .iter()
            .map(|(_, members)| {
                DirectoryTable::size_for(members.len()) + leaf_table_size * members.len() as u64
            })
            .sum::<u64>();

    let data_entries_offset = directories_size;

    // Depth-first: root, then each type table followed by its id tables.
    let mut root_entries = Vec::with_capacity(types.len());
    let mut subtables = vec![];
    let mut cursor = DirectoryTable::size_for(types.len());
    let mut leaf = 0u64;

    for (kind, members) in &types {
        root_entries.push(DirectoryEntry {
            name_or_id: *kind,
            offset_to_data: SUBDIRECTORY | to_u32(cursor)?,
        });
        cursor += DirectoryTable::size_for(members.len());

        let mut id_entries = Vec::with_capacity(members.len());
        let mut id_tables = Vec::with_capacity(members.len());

        for index in members {
            id_entries.push(DirectoryEntry {
                name_or_id: entries[*index].id as u32,
                offset_to_data: SUBDIRECTORY | to_u32(cursor)?,
            });
            cursor += leaf_table_size;

            id_tables.push(DirectoryTable::with_id_entries(vec![DirectoryEntry {
                name_or_id: LANGUAGE_ID,
                offset_to_data: to_u32(data_entries_offset + DataEntry::SIZE * leaf)?,
            }]));
            leaf += 1;
        }

        subtables.push(DirectoryTable::with_id_entries(id_entries));
        subtables.extend(id_tables);
    }

    let mut directories = vec![DirectoryTable::with_id_entries(root_entries)];
    directories.extend(subtables);

    let ordered = types
        .into_iter()
        .flat_map(|(_, members)| members)
        .collect::<Vec<_>>();

    let relocation_type = architecture.image_relative_relocation();
    let mut offset = data_entries_offset + DataEntry::SIZE * ordered.len() as u64;
    let mut data_entries = Vec::with_capacity(ordered.len());
    let mut data_order = Vec::with_capacity(ordered.len());
    let mut relocations = Vec::with_capacity(ordered.len());

    for (leaf, index) in ordered.into_iter().enumerate() {
        let len = entries[index].data.len();

        data_entries.push(DataEntry {
            offset_to_data: to_u32(offset)?,
            size: to_u32(len)?,
            ..Default::default()
        });

        // The linker adds the section's RVA to each OffsetToData.
        relocations.push(Relocation {
            virtual_address: to_u32(data_entries_offset + DataEntry::SIZE * leaf as u64)?,
            symbol_table_index: 0,
            kind: relocation_type,
        });

        offset += len;
        let padding = Padding::to_align(offset, RESOURCE_DATA_ALIGNMENT);
        offset += padding.layout_size();
        data_order.push((index, padding));
    }

    let size_of_raw_data = to_u32(offset)?;
    let number_of_relocations =
        u16::try_from(relocations.len()).map_err(|_| Error::TooManyResources(relocations.len()))?;
    let pointer_to_relocations = RAW_DATA_POINTER + offset;
    let pointer_to_symbol_table =
        pointer_to_relocations + Relocation::SIZE * relocations.len() as u64;

    let symbols = vec![Symbol {
        name: SECTION_RSRC,
        value: 0,
        section_number: 1,
        kind: 0,
        storage_class: STORAGE_CLASS_STATIC,
        number_of_aux_symbols: 0,
    }];

    Ok(Layout {
        file_header: FileHeader {
            machine: architecture.machine(),
            number_of_sections: 1,
            time_date_stamp: 0,
            pointer_to_symbol_table: to_u32(pointer_to_symbol_table)?,
            number_of_symbols: symbols.len() as u32,
            size_of_optional_header: 0,
            characteristics: RSRC_FILE_CHARACTERISTICS,
        },
        section_header: SectionHeader {
            name: SECTION_RSRC,
            size_of_raw_data,
            pointer_to_raw_data: RAW_DATA_POINTER as u32,
            pointer_to_relocations: to_u32(pointer_to_relocations)?,
            number_of_relocations,
            characteristics: SECTION_CHARACTERISTICS,
            ..Default::default()
        },
        directories,
        data_entries,
        data_order,
        relocations,
        symbols,
        string_table: StringTable::default(),
    })
}

fn layout_raw_data(architecture: Architecture, blobs: &[DataBlob<'_>]) -> Result<Layout> {
    let mut string_table = StringTable::default();
    let mut symbols = vec![Symbol {
        name: SECTION_RDATA,
        value: 0,
        section_number: 1,
        kind: 0,
        storage_class: STORAGE_CLASS_STATIC,
        number_of_aux_symbols: 0,
    }];

    // Blobs are contiguous so adjacent symbols delimit each blob exactly.
    let mut offset = 0u64;
    let mut data_order = Vec::with_capacity(blobs.len());

    for (index, blob) in blobs.iter().enumerate() {
        symbols.push(Symbol {
            name: string_table.symbol_name(&blob.symbol),
            value: to_u32(offset)?,
            section_number: 1,
            kind: 0,
            storage_class: STORAGE_CLASS_EXTERNAL,
            number_of_aux_symbols: 0,
        });

        offset += blob.data.len();
        data_order.push((index, Padding(0)));
    }

    let size_of_raw_data = to_u32(offset)?;
    let pointer_to_symbol_table = RAW_DATA_POINTER + offset;

    Ok(Layout {
        file_header: FileHeader {
            machine: architecture.machine(),
            number_of_sections: 1,
            time_date_stamp: 0,
            pointer_to_symbol_table: to_u32(pointer_to_symbol_table)?,
            number_of_symbols: symbols.len() as u32,
            size_of_optional_header: 0,
            characteristics: RDATA_FILE_CHARACTERISTICS,
        },
        section_header: SectionHeader {
            name: SECTION_RDATA,
            size_of_raw_data,
            pointer_to_raw_data: RAW_DATA_POINTER as u32,
            characteristics: SECTION_CHARACTERISTICS,
            ..Default::default()
        },
        directories: vec![],
        data_entries: vec![],
        data_order,
        relocations: vec![],
        symbols,
        string_table,
    })
}
