// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Version information resources.

A `VS_VERSIONINFO` resource is built from a JSON description in the format
popularized by goversioninfo:

```json
{
    "FixedFileInfo": {
        "FileVersion": {"Major": 1, "Minor": 2, "Patch": 3, "Build": 4},
        "ProductVersion": {"Major": 1, "Minor": 2, "Patch": 0, "Build": 0},
        "FileFlagsMask": "3f",
        "FileFlags": "00",
        "FileOS": "040004",
        "FileType": "01",
        "FileSubType": "00"
    },
    "StringFileInfo": {
        "CompanyName": "Example Corp",
        "ProductName": "Example"
    },
    "VarFileInfo": {
        "Translation": {"LangID": "0409", "CharsetID": "04B0"}
    }
}
```

Hex fields are bare hex digits. Unknown keys are ignored.
*/

use {
    crate::error::{Error, Result},
    byteorder::{LittleEndian, WriteBytesExt},
    serde::Deserialize,
};

/// `VS_FIXEDFILEINFO` signature.
const FIXED_FILE_INFO_SIGNATURE: u32 = 0xfeef_04bd;
/// `VS_FIXEDFILEINFO` structure version 1.0.
const FIXED_FILE_INFO_VERSION: u32 = 0x0001_0000;

/// A four part version number.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "PascalCase")]
pub struct FileVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
    pub build: u16,
}

impl FileVersion {
    fn most_significant(&self) -> u32 {
        (self.major as u32) << 16 | self.minor as u32
    }

    fn least_significant(&self) -> u32 {
        (self.patch as u32) << 16 | self.build as u32
    }
}

impl std::fmt::Display for FileVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.patch, self.build
        )
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "PascalCase")]
pub struct FixedFileInfo {
    pub file_version: FileVersion,
    pub product_version: FileVersion,
    pub file_flags_mask: String,
    // Some generators emit this key with a trailing space.
    #[serde(alias = "FileFlags ")]
    pub file_flags: String,
    #[serde(rename = "FileOS")]
    pub file_os: String,
    pub file_type: String,
    pub file_sub_type: String,
}

/// Strings of the `StringFileInfo` table. Empty values are omitted.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "PascalCase")]
pub struct StringFileInfo {
    pub comments: String,
    pub company_name: String,
    pub file_description: String,
    pub file_version: String,
    pub internal_name: String,
    pub legal_copyright: String,
    pub legal_trademarks: String,
    pub original_filename: String,
    pub private_build: String,
    pub product_name: String,
    pub product_version: String,
    pub special_build: String,
}

impl StringFileInfo {
    fn pairs(&self) -> [(&'static str, &str); 12] {
        [
            ("Comments", self.comments.as_str()),
            ("CompanyName", self.company_name.as_str()),
            ("FileDescription", self.file_description.as_str()),
            ("FileVersion", self.file_version.as_str()),
            ("InternalName", self.internal_name.as_str()),
            ("LegalCopyright", self.legal_copyright.as_str()),
            ("LegalTrademarks", self.legal_trademarks.as_str()),
            ("OriginalFilename", self.original_filename.as_str()),
            ("PrivateBuild", self.private_build.as_str()),
            ("ProductName", self.product_name.as_str()),
            ("ProductVersion", self.product_version.as_str()),
            ("SpecialBuild", self.special_build.as_str()),
        ]
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Translation {
    #[serde(rename = "LangID")]
    pub lang_id: String,
    #[serde(rename = "CharsetID")]
    pub charset_id: String,
}

impl Default for Translation {
    fn default() -> Self {
        Self {
            // en-US, Unicode.
            lang_id: "0409".to_string(),
            charset_id: "04B0".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "PascalCase")]
pub struct VarFileInfo {
    pub translation: Translation,
}

/// Parsed version information.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "PascalCase")]
pub struct VersionInfo {
    pub fixed_file_info: FixedFileInfo,
    pub string_file_info: StringFileInfo,
    pub var_file_info: VarFileInfo,
}

impl VersionInfo {
    pub fn parse_json(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Build the binary `VS_VERSIONINFO` resource.
    pub fn build(&self) -> Result<Vec<u8>> {
        let fixed = &self.fixed_file_info;
        let lang = parse_hex("LangID", &self.var_file_info.translation.lang_id)?;
        let charset = parse_hex("CharsetID", &self.var_file_info.translation.charset_id)?;
        let lang = u16::try_from(lang).map_err(|_| hex_error("LangID", lang))?;
        let charset = u16::try_from(charset).map_err(|_| hex_error("CharsetID", charset))?;

        let mut value = Vec::with_capacity(52);
        for field in [
            FIXED_FILE_INFO_SIGNATURE,
            FIXED_FILE_INFO_VERSION,
            fixed.file_version.most_significant(),
            fixed.file_version.least_significant(),
            fixed.product_version.most_significant(),
            fixed.product_version.least_significant(),
            parse_hex("FileFlagsMask", &fixed.file_flags_mask)?,
            parse_hex("FileFlags", &fixed.file_flags)?,
            parse_hex("FileOS", &fixed.file_os)?,
            parse_hex("FileType", &fixed.file_type)?,
            parse_hex("FileSubType", &fixed.file_sub_type)?,
            // File date, high then low.
            0,
            0,
        ] {
            value.write_u32::<LittleEndian>(field)?;
        }

        let file_version = fixed.file_version.to_string();
        let product_version = fixed.product_version.to_string();

        let strings = self
            .string_file_info
            .pairs()
            .into_iter()
            .map(|(key, value)| match (key, value) {
                ("FileVersion", "") => (key, file_version.as_str()),
                ("ProductVersion", "") => (key, product_version.as_str()),
                _ => (key, value),
            })
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| Block::text(key, value))
            .collect::<Vec<_>>();

        let mut translation = Vec::with_capacity(4);
        translation.write_u16::<LittleEndian>(lang)?;
        translation.write_u16::<LittleEndian>(charset)?;

        let root = Block::binary("VS_VERSION_INFO", value).with_children(vec![
            Block::text_container("StringFileInfo").with_children(vec![
                Block::text_container(&format!("{:04X}{:04X}", lang, charset))
                    .with_children(strings),
            ]),
            Block::text_container("VarFileInfo")
                .with_children(vec![Block::binary("Translation", translation)]),
        ]);

        let mut data = Vec::new();
        root.encode(&mut data)?;

        Ok(data)
    }
}

fn hex_error(field: &'static str, value: impl ToString) -> Error {
    Error::VersionInfoHex {
        field,
        value: value.to_string(),
    }
}

/// Parse bare hex digits. An empty string is 0.
fn parse_hex(field: &'static str, value: &str) -> Result<u32> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }

    u32::from_str_radix(trimmed, 16).map_err(|_| hex_error(field, value))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ValueKind {
    Binary = 0,
    Text = 1,
}

/// A node of the version information tree.
///
/// Every block is a header (`wLength`, `wValueLength`, `wType`), a NUL
/// terminated UTF-16 key, an optional value and child blocks, each of the
/// last three starting on a 32-bit boundary.
#[derive(Clone, Debug)]
struct Block {
    key: String,
    kind: ValueKind,
    value: Vec<u8>,
    /// In words for text values, in bytes for binary values.
    value_length: u16,
    children: Vec<Block>,
}

impl Block {
    fn binary(key: &str, value: Vec<u8>) -> Self {
        Self {
            key: key.to_string(),
            kind: ValueKind::Binary,
            value_length: value.len() as u16,
            value,
            children: vec![],
        }
    }

    fn text(key: &str, text: &str) -> Self {
        let value = utf16z(text);

        Self {
            key: key.to_string(),
            kind: ValueKind::Text,
            value_length: (value.len() / 2) as u16,
            value,
            children: vec![],
        }
    }

    fn text_container(key: &str) -> Self {
        Self {
            key: key.to_string(),
            kind: ValueKind::Text,
            value: vec![],
            value_length: 0,
            children: vec![],
        }
    }

    fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = children;
        self
    }

    /// Append this block to `dest`, which must end on a 32-bit boundary.
    fn encode(&self, dest: &mut Vec<u8>) -> Result<()> {
        let start = dest.len();

        dest.write_u16::<LittleEndian>(0)?;
        dest.write_u16::<LittleEndian>(self.value_length)?;
        dest.write_u16::<LittleEndian>(self.kind as u16)?;
        dest.extend_from_slice(&utf16z(&self.key));

        if !self.value.is_empty() {
            align(dest);
            dest.extend_from_slice(&self.value);
        }

        for child in &self.children {
            align(dest);
            child.encode(dest)?;
        }

        let len = dest.len() - start;
        let len = u16::try_from(len).map_err(|_| Error::VersionInfoBlockTooLarge {
            key: self.key.clone(),
            len,
        })?;
        dest[start..start + 2].copy_from_slice(&len.to_le_bytes());

        Ok(())
    }
}

fn align(dest: &mut Vec<u8>) {
    while dest.len() % 4 != 0 {
        dest.push(0);
    }
}

/// UTF-16LE encoding with a terminating NUL.
fn utf16z(s: &str) -> Vec<u8> {
    s.encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect()
}
