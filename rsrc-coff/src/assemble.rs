// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Assembly of complete object files from input files.

Resource mode registers a manifest, icon groups and version information in
a fixed order so identical inputs produce identical bytes. Raw data mode
wraps a single file between two external symbols.

Inputs are opened up front by [OpenedInputs::open], before any output
exists. The returned [Coff] borrows the opened files, so they remain open
until it has been written.
*/

use {
    crate::{
        coff::{Coff, ResourceData, ResourceType},
        error::{Error, Result},
        group_icon::{add_icon_group, IconGroup},
        ids::IdAllocator,
        source::{SizedFile, SizedSource},
        version_info::VersionInfo,
    },
    log::warn,
    once_cell::sync::Lazy,
    regex::Regex,
    std::{
        fmt::{Display, Formatter},
        path::{Path, PathBuf},
    },
};

/// Id of the version resource.
///
/// Not drawn from the allocator. Only one version resource exists, so its
/// (type, id) pair cannot clash with another resource.
pub const VERSION_RESOURCE_ID: u16 = 1;

/// Suffix of output files.
pub const OUTPUT_SUFFIX: &str = ".syso";

/// Valid symbol names for raw data objects.
static RE_SYMBOL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9_]+$").unwrap());

/// Trailer stored after the end marker of raw data objects.
const RAW_DATA_TRAILER: &[u8] = b"\0\0";

/// Paths of the inputs to resource mode.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceInputs {
    pub manifest: Option<PathBuf>,
    /// Icon files, registered in this order.
    pub icons: Vec<PathBuf>,
    /// goversioninfo style JSON.
    pub version: Option<PathBuf>,
}

impl ResourceInputs {
    /// Whether no input is given.
    pub fn is_empty(&self) -> bool {
        self.manifest.is_none() && self.icons.is_empty() && self.version.is_none()
    }

    /// Append icon paths from a comma separated list.
    pub fn add_icon_list(&mut self, value: &str) {
        self.icons.extend(
            value
                .split(',')
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        );
    }
}

/// Inputs to resource mode, opened and parsed.
#[derive(Debug)]
pub struct OpenedInputs {
    manifest: Option<SizedFile>,
    icons: Vec<SizedFile>,
    version: Option<Vec<u8>>,
}

impl OpenedInputs {
    /// Open every input file and build the version resource.
    pub fn open(inputs: &ResourceInputs) -> Result<Self> {
        let manifest = inputs.manifest.as_ref().map(SizedFile::open).transpose()?;

        let icons = inputs
            .icons
            .iter()
            .map(SizedFile::open)
            .collect::<Result<Vec<_>>>()?;

        let version = if let Some(path) = &inputs.version {
            let data = std::fs::read(path).map_err(|e| Error::IoPath(path.clone(), e))?;

            Some(VersionInfo::parse_json(&data)?.build()?)
        } else {
            None
        };

        Ok(Self {
            manifest,
            icons,
            version,
        })
    }
}

/// A registration step performed by [assemble_resources].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Registration {
    Manifest {
        path: PathBuf,
        id: u16,
    },
    IconGroup {
        path: PathBuf,
        group: IconGroup,
    },
    /// An icon file without images. Nothing was registered for it.
    EmptyIconFile {
        path: PathBuf,
    },
    Version {
        id: u16,
    },
}

impl Display for Registration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manifest { path, id } => write!(f, "manifest {} has id {}", path.display(), id),
            Self::IconGroup { path, group } => write!(
                f,
                "icon {} has group id {} and image ids {:?}",
                path.display(),
                group.group_id,
                group.image_ids
            ),
            Self::EmptyIconFile { path } => write!(f, "icon {} has no images", path.display()),
            Self::Version { id } => write!(f, "version info has id {}", id),
        }
    }
}

/// What [assemble_resources] registered, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    registrations: Vec<Registration>,
}

impl AssemblyReport {
    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    fn push(&mut self, registration: Registration) {
        self.registrations.push(registration);
    }
}

/// Build a frozen resources object from opened inputs.
///
/// Resources are registered as: the manifest, then the images and group of
/// each icon file in order, then version information.
pub fn assemble_resources<'a>(
    inputs: &'a OpenedInputs,
    architecture: &str,
) -> Result<(Coff<'a>, AssemblyReport)> {
    let mut coff = Coff::new_resources();
    coff.set_architecture(architecture)?;

    let mut ids = IdAllocator::new();
    let mut report = AssemblyReport::default();

    if let Some(manifest) = &inputs.manifest {
        let id = ids.allocate()?;
        coff.add_resource(
            ResourceType::Manifest,
            id,
            ResourceData::Source(manifest.source()),
        )?;

        report.push(Registration::Manifest {
            path: manifest.path().to_path_buf(),
            id,
        });
    }

    for icon in &inputs.icons {
        let path = icon.path().to_path_buf();

        match add_icon_group(icon, &mut ids, &mut coff)? {
            Some(group) => report.push(Registration::IconGroup { path, group }),
            None => {
                warn!("{} contains no images; ignoring", path.display());
                report.push(Registration::EmptyIconFile { path });
            }
        }
    }

    if let Some(version) = &inputs.version {
        coff.add_resource(
            ResourceType::Version,
            VERSION_RESOURCE_ID,
            ResourceData::Source(SizedSource::from(version.as_slice())),
        )?;

        report.push(Registration::Version {
            id: VERSION_RESOURCE_ID,
        });
    }

    coff.freeze()?;

    Ok((coff, report))
}

/// Derive the raw data symbol name from an output path.
///
/// The file name must end in `.syso` and the rest must consist of lowercase
/// ASCII letters, digits and underscores.
pub fn raw_data_symbol(output: &Path) -> Result<String> {
    let name = output
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let symbol = name
        .strip_suffix(OUTPUT_SUFFIX)
        .ok_or_else(|| Error::OutputNameSuffix(output.display().to_string()))?;

    if RE_SYMBOL.is_match(symbol) {
        Ok(symbol.to_string())
    } else {
        Err(Error::OutputNameCharacters(output.display().to_string()))
    }
}

/// Name of the symbol marking the start of raw data.
pub fn begin_symbol(symbol: &str) -> String {
    format!("_brsrc_{}", symbol)
}

/// Name of the symbol marking the end of raw data.
pub fn end_symbol(symbol: &str) -> String {
    format!("_ersrc_{}", symbol)
}

/// Build a frozen raw data object holding the content of `data`.
pub fn package_raw_data<'a>(
    data: &'a SizedFile,
    symbol: &str,
    architecture: &str,
) -> Result<Coff<'a>> {
    let mut coff = Coff::new_raw_data();
    coff.set_architecture(architecture)?;

    coff.add_data(begin_symbol(symbol), data.source())?;
    coff.add_data(end_symbol(symbol), SizedSource::from(RAW_DATA_TRAILER))?;
    coff.freeze()?;

    Ok(coff)
}

/// C source declaring an accessor for raw data packaged under `symbol`.
pub fn raw_data_accessor_template(symbol: &str) -> String {
    r#"#include <stddef.h>

extern unsigned char _brsrc_NAME[], _ersrc_NAME;

/* Returns the embedded data and stores its length in len. */
const unsigned char *get_NAME(size_t *len) {
  *len = (size_t)(&_ersrc_NAME - _brsrc_NAME);
  return _brsrc_NAME;
}"#
    .replace("NAME", symbol)
}
