// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Error handling. */

use {std::path::PathBuf, thiserror::Error};

/// Primary crate error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error on {}: {1}", .0.display())]
    IoPath(PathBuf, std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported architecture: {0}; expected one of 386, amd64, arm, arm64")]
    UnsupportedArchitecture(String),

    #[error("bad ICO header: reserved={reserved}, type={kind}")]
    IcoBadHeader { reserved: u16, kind: u16 },

    #[error("ICO image at offset {offset} with {len} bytes extends past the end of {}", .path.display())]
    IcoImageOutOfBounds {
        path: PathBuf,
        offset: u32,
        len: u32,
    },

    #[error("payload of {0} bytes exceeds the 4 GiB limit of the resource format")]
    PayloadTooLarge(u64),

    #[error("resource identifiers exhausted; at most 65535 can be allocated")]
    IdentifiersExhausted,

    #[error("{0} resources exceed the 65535 relocations a section can hold")]
    TooManyResources(usize),

    #[error("resource of type {kind} with id {id} already registered")]
    DuplicateResource { kind: u32, id: u16 },

    #[error("container is frozen; no further content may be added")]
    ContainerFrozen,

    #[error("container must be frozen before it can be written")]
    ContainerNotFrozen,

    #[error("container does not hold {0}")]
    ContainerKindMismatch(&'static str),

    #[error("output file name '{0}' must end with '.syso'")]
    OutputNameSuffix(String),

    #[error("output file name '{0}' must be composed of only lowercase letters (a-z), digits (0-9) and underscore (_)")]
    OutputNameCharacters(String),

    #[error("payload ended after {actual} of {expected} bytes")]
    PayloadShortRead { expected: u64, actual: u64 },

    #[error("version info block {key} is {len} bytes; at most 65535 are allowed")]
    VersionInfoBlockTooLarge { key: String, len: usize },

    #[error("invalid hex value in version info field {field}: {value}")]
    VersionInfoHex { field: &'static str, value: String },
}

/// Result wrapper for this crate.
pub type Result<T> = std::result::Result<T, Error>;
