// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Byte sources of known length.

Resource payloads are not read into memory when a container is assembled.
Instead, a [SizedSource] remembers where the bytes live and they are copied
to the destination while the object file is written. File backed sources
borrow a [SizedFile], so the handle is guaranteed to stay open until
serialization has finished and is closed when its owner drops it.
*/

use {
    crate::{
        error::{Error, Result},
        tree::StreamPayload,
    },
    std::{
        borrow::Cow,
        fs::File,
        io::{Read, Seek, SeekFrom, Write},
        path::{Path, PathBuf},
    },
};

/// An open file along with its length at the time it was opened.
#[derive(Debug)]
pub struct SizedFile {
    path: PathBuf,
    file: File,
    len: u64,
}

impl SizedFile {
    /// Open a file for reading and record its length.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = File::open(&path).map_err(|e| Error::IoPath(path.clone(), e))?;
        let len = file
            .metadata()
            .map_err(|e| Error::IoPath(path.clone(), e))?
            .len();

        Ok(Self { path, file, len })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn len(&self) -> u64 {
        self.len
    }

    /// Obtain a reader positioned at the beginning of the file.
    pub fn rewound(&self) -> Result<&File> {
        let mut handle = &self.file;
        handle
            .seek(SeekFrom::Start(0))
            .map_err(|e| Error::IoPath(self.path.clone(), e))?;

        Ok(handle)
    }

    /// A source covering the entire file.
    pub fn source(&self) -> SizedSource<'_> {
        self.region(0, self.len)
    }

    /// A source covering `len` bytes starting at `offset`.
    pub fn region(&self, offset: u64, len: u64) -> SizedSource<'_> {
        SizedSource::FileRegion {
            file: &self.file,
            offset,
            len,
        }
    }
}

/// A byte range of known length, either in a file or in memory.
#[derive(Clone, Debug)]
pub enum SizedSource<'a> {
    FileRegion { file: &'a File, offset: u64, len: u64 },
    Memory(Cow<'a, [u8]>),
}

impl<'a> From<Vec<u8>> for SizedSource<'a> {
    fn from(data: Vec<u8>) -> Self {
        Self::Memory(Cow::Owned(data))
    }
}

impl<'a> From<&'a [u8]> for SizedSource<'a> {
    fn from(data: &'a [u8]) -> Self {
        Self::Memory(Cow::Borrowed(data))
    }
}

impl<'a> SizedSource<'a> {
    /// Length in bytes.
    pub fn len(&self) -> u64 {
        match self {
            Self::FileRegion { len, .. } => *len,
            Self::Memory(data) => data.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy the bytes of this source to a writer.
    ///
    /// File regions are streamed through a fixed size buffer. Exactly
    /// [Self::len] bytes are written or an error is returned.
    pub fn copy_to(&self, dest: &mut dyn Write) -> Result<u64> {
        match self {
            Self::FileRegion { file, offset, len } => {
                let mut handle: &File = file;
                handle.seek(SeekFrom::Start(*offset))?;

                let copied = std::io::copy(&mut handle.take(*len), dest)?;
                if copied != *len {
                    return Err(Error::PayloadShortRead {
                        expected: *len,
                        actual: copied,
                    });
                }

                Ok(copied)
            }
            Self::Memory(data) => {
                dest.write_all(data)?;
                Ok(data.len() as u64)
            }
        }
    }
}

impl<'a> StreamPayload for SizedSource<'a> {
    fn payload_len(&self) -> u64 {
        self.len()
    }

    fn stream_to(&self, dest: &mut dyn Write) -> Result<()> {
        self.copy_to(dest)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::io::Write};

    fn temp_file_with(data: &[u8]) -> Result<tempfile::NamedTempFile> {
        let mut f = tempfile::NamedTempFile::new()?;
        f.write_all(data)?;
        f.flush()?;

        Ok(f)
    }

    #[test]
    fn open_records_length() -> Result<()> {
        let temp = temp_file_with(b"hello, world")?;
        let file = SizedFile::open(temp.path())?;

        assert_eq!(file.len(), 12);
        assert_eq!(file.path(), temp.path());
        assert_eq!(file.source().len(), 12);

        Ok(())
    }

    #[test]
    fn open_missing_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.ico");

        match SizedFile::open(&missing) {
            Err(Error::IoPath(path, _)) => assert_eq!(path, missing),
            res => panic!("unexpected result: {:?}", res),
        }
    }

    #[test]
    fn region_copies_exact_bytes() -> Result<()> {
        let temp = temp_file_with(b"0123456789abcdef")?;
        let file = SizedFile::open(temp.path())?;

        let mut dest = Vec::new();
        assert_eq!(file.region(4, 6).copy_to(&mut dest)?, 6);
        assert_eq!(dest, b"456789");

        // Regions can be read repeatedly and in any order.
        dest.clear();
        file.region(0, 2).copy_to(&mut dest)?;
        file.region(14, 2).copy_to(&mut dest)?;
        assert_eq!(dest, b"01ef");

        Ok(())
    }

    #[test]
    fn region_past_end_is_an_error() -> Result<()> {
        let temp = temp_file_with(b"short")?;
        let file = SizedFile::open(temp.path())?;

        let mut dest = Vec::new();
        assert!(matches!(
            file.region(2, 10).copy_to(&mut dest),
            Err(Error::PayloadShortRead {
                expected: 10,
                actual: 3
            })
        ));

        Ok(())
    }

    #[test]
    fn memory_source() -> Result<()> {
        let source = SizedSource::from(b"abc".to_vec());
        assert_eq!(source.len(), 3);

        let mut dest = Vec::new();
        source.copy_to(&mut dest)?;
        assert_eq!(dest, b"abc");

        Ok(())
    }
}
