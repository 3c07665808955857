use std::{
    fs::{File, OpenOptions},
    io,
    os::unix::fs::{FileExt, OpenOptionsExt},
    path::{Path, PathBuf},
    sync::Mutex,
};

use log::{debug, trace};

use crate::file::page::Page;

/// Read side of a single block file.
///
/// The file is opened once; every byte stream handed out is a clone of that handle
/// and reads with positioned I/O, so streams never share a cursor.
pub struct BlockFile {
    path: PathBuf,
    file: Mutex<File>,
}

impl BlockFile {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        debug!("Opening block file {:?}", path);
        let file = OpenOptions::new().read(true).open(&path)?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Creates (or truncates) a block file for writing. Writes are synchronous.
    pub fn create(path: impl AsRef<Path>) -> io::Result<File> {
        let path = path.as_ref();
        debug!("Creating block file {:?}", path);
        OpenOptions::new()
            .custom_flags(libc::O_SYNC)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
    }

    /// Hands out a fresh stream over the block file.
    pub fn stream(&self) -> io::Result<File> {
        let file = self
            .file
            .lock()
            .map_err(|_| io::Error::other("Failed to acquire block file lock"))?;
        trace!("Cloning stream for {:?}", self.path);
        file.try_clone()
    }

    pub fn len(&self) -> io::Result<u64> {
        self.stream()?.metadata().map(|m| m.len())
    }

    /// Fills `page` with the bytes starting at `offset`.
    pub fn read_at(stream: &File, offset: u64, page: &mut Page) -> io::Result<()> {
        trace!("Reading {} bytes at offset {}", page.len(), offset);
        stream.read_exact_at(page.content_mut(), offset)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {

    use std::io::Write;

    use super::*;

    #[test]
    fn streams_read_independently() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("block");
        let mut out = BlockFile::create(&path).expect("Failed to create block file");
        out.write_all(b"0123456789").expect("Failed to write");
        drop(out);

        let file = BlockFile::open(&path).expect("Failed to open block file");
        assert_eq!(file.len().unwrap(), 10);

        let first = file.stream().unwrap();
        let second = file.stream().unwrap();
        let mut a = Page::with_size(3);
        let mut b = Page::with_size(2);
        BlockFile::read_at(&first, 7, &mut a).unwrap();
        BlockFile::read_at(&second, 0, &mut b).unwrap();
        assert_eq!(a.content(), b"789");
        assert_eq!(b.content(), b"01");
    }

    #[test]
    fn short_read_is_an_error() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("block");
        BlockFile::create(&path).expect("Failed to create block file");

        let file = BlockFile::open(&path).unwrap();
        let mut page = Page::with_size(4);
        let err = BlockFile::read_at(&file.stream().unwrap(), 0, &mut page).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn open_missing_file_fails() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        assert!(BlockFile::open(dir.path().join("missing")).is_err());
    }
}
