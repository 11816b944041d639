use std::{
    fs::{File, OpenOptions},
    io::{ErrorKind, Write},
    path::Path,
};

use crate::error::{Result, ShelfError};

use super::FileIO;

pub(crate) struct StdIO {
    fd: File,
}

impl StdIO {
    pub(crate) fn new(file_path: &Path) -> Result<Self> {
        let fd = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(file_path)?;
        Ok(Self { fd })
    }

    #[cfg(unix)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
        use std::os::unix::fs::FileExt;
        self.fd.read_at(buf, offset)
    }

    #[cfg(windows)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
        use std::os::windows::fs::FileExt;
        self.fd.seek_read(buf, offset)
    }
}

impl FileIO for StdIO {
    fn read(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read_at(&mut buf[filled..], offset + filled as u64) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ShelfError::Io(e)),
            }
        }
        Ok(filled)
    }

    fn write(&self, buf: &[u8]) -> Result<usize> {
        (&self.fd).write_all(buf).map_err(ShelfError::Io)?;
        Ok(buf.len())
    }

    fn sync(&self) -> Result<()> {
        self.fd.sync_all().map_err(ShelfError::Io)
    }

    fn size(&self) -> Result<u64> {
        Ok(self.fd.metadata()?.len())
    }
}
