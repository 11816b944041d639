mod stdio;

use std::path::Path;

use crate::error::Result;

pub(crate) trait FileIO {
    /// 从 `offset` 开始尽量填满 `buf`，返回实际读取的字节数，到达文件末尾时可能小于 `buf.len()`
    fn read(&self, buf: &mut [u8], offset: u64) -> Result<usize>;

    fn write(&self, buf: &[u8]) -> Result<usize>;

    fn sync(&self) -> Result<()>;

    fn size(&self) -> Result<u64>;
}

pub(crate) fn new_file_io(file_path: &Path) -> Result<impl FileIO> {
    stdio::StdIO::new(file_path)
}
