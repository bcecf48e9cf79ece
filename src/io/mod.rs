mod local;
mod slice;

pub use local::LocalFileReader;
pub use slice::SliceReader;

use anyhow::{Result, bail};
use async_trait::async_trait;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Fill `buf` completely from `offset`, failing on a short read.
    ///
    /// Archive structures are addressed by absolute offsets taken from the
    /// archive itself, so a range past the end means the container is
    /// truncated or lying about its layout.
    async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let end = offset.checked_add(buf.len() as u64);
        if end.is_none_or(|end| end > self.size()) {
            bail!(
                "Read of {} bytes at offset {} exceeds archive size {}",
                buf.len(),
                offset,
                self.size()
            );
        }

        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..]).await?;
            if n == 0 {
                bail!("Unexpected end of archive at offset {}", offset + filled as u64);
            }
            filled += n;
        }
        Ok(())
    }
}
