use super::ReadAt;
use anyhow::Result;
use async_trait::async_trait;

/// In-memory reader over an owned byte buffer.
pub struct SliceReader {
    data: Vec<u8>,
}

impl SliceReader {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }
}

#[async_trait]
impl ReadAt for SliceReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= self.data.len() {
            return Ok(0);
        }
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn short_read_at_the_end() {
        let reader = SliceReader::new(b"abc".to_vec());
        let mut buf = [0u8; 8];
        assert_eq!(reader.read_at(1, &mut buf).await.unwrap(), 2);
        assert_eq!(&buf[..2], b"bc");
        assert_eq!(reader.read_at(5, &mut buf).await.unwrap(), 0);
    }
}
