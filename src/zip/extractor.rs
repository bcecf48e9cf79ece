use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use flate2::Crc;
use flate2::write::DeflateDecoder;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::io::ReadAt;

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Compressed bytes read from the archive per step.
const CHUNK_SIZE: usize = 32 * 1024;

/// Why a single member could not be streamed out.
///
/// The split matters to callers: `Data` means the archive is at fault,
/// `Write` means the destination is.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("{0:#}")]
    Data(anyhow::Error),
    #[error(transparent)]
    Write(#[from] std::io::Error),
}

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all members in central directory order
    pub async fn list_files(&self) -> anyhow::Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Stream one member's decompressed bytes into `writer`.
    ///
    /// Data is read in bounded chunks, inflated when the member is
    /// DEFLATE-compressed, and checked against the declared size and
    /// CRC-32 once the stream ends. Output is cut off as soon as it would
    /// exceed the declared size.
    ///
    /// Returns the number of bytes written.
    pub async fn extract_to_writer<W>(
        &self,
        entry: &ZipFileEntry,
        writer: &mut W,
    ) -> Result<u64, StreamError>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        if entry.is_encrypted() {
            return Err(StreamError::Data(anyhow!(
                "Encrypted member {} is not supported",
                entry.file_name
            )));
        }

        let mut inflater = match entry.compression_method {
            CompressionMethod::Stored => None,
            CompressionMethod::Deflate => Some(DeflateDecoder::new(Vec::new())),
            CompressionMethod::Unknown(method) => {
                return Err(StreamError::Data(anyhow!(
                    "Unsupported compression method {} for {} (only STORED and DEFLATE are supported)",
                    method,
                    entry.file_name
                )));
            }
        };

        let data_offset = self
            .parser
            .get_data_offset(entry)
            .await
            .map_err(StreamError::Data)?;
        let data_end = data_offset + entry.compressed_size;

        let mut out = Output {
            crc: Crc::new(),
            written: 0,
            limit: entry.uncompressed_size,
            name: &entry.file_name,
        };
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut offset = data_offset;

        while offset < data_end {
            let n = ((data_end - offset) as usize).min(buf.len());
            self.parser
                .reader()
                .read_exact_at(offset, &mut buf[..n])
                .await
                .map_err(StreamError::Data)?;
            offset += n as u64;

            match inflater.as_mut() {
                None => out.emit(writer, &buf[..n]).await?,
                Some(inflater) => {
                    inflater
                        .write_all(&buf[..n])
                        .map_err(|e| corrupt(entry, e))?;
                    out.emit(writer, inflater.get_ref()).await?;
                    inflater.get_mut().clear();
                }
            }
        }

        if let Some(inflater) = inflater.as_mut() {
            inflater.try_finish().map_err(|e| corrupt(entry, e))?;
            out.emit(writer, inflater.get_ref()).await?;
        }
        writer.flush().await?;

        if out.written != entry.uncompressed_size {
            return Err(StreamError::Data(anyhow!(
                "Size mismatch for {}: expected {} bytes, got {}",
                entry.file_name,
                entry.uncompressed_size,
                out.written
            )));
        }
        if out.crc.sum() != entry.crc32 {
            return Err(StreamError::Data(anyhow!(
                "CRC-32 mismatch for {}: expected {:08x}, got {:08x}",
                entry.file_name,
                entry.crc32,
                out.crc.sum()
            )));
        }

        Ok(out.written)
    }

    /// Extract member data to memory
    #[cfg(test)]
    pub(crate) async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>, StreamError> {
        let mut data = Vec::with_capacity(entry.uncompressed_size.min(1 << 20) as usize);
        self.extract_to_writer(entry, &mut data).await?;
        Ok(data)
    }

    /// Extract member to disk, replacing any existing file at `output_path`.
    pub async fn extract_to_file(
        &self,
        entry: &ZipFileEntry,
        output_path: &Path,
    ) -> Result<u64, StreamError> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut file = fs::File::create(output_path).await?;
        let written = self.extract_to_writer(entry, &mut file).await?;
        file.sync_all().await?;
        Ok(written)
    }
}

struct Output<'a> {
    crc: Crc,
    written: u64,
    limit: u64,
    name: &'a str,
}

impl Output<'_> {
    async fn emit<W>(&mut self, writer: &mut W, bytes: &[u8]) -> Result<(), StreamError>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        if bytes.is_empty() {
            return Ok(());
        }
        if self.written + bytes.len() as u64 > self.limit {
            return Err(StreamError::Data(anyhow!(
                "{} expands beyond its declared size of {} bytes",
                self.name,
                self.limit
            )));
        }
        writer.write_all(bytes).await?;
        self.crc.update(bytes);
        self.written += bytes.len() as u64;
        Ok(())
    }
}

fn corrupt(entry: &ZipFileEntry, err: std::io::Error) -> StreamError {
    StreamError::Data(anyhow!("Corrupt DEFLATE data in {}: {}", entry.file_name, err))
}
