use crate::{Error, Lsn, PasteRecord, Result};
use bytes::{BufMut, BytesMut};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;

const LOG_HEADER_SIZE: usize = 16;
const LOG_MAGIC: u32 = 0x454D4200; // "EMB\0"
const FRAME_HEADER_SIZE: usize = 12; // lsn(8) + len(4)

/// Append-only paste log.
/// Format: [magic(4) | version(4) | reserved(8)] [frame...]
/// Frame: [lsn(8) | len(4) | data | crc(4)]
///
/// `append` buffers frames; `flush` writes them in one batch (group commit).
/// A failed flush must not resurface later, so callers abort a commit with
/// `discard_pending`.
pub struct Wal {
    inner: Arc<Mutex<WalInner>>,
}

struct WalInner {
    file: File,
    next_lsn: Lsn,
    pending: Vec<PasteRecord>,
    sync_on_flush: bool,
}

impl Wal {
    /// Create a new log file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        // Write header (big-endian for magic, rest doesn't matter)
        let mut header = BytesMut::with_capacity(LOG_HEADER_SIZE);
        header.put_u32(LOG_MAGIC); // big-endian for magic
        header.put_u32_le(1); // version
        header.put_u64_le(0); // reserved
        file.write_all(&header)?;
        file.sync_all()?;

        Ok(Self {
            inner: Arc::new(Mutex::new(WalInner {
                file,
                next_lsn: 1,
                pending: Vec::new(),
                sync_on_flush: true,
            })),
        })
    }

    /// Open an existing log file.
    ///
    /// Scans to the end of the last complete, CRC-valid frame. Anything
    /// after that point is a torn write from a crash and is truncated away,
    /// so the next flush can never append behind torn bytes. A complete
    /// frame with a bad checksum is real corruption and refuses to open.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;

        // Verify header
        let mut header = [0u8; LOG_HEADER_SIZE];
        file.read_exact(&mut header)?;
        let magic = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        if magic != LOG_MAGIC {
            return Err(Error::Corruption("Invalid log magic".to_string()));
        }

        file.seek(SeekFrom::Start(LOG_HEADER_SIZE as u64))?;
        let mut max_lsn = 0u64;
        let mut valid_end = LOG_HEADER_SIZE as u64;

        loop {
            let mut frame_header = [0u8; FRAME_HEADER_SIZE];
            if !read_fully(&mut file, &mut frame_header)? {
                break; // torn tail
            }
            let lsn = u64::from_le_bytes([
                frame_header[0],
                frame_header[1],
                frame_header[2],
                frame_header[3],
                frame_header[4],
                frame_header[5],
                frame_header[6],
                frame_header[7],
            ]);
            let len = u32::from_le_bytes([
                frame_header[8],
                frame_header[9],
                frame_header[10],
                frame_header[11],
            ]) as usize;

            let mut data = vec![0u8; len];
            if !read_fully(&mut file, &mut data)? {
                break; // torn tail
            }
            let mut crc_bytes = [0u8; 4];
            if !read_fully(&mut file, &mut crc_bytes)? {
                break; // torn tail
            }
            if u32::from_le_bytes(crc_bytes) != crc32fast::hash(&data) {
                return Err(Error::ChecksumMismatch);
            }

            // Only complete frames count toward the LSN sequence
            max_lsn = max_lsn.max(lsn);
            valid_end += (FRAME_HEADER_SIZE + len + 4) as u64;
        }

        if file.metadata()?.len() > valid_end {
            file.set_len(valid_end)?;
            file.sync_all()?;
        }

        Ok(Self {
            inner: Arc::new(Mutex::new(WalInner {
                file,
                next_lsn: max_lsn + 1,
                pending: Vec::new(),
                sync_on_flush: true,
            })),
        })
    }

    /// Append a record (buffered, not yet durable)
    pub fn append(&self, record: PasteRecord) -> Result<Lsn> {
        let mut inner = self.inner.lock();
        let lsn = inner.next_lsn;
        inner.next_lsn += 1;
        inner.pending.push(record);
        Ok(lsn)
    }

    /// Flush pending records to disk (group commit).
    /// On failure any partial write is truncated away, so the file never
    /// carries a torn frame in front of later commits.
    pub fn flush(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.pending.is_empty() {
            return Ok(());
        }

        // Seek to end
        let start = inner.file.seek(SeekFrom::End(0))?;

        // Prepare all frames into a single buffer
        let mut full_buf = BytesMut::new();
        let base_lsn = inner.next_lsn - inner.pending.len() as u64;

        for (i, record) in inner.pending.iter().enumerate() {
            let lsn = base_lsn + i as u64;

            let data = bincode::serialize(record)
                .map_err(|e| Error::Internal(format!("Serialize error: {}", e)))?;
            let crc = crc32fast::hash(&data);

            full_buf.put_u64_le(lsn);
            full_buf.put_u32_le(data.len() as u32);
            full_buf.put_slice(&data);
            full_buf.put_u32_le(crc);
        }

        // Write all at once
        if let Err(e) = write_and_sync(&mut inner, &full_buf) {
            let _ = inner.file.set_len(start);
            return Err(e);
        }
        inner.pending.clear();

        Ok(())
    }

    /// Drop buffered records without writing them.
    /// Used to abort a commit whose flush failed partway.
    pub fn discard_pending(&self) {
        let mut inner = self.inner.lock();
        let dropped = inner.pending.len();
        inner.pending.clear();
        inner.next_lsn -= dropped as u64;
    }

    /// Read all records from the log.
    ///
    /// A frame cut short by a crash ends the scan and the prefix is returned;
    /// a complete frame whose checksum disagrees is real corruption and fails.
    pub fn read_all(&self) -> Result<Vec<(Lsn, PasteRecord)>> {
        let inner = self.inner.lock();
        let mut file = inner.file.try_clone()?;
        drop(inner);

        file.seek(SeekFrom::Start(LOG_HEADER_SIZE as u64))?;

        let mut records = Vec::new();
        loop {
            let mut frame_header = [0u8; FRAME_HEADER_SIZE];
            match file.read_exact(&mut frame_header) {
                Ok(_) => {
                    let lsn = u64::from_le_bytes([
                        frame_header[0],
                        frame_header[1],
                        frame_header[2],
                        frame_header[3],
                        frame_header[4],
                        frame_header[5],
                        frame_header[6],
                        frame_header[7],
                    ]);
                    let len = u32::from_le_bytes([
                        frame_header[8],
                        frame_header[9],
                        frame_header[10],
                        frame_header[11],
                    ]) as usize;

                    let mut data = vec![0u8; len];
                    if !read_fully(&mut file, &mut data)? {
                        break; // torn tail
                    }

                    let mut crc_bytes = [0u8; 4];
                    if !read_fully(&mut file, &mut crc_bytes)? {
                        break; // torn tail
                    }
                    let expected_crc = u32::from_le_bytes(crc_bytes);
                    let actual_crc = crc32fast::hash(&data);

                    if expected_crc != actual_crc {
                        return Err(Error::ChecksumMismatch);
                    }

                    let record: PasteRecord = bincode::deserialize(&data)
                        .map_err(|e| Error::Corruption(format!("Deserialize error: {}", e)))?;

                    records.push((lsn, record));
                }
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(records)
    }

    pub fn next_lsn(&self) -> Lsn {
        self.inner.lock().next_lsn
    }

    /// Size of the log file in bytes
    pub fn size_bytes(&self) -> Result<u64> {
        Ok(self.inner.lock().file.metadata()?.len())
    }

    pub(crate) fn set_sync_on_flush(&self, enabled: bool) {
        self.inner.lock().sync_on_flush = enabled;
    }
}

fn write_and_sync(inner: &mut WalInner, buf: &[u8]) -> Result<()> {
    inner.file.write_all(buf)?;
    if inner.sync_on_flush {
        inner.file.sync_all()?;
    }
    Ok(())
}

/// Like `read_exact`, but reports a clean EOF as `Ok(false)` so torn tails
/// can be treated as end-of-log rather than an error.
fn read_fully(file: &mut File, buf: &mut [u8]) -> Result<bool> {
    match file.read_exact(buf) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}
