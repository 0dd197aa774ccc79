//! Container codec: hides an opaque payload at the tail of a host file.
//!
//! A host file (usually an image) carries at most one trailer:
//!
//! ```text
//! [host bytes (prefix)][payload][payload length: 8 bytes LE][ENVAULT_MEME]
//! ```
//!
//! Image viewers stop reading at the end of the image data, so the
//! trailer does not affect how the cover renders. It is trivially
//! detectable and not meant to resist steganalysis.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::errors::{MemeVaultError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Marker written at the very end of a host file that carries a payload.
pub const MAGIC: &[u8; 12] = b"ENVAULT_MEME";

/// Size of the little-endian payload length field.
const LEN_FIELD: usize = 8;

/// Bytes a trailer adds on top of its payload.
pub const TRAILER_OVERHEAD: usize = LEN_FIELD + MAGIC.len();

// ---------------------------------------------------------------------------
// In-memory codec
// ---------------------------------------------------------------------------

/// Return the payload carried by `host`.
///
/// Strict: a missing marker, a truncated file, or an out-of-range
/// length all yield `PayloadNotFound`; never a partial payload.
pub fn extract(host: &[u8]) -> Result<&[u8]> {
    let span = locate(host).ok_or_else(|| {
        MemeVaultError::PayloadNotFound("no valid trailer at end of file".into())
    })?;
    Ok(&host[span.payload_start..span.payload_end])
}

/// Build the trailer block for `payload`: payload, length, marker.
pub fn trailer(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(payload.len() + TRAILER_OVERHEAD);
    buf.extend_from_slice(payload);
    buf.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    buf.extend_from_slice(MAGIC);
    buf
}

/// Concatenate `prefix` and the trailer for `payload`.
pub fn seal(prefix: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(prefix.len() + payload.len() + TRAILER_OVERHEAD);
    buf.extend_from_slice(prefix);
    buf.extend_from_slice(&trailer(payload));
    buf
}

/// Return the clean prefix of `host` (the whole slice if no trailer).
pub fn strip_trailer(host: &[u8]) -> &[u8] {
    match locate(host) {
        Some(span) => &host[..span.payload_start],
        None => host,
    }
}

/// Returns `true` if `host` ends with a valid trailer.
pub fn has_trailer(host: &[u8]) -> bool {
    locate(host).is_some()
}

/// Byte offsets of a trailer's payload inside a host buffer.
struct Span {
    payload_start: usize,
    payload_end: usize,
}

fn locate(host: &[u8]) -> Option<Span> {
    let size = host.len();
    if size < TRAILER_OVERHEAD {
        return None;
    }

    let magic_start = size - MAGIC.len();
    if &host[magic_start..] != MAGIC {
        return None;
    }

    let len_start = magic_start - LEN_FIELD;
    let len_bytes: [u8; LEN_FIELD] = host[len_start..magic_start].try_into().ok()?;
    let payload_len = checked_payload_len(u64::from_le_bytes(len_bytes), size as u64)?;

    Some(Span {
        payload_start: len_start - payload_len,
        payload_end: len_start,
    })
}

/// Validate `0 < len <= size - overhead` and convert to `usize`.
fn checked_payload_len(len: u64, size: u64) -> Option<usize> {
    let max = size.checked_sub(TRAILER_OVERHEAD as u64)?;
    if len == 0 || len > max {
        return None;
    }
    usize::try_from(len).ok()
}

// ---------------------------------------------------------------------------
// File-level operations
// ---------------------------------------------------------------------------

/// Read `path` and return the payload from its trailer.
pub fn extract_file(path: &Path) -> Result<Vec<u8>> {
    let data = fs::read(path)?;
    extract(&data).map(<[u8]>::to_vec)
}

/// Append a trailer for `payload` to the file at `path`.
///
/// Pure append: an existing trailer is left in place. Use `re_embed`
/// to replace one.
pub fn embed(path: &Path, payload: &[u8]) -> Result<()> {
    if payload.is_empty() {
        return Err(empty_payload().into());
    }
    let mut file = OpenOptions::new().append(true).open(path)?;
    file.write_all(&trailer(payload))?;
    file.sync_all()?;
    Ok(())
}

/// Replace the trailer of the file at `path` with one for `payload`.
///
/// Locates the old trailer, truncates the file back to its clean
/// prefix, then appends the new trailer. Idempotent: running it twice
/// with the same payload leaves the same bytes on disk.
pub fn re_embed(path: &Path, payload: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    re_embed_in(&mut file, payload).map_err(|e| match e {
        ReEmbedError::Io(e) => MemeVaultError::Io(e),
        ReEmbedError::AppendFailed { restored, source } => MemeVaultError::ReEmbedFailed {
            path: path.to_path_buf(),
            restored,
            reason: source.to_string(),
        },
    })
}

fn empty_payload() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, "cannot embed an empty payload")
}

// ---------------------------------------------------------------------------
// Truncate-then-append transaction
// ---------------------------------------------------------------------------

/// The minimal file surface the re-embed transaction needs.
pub trait HostFile {
    /// Current size in bytes.
    fn size(&mut self) -> io::Result<u64>;

    /// Fill `buf` with the bytes starting at `offset`.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()>;

    /// Shrink (or grow) the file to exactly `len` bytes.
    fn truncate(&mut self, len: u64) -> io::Result<()>;

    /// Write `bytes` at the current end of the file and make them durable.
    fn append(&mut self, bytes: &[u8]) -> io::Result<()>;
}

impl HostFile for File {
    fn size(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.read_exact(buf)
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.seek(SeekFrom::End(0))?;
        self.write_all(bytes)?;
        self.sync_all()
    }
}

/// Why a re-embed transaction failed.
#[derive(Debug)]
pub enum ReEmbedError {
    /// Failed before the file was modified.
    Io(io::Error),
    /// The file was truncated but the new trailer could not be written.
    /// `restored` reports whether the original bytes were put back.
    AppendFailed { restored: bool, source: io::Error },
}

/// Run the locate → truncate → append transaction against `file`.
pub fn re_embed_in<F: HostFile>(
    file: &mut F,
    payload: &[u8],
) -> std::result::Result<(), ReEmbedError> {
    if payload.is_empty() {
        return Err(ReEmbedError::Io(empty_payload()));
    }

    // Stage everything in memory before touching the file.
    let new_trailer = trailer(payload);
    let size = file.size().map_err(ReEmbedError::Io)?;
    let old = read_trailer(file, size).map_err(ReEmbedError::Io)?;

    let prefix_len = match &old {
        Some(old_trailer) => {
            let prefix_len = size - old_trailer.len() as u64;
            file.truncate(prefix_len).map_err(ReEmbedError::Io)?;
            prefix_len
        }
        None => size,
    };

    if let Err(source) = file.append(&new_trailer) {
        let restored = rollback(file, prefix_len, old.as_deref()).is_ok();
        return Err(ReEmbedError::AppendFailed { restored, source });
    }

    Ok(())
}

/// Put the file back to `prefix_len` bytes plus the old trailer, if any.
fn rollback<F: HostFile>(
    file: &mut F,
    prefix_len: u64,
    old_trailer: Option<&[u8]>,
) -> io::Result<()> {
    file.truncate(prefix_len)?;
    match old_trailer {
        Some(bytes) => file.append(bytes),
        None => Ok(()),
    }
}

/// Read the complete trailer block (payload + length + marker), if one exists.
fn read_trailer<F: HostFile>(file: &mut F, size: u64) -> io::Result<Option<Vec<u8>>> {
    let overhead = TRAILER_OVERHEAD as u64;
    if size < overhead {
        return Ok(None);
    }

    let mut tail = [0u8; TRAILER_OVERHEAD];
    file.read_at(size - overhead, &mut tail)?;
    if &tail[LEN_FIELD..] != MAGIC {
        return Ok(None);
    }

    let mut len_bytes = [0u8; LEN_FIELD];
    len_bytes.copy_from_slice(&tail[..LEN_FIELD]);
    let Some(payload_len) = checked_payload_len(u64::from_le_bytes(len_bytes), size) else {
        return Ok(None);
    };

    let total = payload_len + TRAILER_OVERHEAD;
    let mut block = vec![0u8; total];
    file.read_at(size - total as u64, &mut block)?;
    Ok(Some(block))
}
