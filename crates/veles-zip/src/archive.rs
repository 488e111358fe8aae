//! ZIP archive reader.
//!
//! Parses the central directory of a (possibly ZIP64) archive from any
//! seekable [`Stream`] and opens entries as composed stream chains:
//! byte-range window, then optional ZipCrypto decryption, then optional
//! inflate.

use std::io::SeekFrom;

use memchr::memmem;
use veles_vfs::{InflateStream, Stream, WindowedStream};

use crate::crypto::{pk_verifier, pk_verifier2, PkDecryptStream};
use crate::dostime;
use crate::entry::{EncryptMethod, ZipEntry};
use crate::format::{
    self, CentralDirectoryHeader, CompressionMethod, Eocd64Locator, Eocd64Record, EocdRecord,
    LocalFileHeader, EXTRA_FIELD_ZIP64,
};
use crate::{Error, Result};

/// How far back from the end of the stream the EOCD signature is searched.
const MAX_EOCD_SEARCH: u64 = 1 << 20;

const SEARCH_BUFFER_SIZE: usize = 64;

/// Search backwards from the stream's current position for `pattern`,
/// scanning at most `max_search` bytes.
///
/// On a match the stream is left positioned at the match; the rightmost
/// occurrence wins. Works in fixed-size chunks, keeping a pattern-sized
/// overlap between chunks so matches on a boundary are not missed.
fn reverse_search_pattern(
    stream: &mut dyn Stream,
    pattern: &[u8],
    mut max_search: u64,
) -> Result<bool> {
    debug_assert!(pattern.len() * 2 <= SEARCH_BUFFER_SIZE);

    let mut buffer = [0u8; SEARCH_BUFFER_SIZE];
    let mut available = 0usize;
    let mut search_origin = stream.position()?;

    while max_search > 0 {
        let read_count = (max_search.min((SEARCH_BUFFER_SIZE - available) as u64))
            .min(search_origin) as usize;
        if read_count == 0 {
            return Ok(false);
        }

        // Shift the kept overlap towards the end; new (earlier) bytes go in
        // front of it.
        buffer.copy_within(..available, read_count);
        stream.seek(SeekFrom::Start(search_origin - read_count as u64))?;
        stream.read_exact(&mut buffer[..read_count])?;

        max_search -= read_count as u64;
        available += read_count;
        search_origin -= read_count as u64;

        if available < pattern.len() {
            return Ok(false);
        }
        if let Some(at) = memmem::rfind(&buffer[..available], pattern) {
            stream.seek(SeekFrom::Start(search_origin + at as u64))?;
            return Ok(true);
        }
        available = pattern.len() - 1;
    }
    Ok(false)
}

/// A parsed ZIP archive over a seekable stream.
///
/// Construction locates and validates the central directory; entries are
/// materialized separately with [`ZipArchive::read_entries`]. Opened entry
/// streams clone the underlying stream, so many entries can be read
/// concurrently.
pub struct ZipArchive {
    stream: Box<dyn Stream>,
    is_zip64: bool,
    entry_count: u64,
    /// Difference between stored offsets and actual stream offsets, nonzero
    /// when data precedes the archive (e.g. a self-extractor stub).
    base_offset: i64,
    cd_offset: i64,
    cd_size: i64,
}

impl ZipArchive {
    /// Parse the archive trailer of `stream`.
    pub fn new(mut stream: Box<dyn Stream>) -> Result<Self> {
        let (is_zip64, entry_count, base_offset, cd_offset, cd_size) =
            Self::locate_central_directory(stream.as_mut())?;
        tracing::debug!(
            is_zip64,
            entry_count,
            base_offset,
            cd_offset,
            "located central directory"
        );
        Ok(Self {
            stream,
            is_zip64,
            entry_count,
            base_offset,
            cd_offset,
            cd_size,
        })
    }

    /// Whether the archive uses ZIP64 extensions.
    pub fn is_zip64(&self) -> bool {
        self.is_zip64
    }

    /// Number of entries in the central directory.
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    fn locate_central_directory(
        stream: &mut dyn Stream,
    ) -> Result<(bool, u64, i64, i64, i64)> {
        stream.seek(SeekFrom::End(0))?;
        if !reverse_search_pattern(stream, &EocdRecord::MAGIC, MAX_EOCD_SEARCH)? {
            return Err(Error::EocdNotFound);
        }

        let mut eocd_offset = stream.position()?;
        if format::read_u32(stream)? != EocdRecord::SIGNATURE {
            return Err(Error::BadEocdSignature);
        }
        let eocd: EocdRecord = format::read_struct(stream)?;

        let is_zip64 = eocd.is_zip64();
        let (entry_count, cd_offset, cd_size) = if is_zip64 {
            // The locator sits immediately before the legacy EOCD record.
            if eocd_offset < Eocd64Locator::SIZE {
                return Err(Error::UnexpectedEndOfStream);
            }
            stream.seek(SeekFrom::Start(eocd_offset - Eocd64Locator::SIZE))?;
            if format::read_u32(stream)? != Eocd64Locator::SIGNATURE {
                return Err(Error::BadEocd64LocatorSignature);
            }
            let locator: Eocd64Locator = format::read_struct(stream)?;
            if locator.eocd64_disk != 0 || locator.total_disks > 1 {
                return Err(Error::MultiDiskNotSupported);
            }

            // Data prepended to a ZIP64 archive cannot be compensated for
            // here: the locator's offset is all there is to go on.
            stream.seek(SeekFrom::Start(locator.eocd64_offset))?;
            if format::read_u32(stream)? != Eocd64Record::SIGNATURE {
                return Err(Error::BadEocd64Signature);
            }
            let eocd64: Eocd64Record = format::read_struct(stream)?;
            if eocd64.record_size + Eocd64Record::LEADING_BYTES
                < Eocd64Record::SIZE_WITHOUT_COMMENT
            {
                return Err(Error::BadEocdSize);
            }
            if eocd64.disk_number != 0
                || eocd64.central_dir_disk != 0
                || eocd64.entry_count_disk != eocd64.entry_count_total
            {
                return Err(Error::MultiDiskNotSupported);
            }

            eocd_offset = locator.eocd64_offset;
            let cd_offset =
                i64::try_from(eocd64.central_dir_offset).map_err(|_| Error::CdOffsetTooBig)?;
            let cd_size =
                i64::try_from(eocd64.central_dir_size).map_err(|_| Error::CdSizeTooBig)?;
            (eocd64.entry_count_total, cd_offset, cd_size)
        } else {
            if eocd.disk_number != 0
                || eocd.central_dir_disk != 0
                || eocd.entry_count_disk != eocd.entry_count_total
            {
                return Err(Error::MultiDiskNotSupported);
            }
            (
                eocd.entry_count_total as u64,
                eocd.central_dir_offset as i64,
                eocd.central_dir_size as i64,
            )
        };

        // First try the stored offset as-is.
        if stream.seek(SeekFrom::Start(cd_offset as u64)).is_ok() {
            if let Ok(signature) = format::read_u32(stream) {
                if signature == CentralDirectoryHeader::SIGNATURE {
                    Self::check_cd_bounds(cd_offset, cd_size, eocd_offset)?;
                    return Ok((is_zip64, entry_count, 0, cd_offset, cd_size));
                }
            }
        }

        // The offset missed; re-derive the directory start from its size and
        // treat the difference as an archive base offset.
        if eocd_offset < cd_size as u64 {
            return Err(Error::CdLocationInvalid);
        }
        let real_cd_offset = (eocd_offset - cd_size as u64) as i64;
        stream.seek(SeekFrom::Start(real_cd_offset as u64))?;
        if format::read_u32(stream)? != CentralDirectoryHeader::SIGNATURE {
            return Err(Error::BadCdSignature);
        }

        let base_offset = real_cd_offset - cd_offset;
        Self::check_cd_bounds(real_cd_offset, cd_size, eocd_offset)?;
        Ok((is_zip64, entry_count, base_offset, real_cd_offset, cd_size))
    }

    /// The central directory must sit wholly before the EOCD record.
    fn check_cd_bounds(cd_offset: i64, cd_size: i64, eocd_offset: u64) -> Result<()> {
        if cd_offset as u64 >= eocd_offset || (cd_offset + cd_size) as u64 > eocd_offset {
            return Err(Error::CdLocationInvalid);
        }
        Ok(())
    }

    /// Read every central directory entry.
    pub fn read_entries(&mut self) -> Result<Vec<ZipEntry>> {
        let is_zip64 = self.is_zip64;
        let base_offset = self.base_offset;
        let stream = self.stream.as_mut();
        stream.seek(SeekFrom::Start(self.cd_offset as u64))?;

        let mut entries = Vec::with_capacity(self.entry_count.min(1 << 16) as usize);
        for _ in 0..self.entry_count {
            if format::read_u32(stream)? != CentralDirectoryHeader::SIGNATURE {
                return Err(Error::BadCdSignature);
            }
            let cd: CentralDirectoryHeader = format::read_struct(stream)?;
            let name = format::read_bytes(stream, cd.file_name_length as usize)?;
            let extra = format::read_bytes(stream, cd.extra_field_length as usize)?;
            let comment = format::read_bytes(stream, cd.file_comment_length as usize)?;

            entries.push(Self::resolve_entry(
                is_zip64,
                base_offset,
                &cd,
                name,
                &extra,
                comment,
            )?);
        }
        Ok(entries)
    }

    fn resolve_entry(
        is_zip64: bool,
        base_offset: i64,
        cd: &CentralDirectoryHeader,
        name: Vec<u8>,
        extra: &[u8],
        comment: Vec<u8>,
    ) -> Result<ZipEntry> {
        let flags = cd.flags;
        let has_data_descriptor = flags & CentralDirectoryHeader::FLAG_DATA_DESCRIPTOR != 0;
        if has_data_descriptor
            && (cd.crc32 == 0 || cd.compressed_size == 0 || cd.uncompressed_size == 0)
        {
            // Without sizes in the central directory the entry cannot be
            // windowed; some writers fill them in anyway, which is accepted.
            return Err(Error::DataDescriptorNotSupported);
        }
        if flags & CentralDirectoryHeader::FLAG_PATCHED_DATA != 0 {
            return Err(Error::CompressedPatchedDataNotSupported);
        }
        if flags & CentralDirectoryHeader::FLAG_STRONG_ENCRYPTION != 0 {
            return Err(Error::StrongEncryptionNotSupported);
        }
        if flags & CentralDirectoryHeader::FLAG_CD_ENCRYPTED != 0 {
            return Err(Error::CdEncryptionNotSupported);
        }

        let compression = CompressionMethod::try_from(cd.compression_method)
            .map_err(Error::CompressionMethodNotSupported)?;

        let encryption = if flags & CentralDirectoryHeader::FLAG_ENCRYPTED != 0 {
            if has_data_descriptor {
                EncryptMethod::ZipCrypto2
            } else {
                EncryptMethod::ZipCrypto
            }
        } else {
            EncryptMethod::None
        };

        let needs_zip64 = cd.uncompressed_size == u32::MAX
            || cd.compressed_size == u32::MAX
            || cd.local_header_offset == u32::MAX;
        let (uncompressed_size, compressed_size, raw_offset) = if needs_zip64 {
            if !is_zip64 {
                return Err(Error::BadCdEntrySize);
            }
            Self::read_zip64_extra(cd, extra)?
        } else {
            (
                cd.uncompressed_size as u64,
                cd.compressed_size as u64,
                cd.local_header_offset as u64,
            )
        };

        Ok(ZipEntry {
            name: String::from_utf8_lossy(&name).into_owned(),
            comment: String::from_utf8_lossy(&comment).into_owned(),
            compression,
            encryption,
            is_utf8: flags & CentralDirectoryHeader::FLAG_UTF8 != 0,
            crc32: cd.crc32,
            last_modified: dostime::dos_to_unix(cd.last_mod_time, cd.last_mod_date),
            local_header_offset: (raw_offset as i64 + base_offset) as u64,
            compressed_size,
            uncompressed_size,
        })
    }

    /// Walk the extra fields for the ZIP64 extended information field and
    /// resolve the sentinel values from it.
    fn read_zip64_extra(
        cd: &CentralDirectoryHeader,
        extra: &[u8],
    ) -> Result<(u64, u64, u64)> {
        use byteorder::{ReadBytesExt, LE};
        let mut cursor = std::io::Cursor::new(extra);

        while (cursor.position() as usize) + 4 <= extra.len() {
            let tag = cursor.read_u16::<LE>()?;
            let size = cursor.read_u16::<LE>()?;
            if tag != EXTRA_FIELD_ZIP64 {
                cursor.set_position(cursor.position() + size as u64);
                continue;
            }

            // Only the sentinel fields are present, in a fixed order.
            let uncompressed = if cd.uncompressed_size == u32::MAX {
                cursor.read_u64::<LE>()?
            } else {
                cd.uncompressed_size as u64
            };
            let compressed = if cd.compressed_size == u32::MAX {
                cursor.read_u64::<LE>()?
            } else {
                cd.compressed_size as u64
            };
            let offset = if cd.local_header_offset == u32::MAX {
                cursor.read_u64::<LE>()?
            } else {
                cd.local_header_offset as u64
            };
            if cd.disk_number_start == u16::MAX {
                let _ = cursor.read_u32::<LE>()?;
            }
            return Ok((uncompressed, compressed, offset));
        }
        Err(Error::MissingZip64ExtraField)
    }

    /// Open an entry as a readable stream.
    ///
    /// The returned chain decrypts and decompresses on the fly; it is fully
    /// independent of the archive and of other opened entries.
    pub fn open_entry(&self, entry: &ZipEntry, password: &[u8]) -> Result<Box<dyn Stream>> {
        let mut stream = self.stream.clone_stream()?;
        stream.seek(SeekFrom::Start(entry.local_header_offset))?;
        Self::skip_local_header(stream.as_mut())?;

        // For encrypted entries the compressed size counts the 12-byte
        // encryption header, which the decrypt layer consumes.
        let mut stream: Box<dyn Stream> =
            Box::new(WindowedStream::new(stream, entry.compressed_size));

        match entry.encryption {
            EncryptMethod::None => {}
            EncryptMethod::ZipCrypto => {
                stream = Box::new(PkDecryptStream::new(
                    stream,
                    password,
                    pk_verifier(entry.crc32),
                )?);
            }
            EncryptMethod::ZipCrypto2 => {
                let (dos_time, dos_date) = dostime::unix_to_dos(entry.last_modified);
                stream = Box::new(PkDecryptStream::new(
                    stream,
                    password,
                    pk_verifier2(dos_time, dos_date),
                )?);
            }
        }

        if entry.compression == CompressionMethod::Deflate {
            stream = Box::new(InflateStream::new(stream, Some(entry.uncompressed_size)));
        }
        Ok(stream)
    }

    /// Advance past a local file header, using only its trailing length
    /// fields. The central directory already supplied the trusted metadata.
    fn skip_local_header(stream: &mut dyn Stream) -> Result<()> {
        if format::read_u32(stream)? != LocalFileHeader::SIGNATURE {
            return Err(Error::BadLocalHeaderSignature);
        }
        stream.seek(SeekFrom::Current(LocalFileHeader::LENGTHS_OFFSET))?;
        let name_length = format::read_u16(stream)?;
        let extra_length = format::read_u16(stream)?;
        stream.seek(SeekFrom::Current(name_length as i64 + extra_length as i64))?;
        Ok(())
    }
}

impl std::fmt::Debug for ZipArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipArchive")
            .field("is_zip64", &self.is_zip64)
            .field("entry_count", &self.entry_count)
            .field("base_offset", &self.base_offset)
            .finish()
    }
}
