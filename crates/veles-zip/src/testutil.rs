//! Hand-rolled archive fixtures for unit tests.
//!
//! Building the bytes directly keeps full control over the trailer layout
//! (sentinels, ZIP64 records, prepended data), which off-the-shelf writers
//! do not expose.

use byteorder::{WriteBytesExt, LE};
use std::io::Write as _;

use crate::crypto::{pk_verifier, test_support::encrypt};
use crate::format::{CentralDirectoryHeader, Eocd64Locator, Eocd64Record, EocdRecord, LocalFileHeader};

/// 2022-02-26T12:34:56Z
pub const DOS_TIME: u16 = 25692;
pub const DOS_DATE: u16 = 21594;

struct BuiltEntry {
    name: String,
    payload: Vec<u8>,
    crc32: u32,
    compressed_size: u64,
    uncompressed_size: u64,
    method: u16,
    flags: u16,
}

#[derive(Default)]
pub struct ArchiveBuilder {
    entries: Vec<BuiltEntry>,
    force_sentinels: bool,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.push(BuiltEntry {
            name: name.to_string(),
            payload: data.to_vec(),
            crc32: crc32fast::hash(data),
            compressed_size: data.len() as u64,
            uncompressed_size: data.len() as u64,
            method: 0,
            flags: 0,
        });
        self
    }

    pub fn deflated(mut self, name: &str, data: &[u8]) -> Self {
        let mut encoder =
            flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        let payload = encoder.finish().unwrap();
        self.entries.push(BuiltEntry {
            name: name.to_string(),
            crc32: crc32fast::hash(data),
            compressed_size: payload.len() as u64,
            uncompressed_size: data.len() as u64,
            payload,
            method: 8,
            flags: 0,
        });
        self
    }

    pub fn stored_encrypted(mut self, name: &str, data: &[u8], password: &[u8]) -> Self {
        let crc32 = crc32fast::hash(data);
        let payload = encrypt(password, pk_verifier(crc32), data);
        self.entries.push(BuiltEntry {
            name: name.to_string(),
            crc32,
            compressed_size: payload.len() as u64,
            uncompressed_size: data.len() as u64,
            payload,
            method: 0,
            flags: 1,
        });
        self
    }

    pub fn deflated_encrypted(mut self, name: &str, data: &[u8], password: &[u8]) -> Self {
        let mut encoder =
            flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        let compressed = encoder.finish().unwrap();

        let crc32 = crc32fast::hash(data);
        let payload = encrypt(password, pk_verifier(crc32), &compressed);
        self.entries.push(BuiltEntry {
            name: name.to_string(),
            crc32,
            compressed_size: payload.len() as u64,
            uncompressed_size: data.len() as u64,
            payload,
            method: 8,
            flags: 1,
        });
        self
    }

    /// Write ZIP64 size sentinels into the central directory without the
    /// matching extended information extra field.
    pub fn force_sentinel_sizes(mut self) -> Self {
        self.force_sentinels = true;
        self
    }

    fn write_local_headers(&self, out: &mut Vec<u8>) -> Vec<u64> {
        let mut offsets = Vec::with_capacity(self.entries.len());
        for e in &self.entries {
            offsets.push(out.len() as u64);
            out.write_u32::<LE>(LocalFileHeader::SIGNATURE).unwrap();
            out.write_u16::<LE>(20).unwrap(); // version needed
            out.write_u16::<LE>(e.flags).unwrap();
            out.write_u16::<LE>(e.method).unwrap();
            out.write_u16::<LE>(DOS_TIME).unwrap();
            out.write_u16::<LE>(DOS_DATE).unwrap();
            out.write_u32::<LE>(e.crc32).unwrap();
            out.write_u32::<LE>(e.compressed_size as u32).unwrap();
            out.write_u32::<LE>(e.uncompressed_size as u32).unwrap();
            out.write_u16::<LE>(e.name.len() as u16).unwrap();
            out.write_u16::<LE>(0).unwrap(); // extra length
            out.extend_from_slice(e.name.as_bytes());
            out.extend_from_slice(&e.payload);
        }
        offsets
    }

    fn write_cd_entry(&self, out: &mut Vec<u8>, e: &BuiltEntry, offset: u64, zip64: bool) {
        let sentinel = zip64 || self.force_sentinels;
        let extra: Vec<u8> = if sentinel && !self.force_sentinels {
            let mut x = Vec::new();
            x.write_u16::<LE>(0x0001).unwrap();
            x.write_u16::<LE>(24).unwrap();
            x.write_u64::<LE>(e.uncompressed_size).unwrap();
            x.write_u64::<LE>(e.compressed_size).unwrap();
            x.write_u64::<LE>(offset).unwrap();
            x
        } else {
            Vec::new()
        };

        out.write_u32::<LE>(CentralDirectoryHeader::SIGNATURE).unwrap();
        out.write_u16::<LE>(20).unwrap(); // version made by
        out.write_u16::<LE>(20).unwrap(); // version needed
        out.write_u16::<LE>(e.flags).unwrap();
        out.write_u16::<LE>(e.method).unwrap();
        out.write_u16::<LE>(DOS_TIME).unwrap();
        out.write_u16::<LE>(DOS_DATE).unwrap();
        out.write_u32::<LE>(e.crc32).unwrap();
        if sentinel {
            out.write_u32::<LE>(u32::MAX).unwrap();
            out.write_u32::<LE>(u32::MAX).unwrap();
        } else {
            out.write_u32::<LE>(e.compressed_size as u32).unwrap();
            out.write_u32::<LE>(e.uncompressed_size as u32).unwrap();
        }
        out.write_u16::<LE>(e.name.len() as u16).unwrap();
        out.write_u16::<LE>(extra.len() as u16).unwrap();
        out.write_u16::<LE>(0).unwrap(); // comment length
        out.write_u16::<LE>(0).unwrap(); // disk number start
        out.write_u16::<LE>(0).unwrap(); // internal attrs
        out.write_u32::<LE>(0).unwrap(); // external attrs
        if sentinel {
            out.write_u32::<LE>(u32::MAX).unwrap();
        } else {
            out.write_u32::<LE>(offset as u32).unwrap();
        }
        out.extend_from_slice(e.name.as_bytes());
        out.extend_from_slice(&extra);
    }

    /// Build a legacy (non-ZIP64) archive.
    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        let offsets = self.write_local_headers(&mut out);

        let cd_offset = out.len() as u64;
        for (e, &offset) in self.entries.iter().zip(&offsets) {
            self.write_cd_entry(&mut out, e, offset, false);
        }
        let cd_size = out.len() as u64 - cd_offset;

        out.write_u32::<LE>(EocdRecord::SIGNATURE).unwrap();
        out.write_u16::<LE>(0).unwrap(); // this disk
        out.write_u16::<LE>(0).unwrap(); // cd disk
        out.write_u16::<LE>(self.entries.len() as u16).unwrap();
        out.write_u16::<LE>(self.entries.len() as u16).unwrap();
        out.write_u32::<LE>(cd_size as u32).unwrap();
        out.write_u32::<LE>(cd_offset as u32).unwrap();
        out.write_u16::<LE>(0).unwrap(); // comment length
        out
    }

    /// Build a ZIP64 archive: sentinel-saturated legacy EOCD plus the ZIP64
    /// record and locator.
    pub fn build_zip64(self) -> Vec<u8> {
        let mut out = Vec::new();
        let offsets = self.write_local_headers(&mut out);

        let cd_offset = out.len() as u64;
        for (e, &offset) in self.entries.iter().zip(&offsets) {
            self.write_cd_entry(&mut out, e, offset, true);
        }
        let cd_size = out.len() as u64 - cd_offset;
        let eocd64_offset = out.len() as u64;

        out.write_u32::<LE>(Eocd64Record::SIGNATURE).unwrap();
        out.write_u64::<LE>(44).unwrap(); // record size without leading bytes
        out.write_u16::<LE>(45).unwrap(); // version made by
        out.write_u16::<LE>(45).unwrap(); // version needed
        out.write_u32::<LE>(0).unwrap(); // this disk
        out.write_u32::<LE>(0).unwrap(); // cd disk
        out.write_u64::<LE>(self.entries.len() as u64).unwrap();
        out.write_u64::<LE>(self.entries.len() as u64).unwrap();
        out.write_u64::<LE>(cd_size).unwrap();
        out.write_u64::<LE>(cd_offset).unwrap();

        out.write_u32::<LE>(Eocd64Locator::SIGNATURE).unwrap();
        out.write_u32::<LE>(0).unwrap(); // disk with eocd64
        out.write_u64::<LE>(eocd64_offset).unwrap();
        out.write_u32::<LE>(1).unwrap(); // total disks

        out.write_u32::<LE>(EocdRecord::SIGNATURE).unwrap();
        out.write_u16::<LE>(u16::MAX).unwrap();
        out.write_u16::<LE>(u16::MAX).unwrap();
        out.write_u16::<LE>(u16::MAX).unwrap();
        out.write_u16::<LE>(u16::MAX).unwrap();
        out.write_u32::<LE>(u32::MAX).unwrap();
        out.write_u32::<LE>(u32::MAX).unwrap();
        out.write_u16::<LE>(0).unwrap(); // comment length
        out
    }
}
