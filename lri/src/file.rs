//! The binary pool file. A fixed header lists, for every pool, where its records start, how many
//! there are and how many slots were reserved. Each pool is a flat little-endian array of
//! fixed-size records, padded to the next multiple of 8 bytes.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use netutil::Timer;

use crate::{CharPool, Pool, PoolKind, Pools, Record};

pub const MAGIC: &[u8; 8] = b"LRI 1.0\0";
const ALIGN: usize = 8;
const POOL_HEADER_SIZE: usize = 8 + 4 + 4;
pub const HEADER_SIZE: usize = MAGIC.len() + 4 * 4 + PoolKind::ALL.len() * POOL_HEADER_SIZE;

/// Slots reserved after the object pool for objects created at run time.
pub const RESERVED_OBJS: usize = 64;
/// Slots reserved after the attribute pool.
pub const RESERVED_ATTRS: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileVersion {
    pub major: u32,
    pub minor: u32,
    pub ext: u32,
}

impl FileVersion {
    pub const CURRENT: FileVersion = FileVersion {
        major: 1,
        minor: 0,
        ext: 0,
    };
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct PoolHeader {
    offset: u64,
    /// Records present, including the sentinel. Bytes for the char pool.
    count: u32,
    capacity: u32,
}

struct EncodedPool {
    bytes: Vec<u8>,
    count: u32,
    capacity: u32,
}

fn encode_pool<T: Record>(pool: &Pool<T>) -> Result<EncodedPool> {
    let records = pool.raw_records();
    let capacity = records.len() + pool.reserved();
    let mut bytes = Vec::with_capacity(capacity * T::SIZE);
    for rec in records {
        rec.write(&mut bytes)?;
    }
    bytes.resize(capacity * T::SIZE, 0);
    Ok(EncodedPool {
        bytes,
        count: records.len() as u32,
        capacity: capacity as u32,
    })
}

fn decode_pool<T: Record>(bytes: &[u8], kind: PoolKind, hdr: PoolHeader) -> Result<Pool<T>> {
    if hdr.count == 0 {
        bail!("{:?} pool is missing its sentinel record", kind);
    }
    if hdr.capacity < hdr.count {
        bail!(
            "{:?} pool has capacity {} < count {}",
            kind,
            hdr.capacity,
            hdr.count
        );
    }
    let start = hdr.offset as usize;
    let end = start + hdr.count as usize * T::SIZE;
    if start % ALIGN != 0 {
        bail!("{:?} pool starts at unaligned offset {}", kind, start);
    }
    if end > bytes.len() {
        bail!(
            "{:?} pool runs to byte {}, but the file is only {} bytes",
            kind,
            end,
            bytes.len()
        );
    }

    let mut cursor = Cursor::new(&bytes[start..end]);
    let mut records = Vec::with_capacity(hdr.capacity as usize);
    for idx in 0..hdr.count {
        let rec = T::read(&mut cursor).with_context(|| format!("{:?} record {}", kind, idx))?;
        records.push(rec);
    }
    Ok(Pool::from_records(
        records,
        (hdr.capacity - hdr.count) as usize,
    ))
}

impl Pools {
    fn encode(&self, kind: PoolKind) -> Result<EncodedPool> {
        match kind {
            PoolKind::Chars => {
                let bytes = self.chars.bytes().to_vec();
                let count = bytes.len() as u32;
                Ok(EncodedPool {
                    bytes,
                    count,
                    capacity: count,
                })
            }
            PoolKind::Roads => encode_pool(&self.roads),
            PoolKind::RoadPieces => encode_pool(&self.road_pieces),
            PoolKind::Lanes => encode_pool(&self.lanes),
            PoolKind::CntrlPnts => encode_pool(&self.cntrl_pnts),
            PoolKind::LatCntrlPnts => encode_pool(&self.lat_cntrl_pnts),
            PoolKind::Intrsctns => encode_pool(&self.intrsctns),
            PoolKind::BorderSegs => encode_pool(&self.border_segs),
            PoolKind::Crdrs => encode_pool(&self.crdrs),
            PoolKind::CrdrCntrlPnts => encode_pool(&self.crdr_cntrl_pnts),
            PoolKind::CrdrMrgs => encode_pool(&self.crdr_mrgs),
            PoolKind::HldOfs => encode_pool(&self.hld_ofs),
            PoolKind::Attrs => encode_pool(&self.attrs),
            PoolKind::Objs => encode_pool(&self.objs),
            PoolKind::ObjRefs => encode_pool(&self.obj_refs),
            PoolKind::ElevMaps => encode_pool(&self.elev_maps),
            PoolKind::ElevValues => encode_pool(&self.elev_values),
            PoolKind::Grids => encode_pool(&self.grids),
        }
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        let mut encoded = Vec::new();
        for kind in PoolKind::ALL {
            encoded.push(self.encode(kind)?);
        }

        let mut headers = Vec::new();
        let mut offset = HEADER_SIZE;
        for pool in &encoded {
            headers.push(PoolHeader {
                offset: offset as u64,
                count: pool.count,
                capacity: pool.capacity,
            });
            offset += pad_to_align(pool.bytes.len());
        }

        w.write_all(MAGIC)?;
        w.write_u32::<LittleEndian>(self.version.major)?;
        w.write_u32::<LittleEndian>(self.version.minor)?;
        w.write_u32::<LittleEndian>(self.version.ext)?;
        w.write_u32::<LittleEndian>(PoolKind::ALL.len() as u32)?;
        for hdr in &headers {
            w.write_u64::<LittleEndian>(hdr.offset)?;
            w.write_u32::<LittleEndian>(hdr.count)?;
            w.write_u32::<LittleEndian>(hdr.capacity)?;
        }
        for pool in &encoded {
            w.write_all(&pool.bytes)?;
            let padding = pad_to_align(pool.bytes.len()) - pool.bytes.len();
            w.write_all(&vec![0; padding])?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Pools> {
        if bytes.len() < HEADER_SIZE {
            bail!("File is only {} bytes; too short for a header", bytes.len());
        }
        if &bytes[0..MAGIC.len()] != MAGIC {
            bail!("Bad magic {:?}", &bytes[0..MAGIC.len()]);
        }
        let mut cursor = Cursor::new(&bytes[MAGIC.len()..HEADER_SIZE]);
        let version = FileVersion {
            major: cursor.read_u32::<LittleEndian>()?,
            minor: cursor.read_u32::<LittleEndian>()?,
            ext: cursor.read_u32::<LittleEndian>()?,
        };
        if version.major != FileVersion::CURRENT.major {
            bail!(
                "File version {}.{} isn't supported; expected major version {}",
                version.major,
                version.minor,
                FileVersion::CURRENT.major
            );
        }
        let n_pools = cursor.read_u32::<LittleEndian>()? as usize;
        if n_pools != PoolKind::ALL.len() {
            bail!(
                "File has {} pools, expected {}",
                n_pools,
                PoolKind::ALL.len()
            );
        }
        let mut headers = Vec::new();
        for _ in 0..n_pools {
            headers.push(PoolHeader {
                offset: cursor.read_u64::<LittleEndian>()?,
                count: cursor.read_u32::<LittleEndian>()?,
                capacity: cursor.read_u32::<LittleEndian>()?,
            });
        }
        let hdr = |kind: PoolKind| headers[kind as usize];

        let chars = {
            let h = hdr(PoolKind::Chars);
            let start = h.offset as usize;
            let end = start + h.count as usize;
            if end > bytes.len() {
                bail!("Char pool runs past the end of the file");
            }
            CharPool::from_bytes(bytes[start..end].to_vec())
        };

        Ok(Pools {
            version,
            chars,
            roads: decode_pool(bytes, PoolKind::Roads, hdr(PoolKind::Roads))?,
            road_pieces: decode_pool(bytes, PoolKind::RoadPieces, hdr(PoolKind::RoadPieces))?,
            lanes: decode_pool(bytes, PoolKind::Lanes, hdr(PoolKind::Lanes))?,
            cntrl_pnts: decode_pool(bytes, PoolKind::CntrlPnts, hdr(PoolKind::CntrlPnts))?,
            lat_cntrl_pnts: decode_pool(
                bytes,
                PoolKind::LatCntrlPnts,
                hdr(PoolKind::LatCntrlPnts),
            )?,
            intrsctns: decode_pool(bytes, PoolKind::Intrsctns, hdr(PoolKind::Intrsctns))?,
            border_segs: decode_pool(bytes, PoolKind::BorderSegs, hdr(PoolKind::BorderSegs))?,
            crdrs: decode_pool(bytes, PoolKind::Crdrs, hdr(PoolKind::Crdrs))?,
            crdr_cntrl_pnts: decode_pool(
                bytes,
                PoolKind::CrdrCntrlPnts,
                hdr(PoolKind::CrdrCntrlPnts),
            )?,
            crdr_mrgs: decode_pool(bytes, PoolKind::CrdrMrgs, hdr(PoolKind::CrdrMrgs))?,
            hld_ofs: decode_pool(bytes, PoolKind::HldOfs, hdr(PoolKind::HldOfs))?,
            attrs: decode_pool(bytes, PoolKind::Attrs, hdr(PoolKind::Attrs))?,
            objs: decode_pool(bytes, PoolKind::Objs, hdr(PoolKind::Objs))?,
            obj_refs: decode_pool(bytes, PoolKind::ObjRefs, hdr(PoolKind::ObjRefs))?,
            elev_maps: decode_pool(bytes, PoolKind::ElevMaps, hdr(PoolKind::ElevMaps))?,
            elev_values: decode_pool(bytes, PoolKind::ElevValues, hdr(PoolKind::ElevValues))?,
            grids: decode_pool(bytes, PoolKind::Grids, hdr(PoolKind::Grids))?,
        })
    }

    pub fn read_from<R: Read>(r: &mut R) -> Result<Pools> {
        let mut bytes = Vec::new();
        r.read_to_end(&mut bytes)?;
        Pools::from_bytes(&bytes)
    }

    /// Reads and validates a network file.
    pub fn load<P: AsRef<Path>>(path: P, timer: &mut Timer) -> Result<Pools> {
        let path = path.as_ref();
        timer.start(format!("load {}", path.display()));
        let bytes = fs_err::read(path)?;
        let pools = Pools::from_bytes(&bytes)
            .with_context(|| format!("parsing {}", path.display()))?;
        for line in pools.describe() {
            info!("{}", line);
        }
        pools.validate(timer)?;
        timer.stop(format!("load {}", path.display()));
        Ok(pools)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        fs_err::write(path, bytes)?;
        info!("Wrote {}", path.display());
        Ok(())
    }
}

fn pad_to_align(len: usize) -> usize {
    (len + ALIGN - 1) / ALIGN * ALIGN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_aligned() {
        assert_eq!(HEADER_SIZE % ALIGN, 0);
        assert_eq!(pad_to_align(0), 0);
        assert_eq!(pad_to_align(1), 8);
        assert_eq!(pad_to_align(16), 16);
    }

    #[test]
    fn empty_round_trip() {
        let pools = Pools::empty();
        let bytes = pools.to_bytes().unwrap();
        assert_eq!(&bytes[0..8], MAGIC);
        assert_eq!(bytes.len() % ALIGN, 0);
        let loaded = Pools::from_bytes(&bytes).unwrap();
        assert_eq!(loaded.version, FileVersion::CURRENT);
        assert_eq!(loaded.roads.len(), 0);
        assert_eq!(loaded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Pools::from_bytes(b"not a network").is_err());
        let mut bytes = Pools::empty().to_bytes().unwrap();
        bytes[0] = b'X';
        assert!(Pools::from_bytes(&bytes).is_err());
    }

    #[test]
    fn rejects_newer_major_version() {
        let mut pools = Pools::empty();
        pools.version.major = 2;
        let bytes = pools.to_bytes().unwrap();
        assert!(Pools::from_bytes(&bytes).is_err());
    }
}
