use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::PoolId;

/// Every pool in the file, in the order their headers are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PoolKind {
    Chars,
    Roads,
    RoadPieces,
    Lanes,
    CntrlPnts,
    LatCntrlPnts,
    Intrsctns,
    BorderSegs,
    Crdrs,
    CrdrCntrlPnts,
    CrdrMrgs,
    HldOfs,
    Attrs,
    Objs,
    ObjRefs,
    ElevMaps,
    ElevValues,
    Grids,
}

impl PoolKind {
    pub const ALL: [PoolKind; 18] = [
        PoolKind::Chars,
        PoolKind::Roads,
        PoolKind::RoadPieces,
        PoolKind::Lanes,
        PoolKind::CntrlPnts,
        PoolKind::LatCntrlPnts,
        PoolKind::Intrsctns,
        PoolKind::BorderSegs,
        PoolKind::Crdrs,
        PoolKind::CrdrCntrlPnts,
        PoolKind::CrdrMrgs,
        PoolKind::HldOfs,
        PoolKind::Attrs,
        PoolKind::Objs,
        PoolKind::ObjRefs,
        PoolKind::ElevMaps,
        PoolKind::ElevValues,
        PoolKind::Grids,
    ];
}

/// A fixed-size record stored in one pool. `SIZE` is the exact number of bytes `write` emits
/// and `read` consumes; it's also the stride of the pool in the file.
pub trait Record: Clone + Default {
    type Id: PoolId;
    const SIZE: usize;

    fn read<R: Read>(r: &mut R) -> io::Result<Self>;
    fn write<W: Write>(&self, w: &mut W) -> io::Result<()>;
}

/// A contiguous array of records, indexed by a typed ID. Slot 0 always holds the default record,
/// so a null ID never resolves to real data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pool<T> {
    records: Vec<T>,
    /// Extra slots the file reserves beyond the records present, for runtime additions.
    reserved: usize,
}

impl<T: Record> Pool<T> {
    pub fn new() -> Pool<T> {
        Pool {
            records: vec![T::default()],
            reserved: 0,
        }
    }

    pub(crate) fn from_records(records: Vec<T>, reserved: usize) -> Pool<T> {
        let mut pool = Pool { records, reserved };
        if pool.records.is_empty() {
            pool.records.push(T::default());
        }
        pool.records.reserve(reserved);
        pool
    }

    pub fn push(&mut self, rec: T) -> T::Id {
        let id = T::Id::from_raw(self.records.len() as u32);
        self.records.push(rec);
        id
    }

    /// None for the null ID or anything out of range.
    pub fn get(&self, id: T::Id) -> Option<&T> {
        if id.is_null() {
            return None;
        }
        self.records.get(id.idx())
    }

    pub(crate) fn get_mut(&mut self, id: T::Id) -> Option<&mut T> {
        if id.is_null() {
            return None;
        }
        self.records.get_mut(id.idx())
    }

    /// `count` consecutive records starting at `first`. Empty if the range is out of bounds.
    pub fn slice(&self, first: T::Id, count: u32) -> &[T] {
        let start = first.idx();
        let end = start + count as usize;
        if count == 0 || first.is_null() || end > self.records.len() {
            return &[];
        }
        &self.records[start..end]
    }

    pub fn contains(&self, id: T::Id) -> bool {
        !id.is_null() && id.idx() < self.records.len()
    }

    /// Number of real records, excluding the sentinel.
    pub fn len(&self) -> usize {
        self.records.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn reserved(&self) -> usize {
        self.reserved
    }

    pub fn set_reserved(&mut self, reserved: usize) {
        self.reserved = reserved;
        self.records.reserve(reserved);
    }

    /// The ID the next pushed record will get.
    pub fn next_id(&self) -> T::Id {
        T::Id::from_raw(self.records.len() as u32)
    }

    pub fn iter(&self) -> impl Iterator<Item = (T::Id, &T)> {
        self.records
            .iter()
            .enumerate()
            .skip(1)
            .map(|(idx, rec)| (T::Id::from_raw(idx as u32), rec))
    }

    pub fn ids(&self) -> impl Iterator<Item = T::Id> {
        (1..self.records.len()).map(|idx| T::Id::from_raw(idx as u32))
    }

    /// Including the sentinel, as stored on disk.
    pub(crate) fn raw_records(&self) -> &Vec<T> {
        &self.records
    }
}

impl<T: Record> Default for Pool<T> {
    fn default() -> Pool<T> {
        Pool::new()
    }
}

/// All names in the file, as NUL-terminated strings packed end to end. Offset 0 is the empty
/// string.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CharPool {
    bytes: Vec<u8>,
}

impl CharPool {
    pub fn new() -> CharPool {
        CharPool { bytes: vec![0] }
    }

    pub(crate) fn from_bytes(mut bytes: Vec<u8>) -> CharPool {
        if bytes.is_empty() {
            bytes.push(0);
        }
        CharPool { bytes }
    }

    /// Appends a name and returns its offset. Doesn't dedupe.
    pub fn push(&mut self, name: &str) -> u32 {
        if name.is_empty() {
            return 0;
        }
        let offset = self.bytes.len() as u32;
        self.bytes.extend_from_slice(name.as_bytes());
        self.bytes.push(0);
        offset
    }

    /// The string at an offset. Out-of-range offsets and invalid UTF-8 both produce "".
    pub fn get(&self, offset: u32) -> &str {
        let start = offset as usize;
        if start >= self.bytes.len() {
            return "";
        }
        let end = self.bytes[start..]
            .iter()
            .position(|b| *b == 0)
            .map(|len| start + len)
            .unwrap_or(self.bytes.len());
        std::str::from_utf8(&self.bytes[start..end]).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.len() <= 1
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Default for CharPool {
    fn default() -> CharPool {
        CharPool::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::HldOfsRec;
    use crate::HldOfsID;

    #[test]
    fn sentinel_is_never_returned() {
        let mut pool: Pool<HldOfsRec> = Pool::new();
        assert!(pool.is_empty());
        let id = pool.push(HldOfsRec::default());
        assert_eq!(id, HldOfsID(1));
        assert!(pool.get(HldOfsID::NULL).is_none());
        assert!(pool.get(id).is_some());
        assert!(pool.get(HldOfsID(2)).is_none());
        assert_eq!(pool.slice(id, 1).len(), 1);
        assert!(pool.slice(id, 2).is_empty());
        assert_eq!(pool.ids().collect::<Vec<_>>(), vec![id]);
    }

    #[test]
    fn char_pool() {
        let mut chars = CharPool::new();
        let a = chars.push("R1");
        let b = chars.push("I_north");
        assert_eq!(chars.get(a), "R1");
        assert_eq!(chars.get(b), "I_north");
        assert_eq!(chars.get(0), "");
        assert_eq!(chars.push(""), 0);
        assert_eq!(chars.get(9999), "");
    }
}
