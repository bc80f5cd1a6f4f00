use crate::{Error, Result};

/// Record identifier handed out by a storage manager.
///
/// Identifiers are non-negative; [`NEW_PAGE`] is the allocate-on-store
/// request and is never a valid stored identifier.
pub type PageId = i64;

pub const NEW_PAGE: PageId = -1;
pub const EMPTY_PAGE: PageId = -1;

/// Identifier → byte-array store backing a tree.
///
/// Callers always receive fresh copies; buffers passed in remain owned by the
/// caller. Mutation must be serialized with reads by the caller — there is no
/// internal synchronization.
pub trait StorageManager {
    /// Fetch a copy of the record stored under `id`.
    fn load(&mut self, id: PageId) -> Result<Vec<u8>>;

    /// Write `data` under `id`, or under a freshly allocated identifier when
    /// `id` is [`NEW_PAGE`]. Returns the identifier the record lives under.
    fn store(&mut self, id: PageId, data: &[u8]) -> Result<PageId>;

    /// Drop the record; subsequent loads of `id` fail with `InvalidPage`.
    fn delete(&mut self, id: PageId) -> Result<()>;

    /// Persist all pending index state.
    fn flush(&mut self) -> Result<()>;
}

/// Little-endian cursor over a serialized record.
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
    context: &'static str,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(buf: &'a [u8], context: &'static str) -> Self {
        Self {
            buf,
            pos: 0,
            context,
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.buf.len() {
            return Err(Error::EndOfStream(self.context));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub(crate) fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub(crate) fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub(crate) fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }
}

/// Volatile backend: a slot per identifier plus a LIFO of freed slots.
#[derive(Debug, Default)]
pub struct MemoryStorageManager {
    slots: Vec<Option<Vec<u8>>>,
    empty_slots: Vec<PageId>,
}

impl MemoryStorageManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, id: PageId) -> Result<&mut Option<Vec<u8>>> {
        let index = usize::try_from(id).map_err(|_| Error::InvalidPage(id))?;
        match self.slots.get_mut(index) {
            Some(slot) if slot.is_some() => Ok(slot),
            _ => Err(Error::InvalidPage(id)),
        }
    }
}

impl StorageManager for MemoryStorageManager {
    fn load(&mut self, id: PageId) -> Result<Vec<u8>> {
        Ok(self.slot_mut(id)?.as_ref().cloned().unwrap())
    }

    fn store(&mut self, id: PageId, data: &[u8]) -> Result<PageId> {
        if id == NEW_PAGE {
            if let Some(reused) = self.empty_slots.pop() {
                self.slots[reused as usize] = Some(data.to_vec());
                Ok(reused)
            } else {
                self.slots.push(Some(data.to_vec()));
                Ok(self.slots.len() as PageId - 1)
            }
        } else {
            *self.slot_mut(id)? = Some(data.to_vec());
            Ok(id)
        }
    }

    fn delete(&mut self, id: PageId) -> Result<()> {
        self.slot_mut(id)?.take();
        self.empty_slots.push(id);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
