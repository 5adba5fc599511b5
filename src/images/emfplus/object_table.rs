//! EMF+ object table and continuation assembly.
//!
//! Object records define graphics objects in one of 64 slots. An object too
//! large for a single record is split across consecutive Object records;
//! the chunks are accumulated per slot and decoded once the declared total
//! has arrived.

use tracing::debug;

use super::options::{DecodeOptions, check_ceiling};
use super::records::object::GraphicsObject;
use crate::common::error::{Error, Result};

/// Number of addressable object slots.
pub const OBJECT_TABLE_SIZE: usize = 64;

/// Bytes gathered so far for a continued object.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuationBuffer {
    pub object_type: u8,
    pub total_size: u32,
    /// Absolute offset of the first chunk
    pub start_offset: usize,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ContinuationState {
    #[default]
    Closed,
    Accumulating(ContinuationBuffer),
}

/// What an Object record did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectUpdate {
    /// The object was decoded and stored
    Stored,
    /// More chunks are expected
    Pending { accumulated: u32, total: u32 },
}

/// One chunk of an Object record, as framed by the dispatcher.
#[derive(Debug, Clone, Copy)]
pub struct ObjectChunk<'a> {
    pub slot: u8,
    pub object_type: u8,
    /// Declared total size when the record's continuation bit is set
    pub total_size: Option<u32>,
    pub data: &'a [u8],
    /// Absolute offset of `data`
    pub offset: usize,
}

#[derive(Debug, Clone)]
pub struct ObjectTable {
    objects: Vec<Option<GraphicsObject>>,
    continuations: Vec<ContinuationState>,
}

impl Default for ObjectTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectTable {
    pub fn new() -> Self {
        Self {
            objects: vec![None; OBJECT_TABLE_SIZE],
            continuations: vec![ContinuationState::Closed; OBJECT_TABLE_SIZE],
        }
    }

    /// Object currently stored in `slot`.
    pub fn get(&self, slot: u8) -> Option<&GraphicsObject> {
        self.objects.get(usize::from(slot)).and_then(Option::as_ref)
    }

    /// Iterate over occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &GraphicsObject)> {
        self.objects
            .iter()
            .enumerate()
            .filter_map(|(slot, object)| object.as_ref().map(|o| (slot as u8, o)))
    }

    pub fn len(&self) -> usize {
        self.objects.iter().filter(|o| o.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn continuation(&self, slot: u8) -> Option<&ContinuationState> {
        self.continuations.get(usize::from(slot))
    }

    /// Slot with an unfinished continued object, if any.
    pub fn open_continuation(&self) -> Option<u8> {
        self.continuations
            .iter()
            .position(|state| matches!(state, ContinuationState::Accumulating(_)))
            .map(|slot| slot as u8)
    }

    /// Fail if a continued object is still waiting for chunks.
    pub fn ensure_no_open_continuation(&self, offset: usize, context: &str) -> Result<()> {
        match self.open_continuation() {
            Some(slot) => Err(Error::IncompleteContinuation {
                offset,
                slot,
                reason: format!("{} while object is still being continued", context),
            }),
            None => Ok(()),
        }
    }

    /// Drop every object and pending continuation.
    pub fn clear(&mut self) {
        self.objects.iter_mut().for_each(|o| *o = None);
        self.continuations
            .iter_mut()
            .for_each(|c| *c = ContinuationState::Closed);
    }

    fn check_slot(slot: u8, offset: usize) -> Result<usize> {
        let index = usize::from(slot);
        if index >= OBJECT_TABLE_SIZE {
            return Err(Error::malformed(
                offset,
                format!("object slot {} out of range", slot),
            ));
        }
        Ok(index)
    }

    /// Apply one Object record.
    ///
    /// A chunk without a total size either completes the slot's open
    /// continuation or, when none is open, carries the whole object.
    pub fn begin_object(
        &mut self,
        chunk: ObjectChunk<'_>,
        options: &DecodeOptions,
    ) -> Result<ObjectUpdate> {
        let index = Self::check_slot(chunk.slot, chunk.offset)?;

        if let Some(open) = self.open_continuation()
            && open != chunk.slot
        {
            return Err(Error::IncompleteContinuation {
                offset: chunk.offset,
                slot: open,
                reason: format!("object record for slot {} interrupts continuation", chunk.slot),
            });
        }

        if let Some(total) = chunk.total_size {
            check_ceiling(chunk.offset, u64::from(total), options.max_object_size)?;
        }

        let open_buffer = match &self.continuations[index] {
            ContinuationState::Accumulating(buffer) => Some((buffer.object_type, buffer.total_size)),
            ContinuationState::Closed => None,
        };

        match (open_buffer, chunk.total_size) {
            (None, None) => {
                let object =
                    GraphicsObject::decode(chunk.object_type, chunk.data, chunk.offset, options)?;
                debug!(slot = chunk.slot, object_type = chunk.object_type, "stored object");
                self.objects[index] = Some(object);
                Ok(ObjectUpdate::Stored)
            },
            (None, Some(total)) => {
                debug!(slot = chunk.slot, total, "opened object continuation");
                self.continuations[index] = ContinuationState::Accumulating(ContinuationBuffer {
                    object_type: chunk.object_type,
                    total_size: total,
                    start_offset: chunk.offset,
                    data: Vec::new(),
                });
                self.continue_object(chunk, options)
            },
            (Some((object_type, total_size)), total) => {
                if object_type != chunk.object_type {
                    return Err(Error::IncompleteContinuation {
                        offset: chunk.offset,
                        slot: chunk.slot,
                        reason: format!(
                            "object type changed from {} to {}",
                            object_type, chunk.object_type
                        ),
                    });
                }
                if let Some(total) = total
                    && total != total_size
                {
                    return Err(Error::IncompleteContinuation {
                        offset: chunk.offset,
                        slot: chunk.slot,
                        reason: format!(
                            "total object size changed from {} to {}",
                            total_size, total
                        ),
                    });
                }
                self.continue_object(chunk, options)
            },
        }
    }

    /// Append a chunk to the slot's open continuation, decoding the object
    /// once all bytes have arrived.
    pub fn continue_object(
        &mut self,
        chunk: ObjectChunk<'_>,
        options: &DecodeOptions,
    ) -> Result<ObjectUpdate> {
        let index = Self::check_slot(chunk.slot, chunk.offset)?;
        let ContinuationState::Accumulating(buffer) = &mut self.continuations[index] else {
            return Err(Error::IncompleteContinuation {
                offset: chunk.offset,
                slot: chunk.slot,
                reason: "no continuation is open for this slot".into(),
            });
        };

        let accumulated = buffer.data.len() as u64 + chunk.data.len() as u64;
        if accumulated > u64::from(buffer.total_size) {
            return Err(Error::OversizedAllocation {
                offset: chunk.offset,
                requested: accumulated,
                ceiling: u64::from(buffer.total_size),
            });
        }
        buffer.data.extend_from_slice(chunk.data);
        let (received, total) = (buffer.data.len(), buffer.total_size);

        if received as u64 == u64::from(total) {
            if let ContinuationState::Accumulating(buffer) =
                std::mem::take(&mut self.continuations[index])
            {
                let object = GraphicsObject::decode(
                    buffer.object_type,
                    &buffer.data,
                    buffer.start_offset,
                    options,
                )?;
                debug!(
                    slot = chunk.slot,
                    object_type = buffer.object_type,
                    bytes = received,
                    "completed continued object"
                );
                self.objects[index] = Some(object);
            }
            return Ok(ObjectUpdate::Stored);
        }

        if chunk.total_size.is_none() {
            return Err(Error::IncompleteContinuation {
                offset: chunk.offset,
                slot: chunk.slot,
                reason: format!(
                    "final chunk leaves object at {} of {} bytes",
                    received, total
                ),
            });
        }

        Ok(ObjectUpdate::Pending {
            accumulated: received as u32,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::emfplus::records::types::ObjectType;

    fn solid_brush() -> Vec<u8> {
        [0xDBC0_1002u32, 0, 0xFF11_2233]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect()
    }

    fn chunk(slot: u8, total_size: Option<u32>, data: &[u8]) -> ObjectChunk<'_> {
        ObjectChunk {
            slot,
            object_type: ObjectType::Brush as u8,
            total_size,
            data,
            offset: 0,
        }
    }

    #[test]
    fn test_store_and_replace() {
        let options = DecodeOptions::default();
        let mut table = ObjectTable::new();
        let body = solid_brush();
        assert_eq!(
            table.begin_object(chunk(3, None, &body), &options).unwrap(),
            ObjectUpdate::Stored
        );
        assert!(matches!(table.get(3), Some(GraphicsObject::Brush(_))));
        assert_eq!(table.len(), 1);

        let mut other = ObjectChunk {
            object_type: ObjectType::Path as u8,
            ..chunk(3, None, &[])
        };
        let path: Vec<u8> = [0xDBC0_1002u32, 0, 0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        other.data = &path;
        table.begin_object(other, &options).unwrap();
        assert!(matches!(table.get(3), Some(GraphicsObject::Path(_))));
        assert_eq!(table.len(), 1);

        table.clear();
        assert!(table.is_empty());
    }

    #[test]
    fn test_split_object_matches_whole() {
        let options = DecodeOptions::default();
        let body = solid_brush();
        let total = body.len() as u32;

        let mut whole = ObjectTable::new();
        whole.begin_object(chunk(0, None, &body), &options).unwrap();

        for k in 1..body.len() {
            let mut split = ObjectTable::new();
            let first = split
                .begin_object(chunk(0, Some(total), &body[..k]), &options)
                .unwrap();
            assert_eq!(
                first,
                ObjectUpdate::Pending {
                    accumulated: k as u32,
                    total
                }
            );
            assert_eq!(
                split.begin_object(chunk(0, None, &body[k..]), &options).unwrap(),
                ObjectUpdate::Stored
            );
            assert_eq!(split.get(0), whole.get(0));
            assert_eq!(split.open_continuation(), None);
        }
    }

    #[test]
    fn test_overflowing_chunk() {
        let options = DecodeOptions::default();
        let body = solid_brush();
        let mut table = ObjectTable::new();
        table.begin_object(chunk(0, Some(8), &body[..4]), &options).unwrap();
        assert!(matches!(
            table.begin_object(chunk(0, Some(8), &body[4..]), &options),
            Err(Error::OversizedAllocation { requested: 12, ceiling: 8, .. })
        ));
    }

    #[test]
    fn test_short_final_chunk() {
        let options = DecodeOptions::default();
        let body = solid_brush();
        let mut table = ObjectTable::new();
        table.begin_object(chunk(0, Some(12), &body[..4]), &options).unwrap();
        assert!(matches!(
            table.begin_object(chunk(0, None, &body[4..8]), &options),
            Err(Error::IncompleteContinuation { slot: 0, .. })
        ));
    }

    #[test]
    fn test_interleaved_slot_is_rejected() {
        let options = DecodeOptions::default();
        let body = solid_brush();
        let mut table = ObjectTable::new();
        table.begin_object(chunk(1, Some(12), &body[..4]), &options).unwrap();
        assert!(matches!(
            table.begin_object(chunk(2, None, &body), &options),
            Err(Error::IncompleteContinuation { slot: 1, .. })
        ));
        assert!(table.ensure_no_open_continuation(0, "end of stream").is_err());
    }

    #[test]
    fn test_total_size_ceiling() {
        let options = DecodeOptions {
            max_object_size: 64,
            ..DecodeOptions::default()
        };
        let mut table = ObjectTable::new();
        assert!(matches!(
            table.begin_object(chunk(0, Some(1 << 30), &[0; 4]), &options),
            Err(Error::OversizedAllocation { ceiling: 64, .. })
        ));
        assert_eq!(table.open_continuation(), None);
    }

    #[test]
    fn test_continue_without_open_buffer() {
        let mut table = ObjectTable::new();
        assert!(matches!(
            table.continue_object(chunk(5, None, &[0; 4]), &DecodeOptions::default()),
            Err(Error::IncompleteContinuation { slot: 5, .. })
        ));
    }

    #[test]
    fn test_slot_out_of_range() {
        let mut table = ObjectTable::new();
        assert!(matches!(
            table.begin_object(chunk(64, None, &[]), &DecodeOptions::default()),
            Err(Error::MalformedRecord { .. })
        ));
    }
}
