use recollect_core::{Message, Role};

use crate::error::ImportError;

/// A parsed message paired with its position in the parsed file.
#[derive(Debug, Clone, Copy)]
pub struct IndexedMessage<'a> {
    pub original_order: usize,
    pub message: &'a Message,
}

/// Pair every message with its index, optionally leaving out `system` turns.
/// Indices always refer to the full parsed sequence.
pub fn select(messages: &[Message], skip_system: bool) -> Vec<IndexedMessage<'_>> {
    messages
        .iter()
        .enumerate()
        .filter(|(_, m)| !(skip_system && m.role == Role::System))
        .map(|(original_order, message)| IndexedMessage {
            original_order,
            message,
        })
        .collect()
}

/// One contiguous slice of the selection.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'s, 'a> {
    /// 1-indexed.
    pub number: usize,
    pub total: usize,
    pub entries: &'s [IndexedMessage<'a>],
}

impl Batch<'_, '_> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_last(&self) -> bool {
        self.number == self.total
    }
}

/// Split `entries` into batches of `batch_size`; only the last may be short.
pub fn partition<'s, 'a>(
    entries: &'s [IndexedMessage<'a>],
    batch_size: usize,
) -> Result<Vec<Batch<'s, 'a>>, ImportError> {
    if batch_size == 0 {
        return Err(ImportError::ZeroBatchSize);
    }
    let total = entries.len().div_ceil(batch_size);
    Ok(entries
        .chunks(batch_size)
        .enumerate()
        .map(|(i, entries)| Batch {
            number: i + 1,
            total,
            entries,
        })
        .collect())
}
