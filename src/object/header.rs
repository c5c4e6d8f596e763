//! Object Header - Metadata Prefix on Every Heap Object
//!
//! Header Layout (8 bytes, immediately before the user-visible address):
//! ```text
//! ┌──────────────────────────────────────────┬───────┬─────────┐
//! │            Kind-specific payload         │ Found │  Kind   │
//! │                bits 3-63                 │ bit 2 │ bits 0-1│
//! └──────────────────────────────────────────┴───────┴─────────┘
//!
//! Kind = Data:       payload byte size in bits 3-63
//! Kind = Struct:     layout id in bits 32-63
//! Kind = Forwarding: forwarded user address in bits 3-63
//!                    (addresses are word-aligned, the low bits carry
//!                     the tag)
//! ```
//!
//! A user-visible pointer always points to the byte just after its
//! header. The "found" mark is only ever set on struct objects, during
//! the traversal that expands the root set, and is cleared again before
//! the cycle ends.

use crate::error::{GcError, Result};
use crate::object::layout::{LayoutRegistry, StructLayout};

/// Size of the object header in bytes
pub const HEADER_SIZE: usize = 8;

/// Kind tag bit width and masks
const KIND_MASK: u64 = 0b11;
const FOUND_MASK: u64 = 0b100;
const TAG_BITS: u64 = 0b111;

const KIND_DATA: u64 = 0b00;
const KIND_STRUCT: u64 = 0b01;
const KIND_FORWARDING: u64 = 0b10;

/// Shift for the layout id of a struct header
const LAYOUT_SHIFT: u64 = 32;

/// Shift for the payload size of a data header
const SIZE_SHIFT: u64 = 3;

/// Object kind recorded in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    /// Payload is raw bytes of a known size
    Data,
    /// Payload is a struct whose shape lives in the layout registry
    Struct,
    /// Payload has been evacuated; the header holds the new address
    Forwarding,
}

/// Header - the 8-byte metadata word, as a value
///
/// Pure bit manipulation; reading and writing heap memory is done by
/// the free functions below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header(u64);

impl Header {
    /// Header for a raw data object of `payload` bytes
    pub fn new_data(payload: usize) -> Self {
        Header(((payload as u64) << SIZE_SHIFT) | KIND_DATA)
    }

    /// Header for a struct object with an interned layout id
    pub fn new_struct(layout_id: u32) -> Self {
        Header(((layout_id as u64) << LAYOUT_SHIFT) | KIND_STRUCT)
    }

    /// Forwarding header pointing at the evacuated copy
    ///
    /// `user_addr` must be word-aligned; the low bits carry the tag.
    pub fn new_forwarding(user_addr: usize) -> Self {
        debug_assert!(user_addr as u64 & TAG_BITS == 0);
        Header(user_addr as u64 | KIND_FORWARDING)
    }

    /// Object kind
    pub fn kind(&self) -> HeaderKind {
        match self.0 & KIND_MASK {
            KIND_DATA => HeaderKind::Data,
            KIND_STRUCT => HeaderKind::Struct,
            _ => HeaderKind::Forwarding,
        }
    }

    /// Payload size of a data header
    pub fn data_size(&self) -> usize {
        debug_assert_eq!(self.kind(), HeaderKind::Data);
        (self.0 >> SIZE_SHIFT) as usize
    }

    /// Layout id of a struct header
    pub fn layout_id(&self) -> u32 {
        debug_assert_eq!(self.kind(), HeaderKind::Struct);
        (self.0 >> LAYOUT_SHIFT) as u32
    }

    /// Forwarded user-visible address of a forwarding header
    pub fn forwarding_address(&self) -> usize {
        debug_assert_eq!(self.kind(), HeaderKind::Forwarding);
        (self.0 & !TAG_BITS) as usize
    }

    /// Check the traversal mark
    pub fn is_found(&self) -> bool {
        self.0 & FOUND_MASK != 0
    }

    /// Set the traversal mark
    pub fn with_found(self) -> Self {
        Header(self.0 | FOUND_MASK)
    }

    /// Clear the traversal mark
    pub fn without_found(self) -> Self {
        Header(self.0 & !FOUND_MASK)
    }
}

// === Heap memory access ===
//
// All functions below take user-visible addresses: the header word
// lives at `user - HEADER_SIZE`.

/// Read the header of the object at a user-visible address
///
/// # Safety
/// `user` must point just past a valid header inside the managed region.
#[inline]
pub unsafe fn read(user: usize) -> Header {
    Header(*((user - HEADER_SIZE) as *const u64))
}

/// Overwrite the header of the object at a user-visible address
///
/// # Safety
/// Same contract as [`read`].
#[inline]
pub unsafe fn write(user: usize, header: Header) {
    *((user - HEADER_SIZE) as *mut u64) = header.0;
}

/// Install a data header at a raw allocation, returning the user address
///
/// # Safety
/// `raw` must point at `HEADER_SIZE + payload` writable bytes.
pub unsafe fn install_data(raw: usize, payload: usize) -> usize {
    *(raw as *mut u64) = Header::new_data(payload).0;
    raw + HEADER_SIZE
}

/// Install a struct header at a raw allocation, returning the user address
///
/// # Safety
/// `raw` must point at a writable region large enough for the struct.
pub unsafe fn install_struct(raw: usize, layout_id: u32) -> usize {
    *(raw as *mut u64) = Header::new_struct(layout_id).0;
    raw + HEADER_SIZE
}

/// Copy the header of `src_user` to a raw destination, returning the
/// destination's user address
///
/// # Safety
/// `src_user` must head a live object; `raw_dst` must be writable.
pub unsafe fn copy(src_user: usize, raw_dst: usize) -> usize {
    *(raw_dst as *mut u64) = read(src_user).0;
    raw_dst + HEADER_SIZE
}

/// Replace the header at `src_user` with a forwarding header to `dst_user`
///
/// # Safety
/// Same contract as [`read`]; the source payload stays readable until
/// the caller has copied it out.
pub unsafe fn forward(src_user: usize, dst_user: usize) {
    write(src_user, Header::new_forwarding(dst_user));
}

/// Set the traversal mark on the object at `user`
///
/// # Safety
/// Same contract as [`read`].
pub unsafe fn mark_found(user: usize) {
    write(user, read(user).with_found());
}

/// Clear the traversal mark on the object at `user`
///
/// # Safety
/// Same contract as [`read`].
pub unsafe fn clear_found(user: usize) {
    write(user, read(user).without_found());
}

/// Check the traversal mark on the object at `user`
///
/// # Safety
/// Same contract as [`read`].
pub unsafe fn is_found(user: usize) -> bool {
    read(user).is_found()
}

// === Sizes ===

/// Total size of a new struct allocation, header included
pub fn size_of_new_struct(layout: &StructLayout) -> usize {
    HEADER_SIZE + layout.size()
}

/// Total size of a new data allocation, header included
pub fn size_of_new_data(payload: usize) -> usize {
    HEADER_SIZE + payload
}

/// Total size (header + payload) of the live object at `user`
///
/// # Safety
/// `user` must head a live, non-forwarded object.
pub unsafe fn size_of_existing(registry: &LayoutRegistry, user: usize) -> Result<usize> {
    Ok(HEADER_SIZE + data_size_of_existing(registry, user)?)
}

/// Payload size of the live object at `user`
///
/// # Safety
/// `user` must head a live, non-forwarded object.
pub unsafe fn data_size_of_existing(registry: &LayoutRegistry, user: usize) -> Result<usize> {
    let header = read(user);
    match header.kind() {
        HeaderKind::Data => Ok(header.data_size()),
        HeaderKind::Struct => Ok(registry.get(header.layout_id())?.size()),
        HeaderKind::Forwarding => Err(GcError::InvalidPointer { address: user }),
    }
}

/// Addresses of every pointer slot inside the struct at `user`
///
/// Returns slot addresses (not slot values), so rewriting a slot
/// updates the object in place.
///
/// # Safety
/// `user` must head a live struct object.
pub unsafe fn pointer_slots(registry: &LayoutRegistry, user: usize) -> Result<Vec<usize>> {
    let header = read(user);
    debug_assert_eq!(header.kind(), HeaderKind::Struct);
    let layout = registry.get(header.layout_id())?;
    Ok(layout.refs().offsets().map(|off| user + off).collect())
}
