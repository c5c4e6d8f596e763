//! Struct Layouts - Parsing and Interning Object Shapes
//!
//! A struct's shape is described by a layout string:
//!
//! | char | field            | size | alignment |
//! |------|------------------|------|-----------|
//! | `*`  | heap reference   | 8    | 8         |
//! | `l`  | long integer     | 8    | 8         |
//! | `d`  | double           | 8    | 8         |
//! | `i`  | integer          | 4    | 4         |
//! | `f`  | float            | 4    | 4         |
//! | `c`  | char / byte      | 1    | 1         |
//!
//! A decimal prefix repeats the following field character, so `"3*2i"`
//! is three references followed by two integers. Fields take natural
//! alignment and the total payload is rounded up to a word.
//!
//! Parsed layouts are interned in a registry; the index of a layout in
//! insertion order is the id stored in struct headers, so a header
//! stays valid for the lifetime of its heap no matter how often the
//! object moves.

use crate::error::{GcError, Result};
use crate::object::refmap::{ReferenceMap, MAX_TRACKED_SIZE};
use crate::util::alignment;
use indexmap::IndexMap;

/// One parsed struct shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout {
    /// Payload size in bytes, word-aligned
    size: usize,

    /// Positions of reference slots within the payload
    refs: ReferenceMap,
}

impl StructLayout {
    /// Parse a layout string
    ///
    /// # Errors
    /// `InvalidLayout` on an empty string, an unknown field character,
    /// a trailing repeat count, or a zero repeat count.
    pub fn parse(layout: &str) -> Result<Self> {
        if layout.is_empty() {
            return Err(GcError::InvalidLayout("empty layout string".to_string()));
        }

        let mut offset = 0usize;
        let mut pointer_offsets = Vec::new();
        let mut chars = layout.chars().peekable();

        while let Some(c) = chars.next() {
            let repeat = if c.is_ascii_digit() {
                let mut n = c as usize - '0' as usize;
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                    n = n * 10 + (d as usize - '0' as usize);
                    chars.next();
                }
                if n == 0 {
                    return Err(GcError::InvalidLayout(format!(
                        "zero repeat count in layout {:?}",
                        layout
                    )));
                }
                n
            } else {
                1
            };

            let field = if c.is_ascii_digit() {
                chars.next().ok_or_else(|| {
                    GcError::InvalidLayout(format!("trailing repeat count in layout {:?}", layout))
                })?
            } else {
                c
            };

            let (size, align) = match field {
                '*' | 'l' | 'd' => (8, 8),
                'i' | 'f' => (4, 4),
                'c' => (1, 1),
                other => {
                    return Err(GcError::InvalidLayout(format!(
                        "unknown field character {:?} in layout {:?}",
                        other, layout
                    )));
                }
            };

            for _ in 0..repeat {
                offset = alignment::align_up(offset, align);
                if field == '*' {
                    pointer_offsets.push(offset);
                }
                offset += size;
            }
        }

        let size = alignment::word_align(offset);
        if size > MAX_TRACKED_SIZE {
            return Err(GcError::ObjectTooLarge {
                size,
                max: MAX_TRACKED_SIZE,
            });
        }

        Ok(Self {
            size,
            refs: ReferenceMap::new(&pointer_offsets),
        })
    }

    /// Payload size in bytes (word-aligned, header excluded)
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Reference slot positions
    #[inline]
    pub fn refs(&self) -> &ReferenceMap {
        &self.refs
    }
}

/// LayoutRegistry - interning table from layout string to shape
///
/// Insertion order is stable, so the index of an entry doubles as the
/// layout id carried in struct headers.
pub struct LayoutRegistry {
    layouts: IndexMap<Box<str>, StructLayout>,
}

impl LayoutRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            layouts: IndexMap::new(),
        }
    }

    /// Intern a layout string, parsing it on first sight
    ///
    /// Returns the layout id to store in headers.
    pub fn intern(&mut self, layout: &str) -> Result<u32> {
        if let Some(index) = self.layouts.get_index_of(layout) {
            return Ok(index as u32);
        }

        let parsed = StructLayout::parse(layout)?;
        let (index, _) = self.layouts.insert_full(layout.into(), parsed);
        Ok(index as u32)
    }

    /// Look up a layout by id
    ///
    /// Ids only come from `intern`, so a miss means a corrupted header.
    pub fn get(&self, id: u32) -> Result<&StructLayout> {
        self.layouts
            .get_index(id as usize)
            .map(|(_, layout)| layout)
            .ok_or(GcError::InvalidPointer {
                address: id as usize,
            })
    }

    /// Number of interned layouts
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self::new()
    }
}
