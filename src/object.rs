//! Indirect object references and document identity.

use uuid::Uuid;

/// Reference to an indirect object.
///
/// A reference is an immutable (object number, generation number) pair
/// identifying one slot in the cross-reference table. Two references are
/// equal iff both fields match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Object number
    pub number: u32,
    /// Generation number
    pub generation: u16,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

/// Two-part binary document identifier written as the trailer /ID entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentId {
    /// Permanent identifier, fixed at first creation
    pub one: Vec<u8>,
    /// Changing identifier, regenerated on each revision
    pub two: Vec<u8>,
}

impl DocumentId {
    /// Create a document id from explicit parts.
    pub fn new(one: Vec<u8>, two: Vec<u8>) -> Self {
        Self { one, two }
    }

    /// Create a fresh random document id.
    pub fn random() -> Self {
        Self {
            one: Uuid::new_v4().as_bytes().to_vec(),
            two: Uuid::new_v4().as_bytes().to_vec(),
        }
    }

    /// Keep the permanent part of an earlier revision's id and generate
    /// a fresh changing part, as an incremental update requires.
    pub fn renew(one: Vec<u8>) -> Self {
        Self {
            one,
            two: Uuid::new_v4().as_bytes().to_vec(),
        }
    }
}
