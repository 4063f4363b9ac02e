// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Serialization of structured containers.

A container describes itself as an ordered sequence of [Node]s. Each node is
either a fixed layout value, whose fields are encoded little-endian in their
declaration order, or a streamable payload, whose bytes are copied verbatim
from their source. Writing a container is a single pass over its nodes.
*/

use {crate::error::Result, std::io::Write};

/// A value with a size that does not depend on anything outside itself.
///
/// Implementations write their fields in declaration order, recursing into
/// nested values in place.
pub trait FixedLayout {
    /// Number of bytes [Self::write_le] emits.
    fn layout_size(&self) -> u64;

    /// Write all fields in little-endian byte order.
    fn write_le(&self, dest: &mut dyn Write) -> std::io::Result<()>;
}

/// A byte payload that is copied to the output rather than encoded.
pub trait StreamPayload {
    fn payload_len(&self) -> u64;

    /// Copy exactly [Self::payload_len] bytes to `dest`.
    fn stream_to(&self, dest: &mut dyn Write) -> Result<()>;
}

/// An element of a serialized container.
#[derive(Clone, Copy)]
pub enum Node<'n> {
    Fixed(&'n dyn FixedLayout),
    Payload(&'n dyn StreamPayload),
}

impl<'n> Node<'n> {
    /// Number of bytes this node occupies in the output.
    pub fn size(&self) -> u64 {
        match self {
            Self::Fixed(v) => v.layout_size(),
            Self::Payload(p) => p.payload_len(),
        }
    }

    fn write(&self, dest: &mut dyn Write) -> Result<()> {
        match self {
            Self::Fixed(v) => v.write_le(dest)?,
            Self::Payload(p) => p.stream_to(dest)?,
        }

        Ok(())
    }
}

impl<'n> std::fmt::Debug for Node<'n> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(v) => write!(f, "Fixed({} bytes)", v.layout_size()),
            Self::Payload(p) => write!(f, "Payload({} bytes)", p.payload_len()),
        }
    }
}

/// Something that can be written as a flat sequence of nodes.
pub trait Tree {
    /// Append nodes describing this value, in output order.
    fn collect_nodes<'n>(&'n self, nodes: &mut Vec<Node<'n>>);

    fn nodes(&self) -> Vec<Node<'_>> {
        let mut nodes = Vec::new();
        self.collect_nodes(&mut nodes);
        nodes
    }
}

impl<T: FixedLayout> FixedLayout for Vec<T> {
    fn layout_size(&self) -> u64 {
        self.iter().map(FixedLayout::layout_size).sum()
    }

    fn write_le(&self, dest: &mut dyn Write) -> std::io::Result<()> {
        for v in self {
            v.write_le(dest)?;
        }

        Ok(())
    }
}

/// Sum of the sizes of a sequence of nodes.
pub fn nodes_size(nodes: &[Node<'_>]) -> u64 {
    nodes.iter().map(Node::size).sum()
}

/// Write a tree to a destination.
///
/// The first error aborts writing. Bytes already handed to `dest` are not
/// rolled back.
///
/// Returns the number of bytes written.
pub fn write_tree<W: Write>(tree: &impl Tree, dest: &mut W) -> Result<u64> {
    let mut written = 0;

    for node in tree.nodes() {
        node.write(dest)?;
        written += node.size();
    }

    Ok(written)
}

/// Zero bytes used to align the following node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Padding(pub u32);

impl Padding {
    /// Padding needed to bring `offset` to a multiple of `alignment`.
    pub fn to_align(offset: u64, alignment: u64) -> Self {
        Self(((alignment - offset % alignment) % alignment) as u32)
    }
}

impl FixedLayout for Padding {
    fn layout_size(&self) -> u64 {
        self.0 as u64
    }

    fn write_le(&self, dest: &mut dyn Write) -> std::io::Result<()> {
        const ZEROS: [u8; 8] = [0; 8];

        let mut remaining = self.0 as usize;
        while remaining > 0 {
            let chunk = remaining.min(ZEROS.len());
            dest.write_all(&ZEROS[..chunk])?;
            remaining -= chunk;
        }

        Ok(())
    }
}
