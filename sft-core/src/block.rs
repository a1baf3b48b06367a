//! Block planning for block-blob uploads.
//!
//! A file is cut into fixed-size blocks which are PUT individually and then
//! committed with a block list. This module decides how many blocks a file
//! needs, what each block is called, and what the commit body looks like.
//! It never touches the file itself.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::fmt;
use thiserror::Error;

/// Size of one upload block (4 MiB, the storage service maximum).
pub const BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Maximum number of blocks a single blob may be committed with.
///
/// At [`BLOCK_SIZE`] this caps one blob at roughly 200 GB.
pub const MAX_BLOCKS_PER_BLOB: u64 = 50_000;

/// Errors produced while planning an upload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// Block size of zero.
    #[error("block size must be greater than zero")]
    ZeroBlockSize,

    /// Block size above the service maximum.
    #[error("block size {size} exceeds the maximum of {max} bytes")]
    BlockSizeTooLarge {
        /// Requested size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// File would need more blocks than a blob can hold.
    #[error("file of {len} bytes needs {count} blocks, more than the limit of {max}")]
    TooManyBlocks {
        /// File length in bytes.
        len: u64,
        /// Blocks required.
        count: u64,
        /// Blocks allowed.
        max: u64,
    },
}

/// Identifier of one block within a blob.
///
/// Every identifier has the form `block` followed by an eight-digit,
/// zero-padded index, so all IDs of one blob share the same length.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(String);

impl BlockId {
    /// Derive the identifier for block `index`.
    pub fn from_index(index: u32) -> Self {
        Self(format!("block{:08}", index))
    }

    /// The raw (unencoded) identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Base64 form used in the `blockid` query parameter and the block list.
    pub fn encoded(&self) -> String {
        BASE64.encode(self.0.as_bytes())
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position of one block inside the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    /// Zero-based block index.
    pub index: u32,
    /// Byte offset of the first byte of the block.
    pub offset: u64,
    /// Number of bytes in the block.
    pub len: usize,
}

impl BlockSpan {
    /// Identifier of this block.
    pub fn id(&self) -> BlockId {
        BlockId::from_index(self.index)
    }
}

/// A block read from disk, ready to be sent.
#[derive(Clone, PartialEq, Eq)]
pub struct TransferBlock {
    /// Zero-based block index.
    pub index: u32,
    /// Block identifier derived from the index.
    pub id: BlockId,
    /// Block contents, at most one block size long.
    pub payload: Vec<u8>,
}

impl TransferBlock {
    /// Create a block from its index and contents.
    pub fn new(index: u32, payload: Vec<u8>) -> Self {
        Self {
            index,
            id: BlockId::from_index(index),
            payload,
        }
    }
}

impl fmt::Debug for TransferBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferBlock")
            .field("index", &self.index)
            .field("id", &self.id)
            .field("payload", &format_args!("[{} bytes]", self.payload.len()))
            .finish()
    }
}

/// How a file of a given length is divided into blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPlan {
    total_len: u64,
    block_size: usize,
}

impl BlockPlan {
    /// Plan an upload of `total_len` bytes in blocks of `block_size`.
    pub fn new(total_len: u64, block_size: usize) -> Result<Self, PlanError> {
        if block_size == 0 {
            return Err(PlanError::ZeroBlockSize);
        }
        if block_size > BLOCK_SIZE {
            return Err(PlanError::BlockSizeTooLarge {
                size: block_size,
                max: BLOCK_SIZE,
            });
        }

        let plan = Self {
            total_len,
            block_size,
        };
        let count = plan.block_count();
        if count > MAX_BLOCKS_PER_BLOB {
            return Err(PlanError::TooManyBlocks {
                len: total_len,
                count,
                max: MAX_BLOCKS_PER_BLOB,
            });
        }
        Ok(plan)
    }

    /// Total bytes covered by the plan.
    pub fn total_len(&self) -> u64 {
        self.total_len
    }

    /// Size of every block except possibly the last.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of blocks. A multiple of the block size has no trailing
    /// empty block, and an empty file has no blocks at all.
    pub fn block_count(&self) -> u64 {
        self.total_len.div_ceil(self.block_size as u64)
    }

    /// Blocks in file order.
    pub fn spans(&self) -> impl Iterator<Item = BlockSpan> + '_ {
        let size = self.block_size as u64;
        (0..self.block_count()).map(move |i| {
            let offset = i * size;
            let len = (self.total_len - offset).min(size) as usize;
            BlockSpan {
                index: i as u32,
                offset,
                len,
            }
        })
    }

    /// Identifiers of all blocks, in commit order.
    pub fn block_ids(&self) -> Vec<BlockId> {
        self.spans().map(|span| span.id()).collect()
    }
}

/// Build the XML body that commits `ids` as the blob's content, in order.
pub fn block_list_xml<'a, I>(ids: I) -> String
where
    I: IntoIterator<Item = &'a BlockId>,
{
    let mut xml = String::from(r#"<?xml version="1.0" encoding="utf-8"?><BlockList>"#);
    for id in ids {
        xml.push_str("<Latest>");
        xml.push_str(&id.encoded());
        xml.push_str("</Latest>");
    }
    xml.push_str("</BlockList>");
    xml
}
