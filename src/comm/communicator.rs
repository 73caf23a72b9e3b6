//! Transport abstraction for patch exchange.
//!
//! The stepper and its links only see this trait: non-blocking sends and
//! receives that return waitable handles, FIFO-ordered per (source,
//! destination, tag) triple. Two implementations ship with the crate:
//! [`NoComm`] for serial runs and [`ThreadComm`] for in-process multi-rank
//! runs, one thread per rank over a shared mailbox. An MPI-backed
//! implementation plugs in from outside through the same trait.
//!
//! Wire conventions for higher layers: all integers little-endian fixed
//! width, payload structs `#[repr(C)]` and `bytemuck`-castable.

use hashbrown::HashMap;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;

/// Transport-level failure, attributed to the peer involved.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommError {
    #[error("send to rank {peer} failed: {reason}")]
    SendFailed { peer: usize, reason: String },
    #[error("receive from rank {peer} failed: {reason}")]
    RecvFailed { peer: usize, reason: String },
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

/// Non-blocking completion test.
pub trait PollWait {
    /// Return `Some(bytes)` if the operation has completed, otherwise `None`.
    fn try_wait(&mut self) -> Option<Vec<u8>>;
}

/// Non-blocking communication interface (minimal by design).
pub trait Communicator: Send + Sync + 'static {
    type SendHandle: Wait + Send;
    type RecvHandle: Wait + Send;

    /// Post a send. The buffer is captured; completion is observed through
    /// the handle.
    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Result<Self::SendHandle, CommError>;

    /// Post a receive of up to `max_len` bytes.
    fn irecv(&self, peer: usize, tag: u16, max_len: usize) -> Result<Self::RecvHandle, CommError>;

    /// Rank of this process (0..size).
    fn rank(&self) -> usize;

    /// Total number of ranks.
    fn size(&self) -> usize;

    /// True for the serial stub (test logic keys off this).
    fn is_serial(&self) -> bool {
        false
    }
}

/// Tag newtype for safer tag arithmetic.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct CommTag(u16);

impl CommTag {
    #[inline]
    pub const fn new(tag: u16) -> Self {
        Self(tag)
    }

    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Offset the tag by `dx`, wrapping on overflow.
    #[inline]
    pub const fn offset(self, dx: u16) -> Self {
        Self(self.0.wrapping_add(dx))
    }
}

impl From<u16> for CommTag {
    #[inline]
    fn from(tag: u16) -> Self {
        Self(tag)
    }
}

/// Tag for ghost-zone patch links.
pub const PATCH_LINK_TAG: CommTag = CommTag::new(0x40);
/// Tag for the bounding-box all-gather at update-group construction.
pub const BOUNDING_BOX_TAG: CommTag = CommTag::new(0x41);

/// Compile-time no-op comm for pure serial runs.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

impl PollWait for () {
    fn try_wait(&mut self) -> Option<Vec<u8>> {
        None
    }
}

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) -> Result<(), CommError> {
        Ok(())
    }

    fn irecv(&self, _peer: usize, _tag: u16, _max_len: usize) -> Result<(), CommError> {
        Ok(())
    }

    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn is_serial(&self) -> bool {
        true
    }
}

// --- ThreadComm: one thread per rank over a shared mailbox ---

type Key = (usize, usize, u16); // (src, dst, tag)

#[derive(Default)]
struct Slot {
    queue: VecDeque<Vec<u8>>,
}

#[derive(Default)]
struct Mailbox {
    slots: Mutex<HashMap<Key, Arc<(Mutex<Slot>, Condvar)>>>,
}

impl Mailbox {
    fn entry(&self, key: Key) -> Arc<(Mutex<Slot>, Condvar)> {
        self.slots.lock().entry(key).or_default().clone()
    }
}

/// In-process communicator: every rank of one universe shares a mailbox, and
/// messages queue FIFO per (source, destination, tag). Distinct universes are
/// fully isolated, so concurrent tests cannot cross-talk.
#[derive(Clone)]
pub struct ThreadComm {
    rank: usize,
    size: usize,
    mailbox: Arc<Mailbox>,
}

impl ThreadComm {
    /// Create all ranks of one universe.
    pub fn universe(size: usize) -> Vec<ThreadComm> {
        let mailbox = Arc::new(Mailbox::default());
        (0..size)
            .map(|rank| ThreadComm {
                rank,
                size,
                mailbox: mailbox.clone(),
            })
            .collect()
    }
}

pub struct ThreadSendHandle;

impl Wait for ThreadSendHandle {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

impl PollWait for ThreadSendHandle {
    fn try_wait(&mut self) -> Option<Vec<u8>> {
        None
    }
}

pub struct ThreadRecvHandle {
    cell: Arc<(Mutex<Slot>, Condvar)>,
    want_len: usize,
}

impl Wait for ThreadRecvHandle {
    fn wait(self) -> Option<Vec<u8>> {
        let (lock, condvar) = &*self.cell;
        let mut slot = lock.lock();
        while slot.queue.is_empty() {
            condvar.wait(&mut slot);
        }
        let mut msg = slot.queue.pop_front().expect("queue non-empty");
        msg.truncate(self.want_len.min(msg.len()));
        Some(msg)
    }
}

impl PollWait for ThreadRecvHandle {
    fn try_wait(&mut self) -> Option<Vec<u8>> {
        let (lock, _) = &*self.cell;
        let mut slot = lock.lock();
        let mut msg = slot.queue.pop_front()?;
        msg.truncate(self.want_len.min(msg.len()));
        Some(msg)
    }
}

impl Communicator for ThreadComm {
    type SendHandle = ThreadSendHandle;
    type RecvHandle = ThreadRecvHandle;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Result<ThreadSendHandle, CommError> {
        if peer >= self.size {
            return Err(CommError::SendFailed {
                peer,
                reason: format!("rank out of range (universe size {})", self.size),
            });
        }
        let entry = self.mailbox.entry((self.rank, peer, tag));
        let (lock, condvar) = &*entry;
        lock.lock().queue.push_back(buf.to_vec());
        condvar.notify_all();
        Ok(ThreadSendHandle)
    }

    fn irecv(&self, peer: usize, tag: u16, max_len: usize) -> Result<ThreadRecvHandle, CommError> {
        if peer >= self.size {
            return Err(CommError::RecvFailed {
                peer,
                reason: format!("rank out of range (universe size {})", self.size),
            });
        }
        Ok(ThreadRecvHandle {
            cell: self.mailbox.entry((peer, self.rank, tag)),
            want_len: max_len,
        })
    }

    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }
}
