//! Patch links: point-to-point ghost-zone transport.
//!
//! A link ships one region's cells between a pair of ranks on the charged
//! calendar. The sender serializes the cells in canonical streak order behind
//! a versioned header; the receiver posts an exactly-sized buffer, validates
//! the header (step, region fingerprint, wire version) and scatters the
//! payload into its grid. Messages on one link arrive in step order because
//! the transport is FIFO per (source, destination, tag).
//!
//! Links never hold a grid reference; the stepper passes the grid into every
//! `put`/`get` call, which keeps ownership acyclic.

use crate::cell::PatchWire;
use crate::comm::communicator::{CommTag, Communicator, Wait};
use crate::comm::wire::{self, PatchHeader, KIND_ABORT, KIND_PATCH, WIRE_VERSION};
use crate::geometry::coord::Coord;
use crate::geometry::region::Region;
use crate::patch::{scatter_region, NanoStepCalendar, PatchAccepter, PatchProvider};
use crate::sim_error::GridHaloError;
use crate::storage::grid::Grid;
use std::marker::PhantomData;
use std::sync::Arc;

const HEADER_LEN: usize = std::mem::size_of::<PatchHeader>();

/// Sender half: ships the configured region to `peer`.
pub struct PatchLinkAccepter<C: PatchWire, const D: usize, T: Communicator> {
    region: Region<D>,
    fingerprint: u64,
    peer: usize,
    tag: CommTag,
    comm: Arc<T>,
    calendar: NanoStepCalendar,
    pending: Vec<T::SendHandle>,
    _cell: PhantomData<fn(&C)>,
}

impl<C: PatchWire, const D: usize, T: Communicator> PatchLinkAccepter<C, D, T> {
    pub fn new(region: Region<D>, peer: usize, tag: CommTag, comm: Arc<T>) -> Self {
        let fingerprint = region.fingerprint();
        Self {
            region,
            fingerprint,
            peer,
            tag,
            comm,
            calendar: NanoStepCalendar::new(),
            pending: Vec::new(),
            _cell: PhantomData,
        }
    }

    pub fn charge(&mut self, first: u64, last: u64, stride: u64) {
        self.calendar.charge(first, last, stride);
    }

    pub fn region(&self) -> &Region<D> {
        &self.region
    }

    pub fn peer(&self) -> usize {
        self.peer
    }

    /// Wait out all in-flight sends.
    pub fn drain(&mut self) {
        for handle in self.pending.drain(..) {
            let _ = handle.wait();
        }
    }
}

impl<C, const D: usize, T> PatchAccepter<C, D> for PatchLinkAccepter<C, D, T>
where
    C: PatchWire + Clone + Send,
    T: Communicator,
{
    fn next_required_nano_step(&self) -> Option<u64> {
        self.calendar.next()
    }

    fn push_request(&mut self, nano_step: u64) -> Result<(), GridHaloError> {
        self.calendar.push_request(nano_step)
    }

    fn put(
        &mut self,
        grid: &Grid<C, D>,
        valid_region: &Region<D>,
        _global_dimensions: Coord<D>,
        nano_step: u64,
    ) -> Result<(), GridHaloError> {
        if !self.calendar.is_due(nano_step) {
            return Ok(());
        }
        debug_assert_eq!(
            (&self.region - valid_region).size(),
            0,
            "link region escapes the valid region"
        );
        self.drain();

        let header = PatchHeader::new_patch(
            self.comm.rank(),
            nano_step,
            self.fingerprint,
            self.region.size(),
        );
        let mut message =
            Vec::with_capacity(HEADER_LEN + self.region.size() * std::mem::size_of::<C::Wire>());
        message.extend_from_slice(bytemuck::bytes_of(&header));
        for streak in self.region.streaks() {
            for cell in grid.streak(&streak) {
                message.extend_from_slice(bytemuck::bytes_of(&cell.to_wire()));
            }
        }

        let handle = self
            .comm
            .isend(self.peer, self.tag.as_u16(), &message)
            .map_err(|source| GridHaloError::PatchSendFailed {
                peer: self.peer,
                nano_step,
                source,
            })?;
        self.pending.push(handle);
        self.calendar.advance(nano_step);
        Ok(())
    }

    fn poison(&mut self, nano_step: u64) {
        // teardown path: the peer decodes this into PeerAborted instead of
        // blocking forever
        let header = PatchHeader::new_abort(self.comm.rank(), nano_step);
        let _ = self
            .comm
            .isend(self.peer, self.tag.as_u16(), bytemuck::bytes_of(&header));
        self.calendar.clear();
    }
}

impl<C: PatchWire, const D: usize, T: Communicator> Drop for PatchLinkAccepter<C, D, T> {
    fn drop(&mut self) {
        self.drain();
    }
}

/// Receiver half: fills the configured region from `peer`.
pub struct PatchLinkProvider<C: PatchWire, const D: usize, T: Communicator> {
    region: Region<D>,
    fingerprint: u64,
    peer: usize,
    tag: CommTag,
    comm: Arc<T>,
    calendar: NanoStepCalendar,
    scratch: Vec<C>,
}

impl<C: PatchWire + Clone, const D: usize, T: Communicator> PatchLinkProvider<C, D, T> {
    pub fn new(region: Region<D>, peer: usize, tag: CommTag, comm: Arc<T>) -> Self {
        let fingerprint = region.fingerprint();
        Self {
            region,
            fingerprint,
            peer,
            tag,
            comm,
            calendar: NanoStepCalendar::new(),
            scratch: Vec::new(),
        }
    }

    pub fn charge(&mut self, first: u64, last: u64, stride: u64) {
        self.calendar.charge(first, last, stride);
    }

    pub fn region(&self) -> &Region<D> {
        &self.region
    }

    pub fn peer(&self) -> usize {
        self.peer
    }

    fn expected_len(&self) -> usize {
        HEADER_LEN + self.region.size() * std::mem::size_of::<C::Wire>()
    }

    fn decode(&mut self, raw: &[u8], nano_step: u64) -> Result<(), GridHaloError> {
        if raw.len() < HEADER_LEN {
            return Err(GridHaloError::PatchSizeMismatch {
                peer: self.peer,
                expected: self.expected_len(),
                got: raw.len(),
            });
        }
        let header: PatchHeader = wire::read_unaligned(&raw[..HEADER_LEN]);
        if header.version() != WIRE_VERSION {
            return Err(GridHaloError::WireVersionMismatch {
                expected: WIRE_VERSION,
                got: header.version(),
            });
        }
        match header.kind() {
            KIND_ABORT => {
                return Err(GridHaloError::PeerAborted {
                    peer: header.rank(),
                    nano_step: header.step(),
                });
            }
            KIND_PATCH => {}
            _ => {
                return Err(GridHaloError::PatchRecvFailed {
                    peer: self.peer,
                    nano_step,
                });
            }
        }
        if header.step() != nano_step {
            return Err(GridHaloError::PatchStepMismatch {
                peer: self.peer,
                expected: nano_step,
                got: header.step(),
            });
        }
        if header.fingerprint() != self.fingerprint {
            return Err(GridHaloError::RegionFingerprintMismatch {
                peer: self.peer,
                expected: self.fingerprint,
                got: header.fingerprint(),
            });
        }
        if raw.len() != self.expected_len() || header.n_cells() != self.region.size() {
            return Err(GridHaloError::PatchSizeMismatch {
                peer: self.peer,
                expected: self.expected_len(),
                got: raw.len(),
            });
        }
        let wire_size = std::mem::size_of::<C::Wire>();
        self.scratch.clear();
        self.scratch.reserve(self.region.size());
        for chunk in raw[HEADER_LEN..].chunks_exact(wire_size) {
            self.scratch.push(C::from_wire(wire::read_unaligned(chunk)));
        }
        Ok(())
    }
}

impl<C, const D: usize, T> PatchProvider<C, D> for PatchLinkProvider<C, D, T>
where
    C: PatchWire + Clone + Send,
    T: Communicator,
{
    fn next_available_nano_step(&self) -> Option<u64> {
        self.calendar.next()
    }

    fn get(
        &mut self,
        grid: &mut Grid<C, D>,
        _valid_region: &Region<D>,
        _global_dimensions: Coord<D>,
        nano_step: u64,
        _wait: bool,
    ) -> Result<(), GridHaloError> {
        if !self.calendar.is_due(nano_step) {
            return Ok(());
        }
        let handle = self
            .comm
            .irecv(self.peer, self.tag.as_u16(), self.expected_len())
            .map_err(|_| GridHaloError::PatchRecvFailed {
                peer: self.peer,
                nano_step,
            })?;
        let raw = handle.wait().ok_or(GridHaloError::PatchRecvFailed {
            peer: self.peer,
            nano_step,
        })?;
        self.decode(&raw, nano_step)?;
        scatter_region(grid, &self.region, &self.scratch);
        self.calendar.advance(nano_step);
        Ok(())
    }
}
