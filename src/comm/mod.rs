//! Communication: the transport trait, in-process backends, and wire formats.

pub mod communicator;
pub mod wire;

pub use communicator::{
    CommError, CommTag, Communicator, NoComm, PollWait, ThreadComm, Wait, BOUNDING_BOX_TAG,
    PATCH_LINK_TAG,
};

use crate::geometry::coord::CoordBox;
use crate::sim_error::GridHaloError;
use wire::WireCoordBox;

/// All-gather every rank's bounding box over point-to-point sends: receives
/// are posted first, then sends, then everything is drained. Rank order in
/// the result matches rank numbering.
pub fn all_gather_bounding_boxes<T: Communicator, const D: usize>(
    comm: &T,
    own: CoordBox<D>,
) -> Result<Vec<CoordBox<D>>, GridHaloError> {
    let size = comm.size();
    let rank = comm.rank();
    let wire = WireCoordBox::encode(&own);
    let bytes = bytemuck::bytes_of(&wire);
    let msg_len = bytes.len();

    let mut recvs = Vec::with_capacity(size.saturating_sub(1));
    for peer in (0..size).filter(|&p| p != rank) {
        let handle = comm
            .irecv(peer, BOUNDING_BOX_TAG.as_u16(), msg_len)
            .map_err(|source| GridHaloError::BoundingBoxExchange { peer, source })?;
        recvs.push((peer, handle));
    }
    let mut sends = Vec::with_capacity(size.saturating_sub(1));
    for peer in (0..size).filter(|&p| p != rank) {
        let handle = comm
            .isend(peer, BOUNDING_BOX_TAG.as_u16(), bytes)
            .map_err(|source| GridHaloError::BoundingBoxExchange { peer, source })?;
        sends.push(handle);
    }

    let mut boxes = vec![CoordBox::default(); size];
    boxes[rank] = own;
    for (peer, handle) in recvs {
        let raw = handle
            .wait()
            .ok_or_else(|| GridHaloError::BoundingBoxExchange {
                peer,
                source: CommError::RecvFailed {
                    peer,
                    reason: "no data received".into(),
                },
            })?;
        if raw.len() != msg_len {
            return Err(GridHaloError::BoundingBoxExchange {
                peer,
                source: CommError::RecvFailed {
                    peer,
                    reason: format!("short receive: {} of {msg_len} bytes", raw.len()),
                },
            });
        }
        let wire: WireCoordBox<D> = wire::read_unaligned(&raw);
        boxes[peer] = wire.decode();
    }
    for send in sends {
        let _ = send.wait();
    }
    Ok(boxes)
}
