//! Engine plumbing shared by compression and decompression
//!
//! Both engines copy a chunk into foreign memory and then call the codec's step
//! function repeatedly against the unconsumed suffix, collecting whatever lands
//! in the scratch buffer. [`drive_steps`] is that loop; [`StreamEngine`] is the
//! interface the stream pipeline drives.

use bytes::Bytes;
use ferrozst_codec::{CodecEngine, ForeignBuffer, Region, StepResult};
use ferrozst_types::{Destroy, Error, Result, StreamKind};
use tracing::{trace, warn};

/// A chunk-at-a-time codec engine usable by the stream pipeline
pub trait StreamEngine: Destroy + Send {
    /// Which direction this engine runs in
    fn kind(&self) -> StreamKind;

    /// Run one upstream chunk through the engine
    fn process_chunk(&mut self, chunk: &[u8]) -> Result<Bytes>;

    /// Produce any trailing output once upstream has ended
    fn finish(&mut self) -> Result<Bytes>;
}

/// Allocate the scratch buffer an engine writes step output into
pub(crate) fn allocate_scratch(
    codec: &std::sync::Arc<dyn CodecEngine>,
    size: usize,
    kind: StreamKind,
) -> Result<ForeignBuffer> {
    if size == 0 {
        return Err(Error::allocation(format!(
            "engine recommended a zero-sized {} buffer",
            kind
        )));
    }
    let scratch = ForeignBuffer::allocate(codec, size)?;
    trace!("{} scratch buffer: {} bytes", kind, size);
    Ok(scratch)
}

/// Step through `input` until it is consumed and the scratch buffer drains
///
/// `step` receives the scratch region and the unconsumed input region and
/// returns the packed result. Output produced by successive steps is
/// concatenated in generation order. A step that makes no progress while
/// input remains fails with [`Error::Stall`]; a negative result fails with
/// [`Error::Codec`] carrying the engine's name for the code.
pub(crate) fn drive_steps<F>(
    codec: &dyn CodecEngine,
    input: &ForeignBuffer,
    scratch: &ForeignBuffer,
    mut step: F,
) -> Result<Bytes>
where
    F: FnMut(Region<'_>, Region<'_>) -> i64,
{
    let total = input.len();
    let capacity = scratch.len();
    let mut offset = 0usize;
    let mut chunks: Vec<Vec<u8>> = Vec::new();

    loop {
        let remaining = total - offset;
        let raw = step(scratch.full(), input.region(offset, remaining));
        let result = StepResult::decode(raw).map_err(|code| {
            let name = codec.error_name(code);
            warn!("codec step failed with code {}: {}", code, name);
            Error::codec(code, name)
        })?;

        if result.is_stalled() && remaining > 0 {
            warn!("codec stalled at offset {} of {}", offset, total);
            return Err(Error::stall(offset, remaining));
        }

        let consumed = result.consumed as usize;
        let produced = result.produced as usize;
        if consumed > remaining || produced > capacity {
            return Err(Error::other(format!(
                "codec step reported {} consumed / {} produced against {} remaining / {} capacity",
                consumed, produced, remaining, capacity
            )));
        }

        if produced > 0 {
            chunks.push(scratch.read(produced)?);
        }
        offset += consumed;

        // A full scratch buffer may mean more output is pending inside the
        // context even after the input is used up.
        if offset == total && produced < capacity {
            break;
        }
    }

    Ok(match chunks.len() {
        0 => Bytes::new(),
        1 => Bytes::from(chunks.remove(0)),
        _ => Bytes::from(chunks.concat()),
    })
}
