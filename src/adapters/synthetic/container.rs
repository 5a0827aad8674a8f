//! Length-prefixed sample container written by the synthetic encoder
//!
//! Layout: the 4-byte magic `CPXS`, a version byte, then one record per sample:
//! track (u8), pts (f64 LE), duration (f64 LE), keyframe (u8), payload length
//! (u32 LE), payload.

use std::io;
use std::path::Path;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::domain::model::{Sample, TimeSpec, TrackKind};

pub const MAGIC: &[u8; 4] = b"CPXS";
pub const VERSION: u8 = 1;

const RECORD_HEADER_LEN: usize = 1 + 8 + 8 + 1 + 4;

pub fn header() -> Bytes {
    let mut buf = BytesMut::with_capacity(MAGIC.len() + 1);
    buf.put_slice(MAGIC);
    buf.put_u8(VERSION);
    buf.freeze()
}

/// Append one encoded record to `buf`
pub fn encode_record(buf: &mut BytesMut, sample: &Sample) {
    buf.reserve(RECORD_HEADER_LEN + sample.data.len());
    buf.put_u8(match sample.track {
        TrackKind::Video => 0,
        TrackKind::Audio => 1,
    });
    buf.put_f64_le(sample.pts.as_seconds());
    buf.put_f64_le(sample.duration.as_seconds());
    buf.put_u8(u8::from(sample.keyframe));
    buf.put_u32_le(sample.data.len() as u32);
    buf.put_slice(&sample.data);
}

fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

/// Parse a whole container
pub fn decode(mut buf: impl Buf) -> io::Result<Vec<Sample>> {
    if buf.remaining() < MAGIC.len() + 1 {
        return Err(invalid("missing container header"));
    }
    let mut magic = [0u8; 4];
    buf.copy_to_slice(&mut magic);
    if &magic != MAGIC {
        return Err(invalid("missing container magic"));
    }
    if buf.get_u8() != VERSION {
        return Err(invalid("unsupported container version"));
    }

    let mut samples = Vec::new();
    while buf.has_remaining() {
        if buf.remaining() < RECORD_HEADER_LEN {
            return Err(invalid("truncated record header"));
        }
        let track = match buf.get_u8() {
            0 => TrackKind::Video,
            1 => TrackKind::Audio,
            _ => return Err(invalid("unknown track id")),
        };
        let pts = buf.get_f64_le();
        let duration = buf.get_f64_le();
        let keyframe = buf.get_u8() != 0;
        let len = buf.get_u32_le() as usize;

        if buf.remaining() < len {
            return Err(invalid("truncated record payload"));
        }
        samples.push(Sample {
            track,
            pts: TimeSpec::from_seconds(pts),
            duration: TimeSpec::from_seconds(duration),
            keyframe,
            data: buf.copy_to_bytes(len).to_vec(),
        });
    }
    Ok(samples)
}

/// Read and parse a container file
pub async fn read_samples(path: impl AsRef<Path>) -> io::Result<Vec<Sample>> {
    let bytes = Bytes::from(tokio::fs::read(path).await?);
    decode(bytes)
}
