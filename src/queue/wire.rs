//! Packet stream format
//!
//! Persisted command streams are a small header followed by packets in the
//! same 8-byte layout used in memory:
//!
//! ```text
//! "PSGQ"  magic
//! u32 LE  packet count
//! count x 8-byte packets
//! ```

use super::packet::{Packet, PACKET_SIZE};
use crate::{PsgError, Result};
use nom::bytes::complete::{tag, take};
use nom::combinator::{all_consuming, map};
use nom::multi::count;
use nom::number::complete::{le_u16, le_u32, u8 as byte};
use nom::sequence::{terminated, tuple};
use nom::IResult;

/// Stream magic
pub const STREAM_MAGIC: &[u8; 4] = b"PSGQ";

/// Upper bound on packets in one stream (about 18 minutes of dense automation)
pub const MAX_STREAM_PACKETS: u32 = 1 << 20;

fn packet(input: &[u8]) -> IResult<&[u8], Packet> {
    map(
        terminated(tuple((le_u16, byte, byte, byte, byte)), take(2usize)),
        |(tick, op, reg, val, arg)| Packet::new(tick, op, reg, val, arg),
    )(input)
}

fn header(input: &[u8]) -> IResult<&[u8], u32> {
    let (input, _) = tag(STREAM_MAGIC.as_slice())(input)?;
    le_u32(input)
}

/// Decode a persisted packet stream
pub fn decode_stream(data: &[u8]) -> Result<Vec<Packet>> {
    let (body, packet_count) = header(data)
        .map_err(|_| PsgError::Wire("missing or invalid PSGQ header".into()))?;

    if packet_count > MAX_STREAM_PACKETS {
        return Err(PsgError::Wire(format!(
            "packet count {packet_count} exceeds limit of {MAX_STREAM_PACKETS}"
        )));
    }

    let expected = packet_count as usize * PACKET_SIZE;
    if body.len() != expected {
        return Err(PsgError::Wire(format!(
            "stream declares {packet_count} packets ({expected} bytes) but carries {} bytes",
            body.len()
        )));
    }

    let (_, packets) = all_consuming(count(packet, packet_count as usize))(body)
        .map_err(|e| PsgError::Wire(format!("malformed packet data: {e:?}")))?;
    Ok(packets)
}

/// Encode packets into a persisted stream
pub fn encode_stream(packets: &[Packet]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + packets.len() * PACKET_SIZE);
    out.extend_from_slice(STREAM_MAGIC);
    out.extend_from_slice(&(packets.len() as u32).to_le_bytes());
    for p in packets {
        out.extend_from_slice(&p.to_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Waveform;

    #[test]
    fn test_stream_decode() {
        let packets = vec![
            Packet::register_write(0, 7, 0x3E),
            Packet::timbre(10, 1, Waveform::Triangle),
            Packet::new(20, 0x7F, 1, 2, 3),
        ];
        let data = encode_stream(&packets);
        assert_eq!(data.len(), 8 + 3 * PACKET_SIZE);
        assert_eq!(&data[..4], b"PSGQ");
        assert_eq!(decode_stream(&data).unwrap(), packets);
    }

    #[test]
    fn test_empty_stream() {
        assert!(decode_stream(&encode_stream(&[])).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_magic() {
        let mut data = encode_stream(&[Packet::default()]);
        data[0] = b'X';
        let err = decode_stream(&data).unwrap_err();
        assert!(err.to_string().contains("header"));
    }

    #[test]
    fn test_truncated_stream() {
        let mut data = encode_stream(&[Packet::default(), Packet::default()]);
        data.truncate(data.len() - 3);
        assert!(matches!(decode_stream(&data), Err(PsgError::Wire(_))));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut data = encode_stream(&[Packet::default()]);
        data.push(0);
        assert!(decode_stream(&data).is_err());
    }

    #[test]
    fn test_excessive_count() {
        let mut data = Vec::new();
        data.extend_from_slice(b"PSGQ");
        data.extend_from_slice(&u32::MAX.to_le_bytes());
        let err = decode_stream(&data).unwrap_err();
        assert!(err.to_string().contains("exceeds limit"));
    }
}
