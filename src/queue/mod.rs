//! Command Queue Domain
//!
//! Packets are the unit of communication between the producer context and
//! the real-time context. They travel through a fixed-capacity SPSC ring and
//! share one 8-byte encoding whether in memory or persisted.

pub mod packet;
pub mod ring;
pub mod wire;

pub use packet::{Opcode, Packet, Waveform, PACKET_SIZE};
pub use ring::{channel, Consumer, Producer, SpscRing, Word, QUEUE_CAPACITY};
pub use wire::{decode_stream, encode_stream};
