//! cmdlink wire protocol - constants, sentinels and chunk framing
//!
//! Shared by the device side (`cmdlink-mcu`) and the peer side
//! (`cmdlink-ble-controller`).

pub mod ble;
pub mod chunk;
pub mod reader;
pub mod text;

pub use chunk::{ChunkQueue, EmptyQueue, MAX_CHUNK_COUNT, MAX_CHUNK_SIZE, MAX_RESPONSE_SIZE};
pub use reader::{ReadProgress, ResponseReader};
