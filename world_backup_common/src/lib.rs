pub mod record;
pub mod codec;
pub mod sector;

pub use record::{Coordinates, ObjectRecord};
pub use codec::{decode, decode_bytes, encode, CodecError};
pub use sector::{scan_range, Sector, SectorGrid, WorldTooLarge, MAX_WORLD_SIZE, SECTOR_SIZE};
