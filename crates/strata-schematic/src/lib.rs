//! Palette-compressed voxel structures.
//!
//! Captures named boxes of a voxel world into palette-compressed containers,
//! serializes them to a versioned tag document (plus a legacy fixed-layout
//! codec for interchange), and exposes the [`VoxelWorld`] seam placement
//! operates through.

pub mod codec;
pub mod container;
pub mod file;
pub mod legacy;
pub mod metadata;
pub mod packed;
pub mod palette;
pub mod region;
pub mod state;
pub mod structure;
pub mod world;

pub use codec::{CodecError, FORMAT_VERSION, read_structure, write_structure};
pub use container::{ContainerDataError, OutOfBounds, VoxelContainer};
pub use file::{EXTENSION, FileError, LEGACY_EXTENSION, load_structure, save_structure};
pub use legacy::{ImportFidelity, LegacyDocument, LegacyError, LegacyRegistry};
pub use metadata::StructureMetadata;
pub use packed::PackedBits;
pub use palette::Palette;
pub use region::{EntityRecord, ScheduledUpdate, SubRegion};
pub use state::{BlockState, NamedState, apply_state_transform};
pub use structure::{CaptureBox, CaptureError, Structure};
pub use world::{CHUNK_SIZE, ChunkPos, GridWorld, VoxelWorld, WorldTick};
