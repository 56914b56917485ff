//! endless runner terrain: chunk generation & difficulty scaling
//!
//! The core is plain Rust (`ChunkGenerator`, `ChunkStore`,
//! `DifficultyCurve`, `SpacingLedger`); `WorldGenerator` ties them together
//! as a Bevy resource driven once per frame by `WorldGenPlugin`.

pub mod camera;
pub mod chunk_gen;
pub mod chunk_store;
pub mod constants;
pub mod difficulty;
pub mod params;
pub mod rng;
pub mod spacing;
pub mod terrain;
pub mod world;

pub use difficulty::{DifficultyCurve, DifficultyInfo, DifficultyLevel, DifficultySettings};
pub use params::{PlayerUpgrades, TerrainParameters};
pub use terrain::{Chunk, TerrainType, Tile};
pub use world::{WorldGenPlugin, WorldGenSettings, WorldGenerator};
