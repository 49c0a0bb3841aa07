mod asset_index;

pub use asset_index::{AssetIndex, AssetManager, AssetObject, DEFAULT_ASSET_CHUNK};
