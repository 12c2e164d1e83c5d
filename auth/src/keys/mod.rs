pub mod errors;
pub mod loader;

pub use errors::KeyError;
pub use loader::FileKeyLoader;
pub use loader::KeyLoader;
pub use loader::KeyMaterial;
