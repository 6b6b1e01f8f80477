pub mod hash;
pub mod manifest;
pub mod nonce;

pub use hash::{HashAlgorithm, HashGenerator};
pub use manifest::HashManifest;
pub use nonce::NonceGenerator;
