pub mod error;
pub mod token;
pub mod webhook;

pub use error::CryptoError;
