//! Transaction dispatch: live nonce lookup, gas quoting, signing and broadcast

pub mod gas;
mod nonce;
mod sender;

pub use sender::{SigningKey, TransactionDispatcher};
