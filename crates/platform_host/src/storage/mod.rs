//! Storage contracts: the small synchronous key-value store, the large asynchronous envelope
//! store, and their shared error type.

pub mod app_state;
pub mod error;
pub mod key_value;
