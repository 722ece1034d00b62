//! Conversation stores for Incant.
//!
//! Only process-local storage is provided; history does not survive a
//! restart.

pub mod buffer;

pub use buffer::BufferMemory;
