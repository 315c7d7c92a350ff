// Core modules: buffer geometry, storage, primitive decoders, pooling, and errors.
pub mod error;
pub mod format;
pub mod pool;
pub mod raw;
pub mod writer;
