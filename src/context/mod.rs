pub mod device;
pub mod source;
pub mod store;
