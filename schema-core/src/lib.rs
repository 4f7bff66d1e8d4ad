pub mod cap;
pub mod descriptor;
pub mod service;
pub mod spec;
pub mod transport;
