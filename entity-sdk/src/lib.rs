pub mod climate;
pub mod entity;
pub mod fan;
pub mod meta;
pub mod registry;
pub mod setup;
pub mod sub;
