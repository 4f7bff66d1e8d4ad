pub mod climate;
pub mod fan;
