pub mod optimize;
pub mod reliefs;
pub mod schedule;
pub mod tax;
