pub mod food;
pub mod job;
pub mod result;
