//! LCD drivers.

pub mod st7920;
