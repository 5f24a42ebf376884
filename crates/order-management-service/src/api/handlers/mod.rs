//! HTTP 处理器

pub mod order;
pub mod payment;
pub mod points;
pub mod system;
