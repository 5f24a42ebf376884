//! 后台任务

pub mod expire_worker;

pub use expire_worker::ExpireWorker;
