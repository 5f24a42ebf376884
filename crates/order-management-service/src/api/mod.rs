//! HTTP 接口层
//!
//! 仅负责请求解析、参数校验与响应封装，业务规则全部在服务层实现

pub mod error;
pub mod handlers;
pub mod request;
pub mod response;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use response::ApiResponse;
pub use routes::{api_routes, internal_routes};
pub use state::AppState;
