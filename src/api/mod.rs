// ==========================================
// 参考成本引擎 - API 层
// ==========================================
// 职责: 为界面层提供业务接口，统一入参校验与错误转换
// ==========================================

pub mod error;
pub mod reference_api;

// 重导出
pub use error::{ApiError, ApiResult};
pub use reference_api::ReferenceApi;
