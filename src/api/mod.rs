// ==========================================
// 服务排期引擎 - API 层
// ==========================================
// 职责: 提供会话级业务 API，供 UI / CLI 调用
// ==========================================

pub mod error;
pub mod schedule_api;
pub mod validator;

// 重导出核心类型
pub use error::{ApiError, ApiResult, ErrorBody};
pub use schedule_api::ScheduleApi;
pub use validator::SolveInputValidator;
