// ==========================================
// 服务排期引擎 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，把引擎错误转换为结构化结果
// 分类: 输入校验错误（阻断求解）/ 目录缺陷（加载时致命）
// 说明: 数据降级（天气不可用、测量缺失可兜底）不是错误，见 Timeline.warnings
// ==========================================

use crate::catalog::CatalogError;
use crate::engine::critical_path::ScheduleError;
use crate::engine::dependency::ValidationIssue;
use crate::engine::orchestrator::SolveError;
use crate::engine::override_ctl::OverrideError;
use crate::weather::WeatherError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API层错误类型
/// 所有校验错误都携带可供 UI 渲染的字段级信息
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入校验错误
    // ==========================================
    #[error("服务选择无效: {}", summarize(.issues))]
    InvalidSelection { issues: Vec<ValidationIssue> },

    #[error("无效输入: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("以下服务缺少必需的测量值: {service_ids:?}")]
    MeasurementRequired { service_ids: Vec<String> },

    #[error("无法识别的地点: {0}")]
    UnknownLocation(String),

    #[error("覆写无效: {0}")]
    InvalidOverride(String),

    #[error("排期中不存在该服务: {0}")]
    UnknownService(String),

    // ==========================================
    // 目录 / 配置
    // ==========================================
    #[error("服务目录缺陷: {0}")]
    Catalog(#[from] CatalogError),

    #[error("配置错误: {0}")]
    Config(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 错误码（UI / CLI 使用）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidSelection { .. } => "INVALID_SELECTION",
            ApiError::InvalidInput { .. } => "INVALID_INPUT",
            ApiError::MeasurementRequired { .. } => "MEASUREMENT_REQUIRED",
            ApiError::UnknownLocation(_) => "UNKNOWN_LOCATION",
            ApiError::InvalidOverride(_) => "INVALID_OVERRIDE",
            ApiError::UnknownService(_) => "UNKNOWN_SERVICE",
            ApiError::Catalog(_) => "CATALOG_DEFECT",
            ApiError::Config(_) => "CONFIG_ERROR",
            ApiError::InternalError(_) | ApiError::Other(_) => "INTERNAL_ERROR",
        }
    }

    pub fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        ApiError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// 结构化错误体
    pub fn to_body(&self) -> ErrorBody {
        let issues = match self {
            ApiError::InvalidSelection { issues } => issues.clone(),
            _ => Vec::new(),
        };
        ErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
            issues,
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

/// 序列化后的错误（CLI 输出 / UI 渲染）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ValidationIssue>,
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

// ==========================================
// 从引擎错误转换
// ==========================================
impl From<OverrideError> for ApiError {
    fn from(err: OverrideError) -> Self {
        match err {
            OverrideError::UnknownService(id) => ApiError::UnknownService(id),
            OverrideError::Schedule(e) => e.into(),
            other => ApiError::InvalidOverride(other.to_string()),
        }
    }
}

impl From<ScheduleError> for ApiError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::InvalidCapacity(hours) => {
                ApiError::invalid_input("dailyCapacityHours", format!("必须在 (0, 24] 之间: {}", hours))
            }
            ScheduleError::DurationOutOfRange {
                service_id,
                hours,
                max_days,
            } => ApiError::invalid_input(
                &format!("durations.{}", service_id),
                format!("工期 {}h 超出上限 {} 个工作日", hours, max_days),
            ),
            ScheduleError::DateOutOfRange(offset) => ApiError::invalid_input(
                "startDate",
                format!("第 {} 个工作日超出可表示的日期范围", offset),
            ),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<WeatherError> for ApiError {
    fn from(err: WeatherError) -> Self {
        match err {
            WeatherError::UnknownLocation(loc) => ApiError::UnknownLocation(loc),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<SolveError> for ApiError {
    fn from(err: SolveError) -> Self {
        match err {
            SolveError::InvalidSelection(issues) => ApiError::InvalidSelection { issues },
            SolveError::MeasurementRequired(service_ids) => {
                ApiError::MeasurementRequired { service_ids }
            }
            SolveError::Weather(e) => e.into(),
            SolveError::Override(e) => e.into(),
            SolveError::Schedule(e) => e.into(),
        }
    }
}
