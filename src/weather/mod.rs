// ==========================================
// 服务排期引擎 - 天气数据源
// ==========================================
// 职责: 定义外部天气数据源接口（依赖倒置，引擎只依赖 trait）
// 实现: ClimateTableProvider（离线气候常年值，无预报）、UnavailableProvider
// ==========================================

pub mod climate_table;

pub use climate_table::{ClimateTable, ClimateTableProvider};

use crate::domain::weather::{ClimateProfile, DailyForecast};
use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

// ==========================================
// WeatherError - 天气数据源错误
// ==========================================
// 除 UnknownLocation 外均视为 "数据降级"，不阻断求解
#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("无法识别的地点: {0}")]
    UnknownLocation(String),

    #[error("天气数据源不可用: {0}")]
    Unavailable(String),

    #[error("天气数据获取超时: {0}ms")]
    Timeout(u64),

    #[error("天气数据格式错误: {0}")]
    InvalidData(String),

    #[error("气候数据 CSV 解析失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("气候数据文件读取失败: {0}")]
    Io(#[from] std::io::Error),
}

impl WeatherError {
    /// 是否属于输入校验错误（其余均按降级处理）
    pub fn is_validation_error(&self) -> bool {
        matches!(self, WeatherError::UnknownLocation(_))
    }
}

// ==========================================
// WeatherProvider Trait
// ==========================================
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// 获取地点的月度气候常年值
    async fn climate_normals(&self, location: &str) -> Result<ClimateProfile, WeatherError>;

    /// 获取从 `from` 开始最多 `days` 天的逐日预报
    async fn forecast(
        &self,
        location: &str,
        from: NaiveDate,
        days: u32,
    ) -> Result<Vec<DailyForecast>, WeatherError>;
}

/// 规范化地点键（去空白、小写）
pub fn normalize_location(location: &str) -> String {
    location.trim().to_lowercase()
}

// ==========================================
// UnavailableProvider - 无数据源
// ==========================================
/// 未配置任何天气数据时使用：所有请求都报告不可用，求解按默认风险降级
#[derive(Debug, Clone, Default)]
pub struct UnavailableProvider;

#[async_trait]
impl WeatherProvider for UnavailableProvider {
    async fn climate_normals(&self, _location: &str) -> Result<ClimateProfile, WeatherError> {
        Err(WeatherError::Unavailable("未配置气候数据".to_string()))
    }

    async fn forecast(
        &self,
        _location: &str,
        _from: NaiveDate,
        _days: u32,
    ) -> Result<Vec<DailyForecast>, WeatherError> {
        Err(WeatherError::Unavailable("未配置预报数据".to_string()))
    }
}
