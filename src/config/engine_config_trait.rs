// ==========================================
// 服务排期引擎 - 引擎配置读取 Trait
// ==========================================
// 职责: 定义引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::config_manager::ConfigResult;
use async_trait::async_trait;
use chrono::Weekday;

// ==========================================
// EngineConfigReader Trait
// ==========================================
// 实现者: ConfigManager（JSON 配置文件）；测试中使用 MockConfigReader
#[async_trait]
pub trait EngineConfigReader: Send + Sync {
    // ===== 产能与日历 =====

    /// 每日可用工时
    ///
    /// # 默认值
    /// - 8.0
    async fn get_daily_capacity_hours(&self) -> ConfigResult<f64>;

    /// 不施工的星期
    ///
    /// # 默认值
    /// - 空（每天都可施工）
    async fn get_non_working_weekdays(&self) -> ConfigResult<Vec<Weekday>>;

    // ===== 天气数据源 =====

    /// 天气数据拉取超时（毫秒）
    ///
    /// # 默认值
    /// - 3000
    async fn get_weather_timeout_ms(&self) -> ConfigResult<u64>;

    /// 预报拉取天数
    ///
    /// # 默认值
    /// - 14
    async fn get_forecast_horizon_days(&self) -> ConfigResult<u32>;

    /// 近期预报风险窗口天数
    ///
    /// # 默认值
    /// - 7
    async fn get_forecast_window_days(&self) -> ConfigResult<u32>;

    // ===== 风险模型 =====

    /// 预报权重（其余为历史权重）
    ///
    /// # 默认值
    /// - 0.7
    async fn get_forecast_weight(&self) -> ConfigResult<f64>;

    /// 天气敏感系数
    ///
    /// # 默认值
    /// - 0.5
    async fn get_sensitivity_coefficient(&self) -> ConfigResult<f64>;

    /// 数据源不可用时的默认风险
    ///
    /// # 默认值
    /// - 0.3
    async fn get_default_risk(&self) -> ConfigResult<f64>;
}
