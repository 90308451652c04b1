// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use chrono::Weekday;
use service_schedule::config::{ConfigResult, EngineConfigReader};

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub daily_capacity_hours: f64,
    pub non_working_weekdays: Vec<Weekday>,
    pub weather_timeout_ms: u64,
    pub forecast_horizon_days: u32,
    pub forecast_window_days: u32,
    pub forecast_weight: f64,
    pub sensitivity_coefficient: f64,
    pub default_risk: f64,
}

impl MockConfig {
    /// 创建默认配置
    pub fn default() -> Self {
        Self {
            daily_capacity_hours: 8.0,
            non_working_weekdays: Vec::new(),
            weather_timeout_ms: 3000,
            forecast_horizon_days: 14,
            forecast_window_days: 7,
            forecast_weight: 0.7,
            sensitivity_coefficient: 0.5,
            default_risk: 0.3,
        }
    }

    /// 天气拉取超时很短的配置
    pub fn with_timeout_ms(timeout_ms: u64) -> Self {
        let mut config = Self::default();
        config.weather_timeout_ms = timeout_ms;
        config
    }

    /// 周末不施工
    pub fn weekdays_only() -> Self {
        let mut config = Self::default();
        config.non_working_weekdays = vec![Weekday::Sat, Weekday::Sun];
        config
    }
}

/// Mock 配置读取器
pub struct MockConfigReader {
    config: MockConfig,
}

impl MockConfigReader {
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EngineConfigReader for MockConfigReader {
    async fn get_daily_capacity_hours(&self) -> ConfigResult<f64> {
        Ok(self.config.daily_capacity_hours)
    }

    async fn get_non_working_weekdays(&self) -> ConfigResult<Vec<Weekday>> {
        Ok(self.config.non_working_weekdays.clone())
    }

    async fn get_weather_timeout_ms(&self) -> ConfigResult<u64> {
        Ok(self.config.weather_timeout_ms)
    }

    async fn get_forecast_horizon_days(&self) -> ConfigResult<u32> {
        Ok(self.config.forecast_horizon_days)
    }

    async fn get_forecast_window_days(&self) -> ConfigResult<u32> {
        Ok(self.config.forecast_window_days)
    }

    async fn get_forecast_weight(&self) -> ConfigResult<f64> {
        Ok(self.config.forecast_weight)
    }

    async fn get_sensitivity_coefficient(&self) -> ConfigResult<f64> {
        Ok(self.config.sensitivity_coefficient)
    }

    async fn get_default_risk(&self) -> ConfigResult<f64> {
        Ok(self.config.default_risk)
    }
}
