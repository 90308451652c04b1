// ==========================================
// 服务排期引擎 - 引擎配置快照
// ==========================================
// 一次性从 EngineConfigReader 读取，求解期间不再访问配置源
// ==========================================

use crate::config::config_manager::ConfigResult;
use crate::config::engine_config_trait::EngineConfigReader;
use crate::domain::schedule::WorkCalendar;
use crate::engine::weather_risk::WeatherRiskSettings;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub daily_capacity_hours: f64,
    pub non_working_weekdays: Vec<Weekday>,
    pub weather_timeout_ms: u64,
    pub forecast_horizon_days: u32,
    pub forecast_window_days: u32,
    pub forecast_weight: f64,
    pub sensitivity_coefficient: f64,
    pub default_risk: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
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
}

impl EngineConfig {
    /// 从配置读取器加载并校验
    pub async fn load<R>(reader: &R) -> ConfigResult<Self>
    where
        R: EngineConfigReader + ?Sized,
    {
        let config = Self {
            daily_capacity_hours: reader.get_daily_capacity_hours().await?,
            non_working_weekdays: reader.get_non_working_weekdays().await?,
            weather_timeout_ms: reader.get_weather_timeout_ms().await?,
            forecast_horizon_days: reader.get_forecast_horizon_days().await?,
            forecast_window_days: reader.get_forecast_window_days().await?,
            forecast_weight: reader.get_forecast_weight().await?,
            sensitivity_coefficient: reader.get_sensitivity_coefficient().await?,
            default_risk: reader.get_default_risk().await?,
        };
        config.validate()?;
        Ok(config)
    }

    /// 取值范围校验
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.daily_capacity_hours > 0.0 && self.daily_capacity_hours <= 24.0) {
            return Err(format!("日产能必须在 (0, 24] 之间: {}", self.daily_capacity_hours).into());
        }
        if self.forecast_window_days == 0 || self.forecast_window_days > self.forecast_horizon_days {
            return Err(format!(
                "预报窗口天数非法: window={}, horizon={}",
                self.forecast_window_days, self.forecast_horizon_days
            )
            .into());
        }
        for (name, value) in [
            ("forecast_weight", self.forecast_weight),
            ("default_risk", self.default_risk),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} 必须在 [0, 1] 之间: {}", name, value).into());
            }
        }
        if !(self.sensitivity_coefficient >= 0.0 && self.sensitivity_coefficient.is_finite()) {
            return Err(format!("敏感系数非法: {}", self.sensitivity_coefficient).into());
        }
        Ok(())
    }

    pub fn weather_settings(&self) -> WeatherRiskSettings {
        WeatherRiskSettings {
            forecast_horizon_days: self.forecast_horizon_days,
            forecast_window_days: self.forecast_window_days,
            forecast_weight: self.forecast_weight,
            sensitivity_coefficient: self.sensitivity_coefficient,
            default_risk: self.default_risk,
            fetch_timeout: Duration::from_millis(self.weather_timeout_ms),
        }
    }

    pub fn calendar(&self) -> WorkCalendar {
        WorkCalendar {
            non_working_weekdays: self.non_working_weekdays.clone(),
        }
    }
}
