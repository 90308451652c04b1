// ==========================================
// 服务排期引擎 - 天气数据与分析结果
// ==========================================
// ClimateProfile / DailyForecast: 外部天气数据源的原始数据
// WeatherAnalysis: 每个候选开工日重新计算，不持久化
// ==========================================

use crate::domain::types::{RiskLevel, WeatherSource};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// 历史气候 (常年值)
// ==========================================

/// 某地某月的恶劣天气天数常年值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyClimate {
    pub month: u32,
    pub rain_days: f64,
    pub extreme_temp_days: f64,
    pub high_wind_days: f64,
}

impl MonthlyClimate {
    /// 恶劣天气天数占比，截断到 [0, 1]
    pub fn adverse_ratio(&self) -> f64 {
        let days = days_in_month(self.month) as f64;
        let adverse = self.rain_days + self.extreme_temp_days + self.high_wind_days;
        (adverse / days).clamp(0.0, 1.0)
    }
}

/// 某地全年气候常年值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimateProfile {
    pub location: String,
    pub months: Vec<MonthlyClimate>,
}

impl ClimateProfile {
    pub fn month(&self, month: u32) -> Option<&MonthlyClimate> {
        self.months.iter().find(|m| m.month == month)
    }
}

/// 平年各月天数
pub fn days_in_month(month: u32) -> u32 {
    match month {
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

// ==========================================
// 天气预报
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub precipitation_probability: f64,
    pub wind_kph: f64,
    pub temp_max_c: f64,
    pub temp_min_c: f64,
}

impl DailyForecast {
    /// 单日风险分级
    pub fn classify(&self) -> RiskLevel {
        if self.precipitation_probability >= 0.6
            || self.wind_kph >= 40.0
            || self.temp_max_c >= 35.0
            || self.temp_min_c <= 0.0
        {
            RiskLevel::High
        } else if self.precipitation_probability >= 0.3
            || self.wind_kph >= 25.0
            || self.temp_min_c <= 5.0
        {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

// ==========================================
// WeatherAnalysis - 天气风险分析结果
// ==========================================

/// 开工月份的历史统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalRisk {
    pub month: u32,
    pub rain_days: f64,
    pub extreme_temp_days: f64,
    pub high_wind_days: f64,
    pub monthly_risk: f64,
    /// 月份 -> 风险等级
    pub seasonal_risk: BTreeMap<u32, RiskLevel>,
}

/// 预报窗口内的单日风险
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub risk: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAnalysis {
    pub location: String,
    pub start_date: NaiveDate,
    pub historical: Option<HistoricalRisk>,
    pub forecast_window: Vec<ForecastDay>,
    /// 服务ID -> 风险分值 [0, 1]
    pub per_service_risk: BTreeMap<String, f64>,
    pub overall_risk_score: f64,
    pub source: WeatherSource,
    /// 数据源部分或全部不可用
    pub degraded: bool,
    pub recommended_start_date: NaiveDate,
}

impl WeatherAnalysis {
    pub fn risk_for(&self, service_id: &str) -> f64 {
        self.per_service_risk.get(service_id).copied().unwrap_or(0.0)
    }

    /// 开工日是否落在预报窗口内
    pub fn start_in_forecast(&self) -> bool {
        self.forecast_window.iter().any(|d| d.date == self.start_date)
    }
}
