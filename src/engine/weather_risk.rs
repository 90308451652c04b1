// ==========================================
// 服务排期引擎 - 天气风险模型
// ==========================================
// 输入: 地点 + 天气敏感服务 + 候选开工日
// 输出: WeatherAnalysis (历史统计 / 预报分级 / 逐服务风险 / 推荐开工日)
// 红线: 数据源不可用或超时时降级为固定默认风险，永不阻断求解
// ==========================================

use crate::domain::duration::round_hours;
use crate::domain::types::{RiskLevel, WeatherSource};
use crate::domain::weather::{
    ClimateProfile, DailyForecast, ForecastDay, HistoricalRisk, WeatherAnalysis,
};
use crate::weather::{WeatherError, WeatherProvider};
use chrono::{Datelike, Days, NaiveDate};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

// ==========================================
// WeatherRiskSettings - 风险模型参数
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRiskSettings {
    /// 预报拉取天数
    pub forecast_horizon_days: u32,
    /// 计算 "近期预报风险" 的窗口天数
    pub forecast_window_days: u32,
    /// 开工日落在预报范围内时预报的权重
    pub forecast_weight: f64,
    /// 敏感系数 (buffer = base × risk × coefficient)
    pub sensitivity_coefficient: f64,
    /// 数据源不可用时的固定默认风险
    pub default_risk: f64,
    /// 单次拉取超时
    pub fetch_timeout: Duration,
}

impl Default for WeatherRiskSettings {
    fn default() -> Self {
        Self {
            forecast_horizon_days: 14,
            forecast_window_days: 7,
            forecast_weight: 0.7,
            sensitivity_coefficient: 0.5,
            default_risk: 0.3,
            fetch_timeout: Duration::from_millis(3000),
        }
    }
}

// ==========================================
// WeatherRiskModel - 天气风险模型
// ==========================================
pub struct WeatherRiskModel {
    provider: Arc<dyn WeatherProvider>,
    settings: WeatherRiskSettings,
}

impl WeatherRiskModel {
    pub fn new(provider: Arc<dyn WeatherProvider>, settings: WeatherRiskSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &WeatherRiskSettings {
        &self.settings
    }

    /// 分析天气风险（每次求解只访问一次数据源）
    ///
    /// # 返回
    /// - Ok(analysis): 含降级标记
    /// - Err(UnknownLocation): 地点无法识别（输入校验错误）
    pub async fn analyze(
        &self,
        location: &str,
        sensitive_services: &[String],
        start_date: NaiveDate,
    ) -> Result<WeatherAnalysis, WeatherError> {
        let (climate, forecast) = self.fetch(location, start_date).await;
        self.compose(location, sensitive_services, start_date, climate, forecast)
    }

    /// 历史常年值与预报并发拉取，共用一个超时
    async fn fetch(
        &self,
        location: &str,
        start_date: NaiveDate,
    ) -> (
        Result<ClimateProfile, WeatherError>,
        Result<Vec<DailyForecast>, WeatherError>,
    ) {
        let fetch_both = async {
            futures::join!(
                self.provider.climate_normals(location),
                self.provider
                    .forecast(location, start_date, self.settings.forecast_horizon_days)
            )
        };

        match tokio::time::timeout(self.settings.fetch_timeout, fetch_both).await {
            Ok(results) => results,
            Err(_) => {
                let ms = self.settings.fetch_timeout.as_millis() as u64;
                warn!(location, timeout_ms = ms, "天气数据获取超时，降级为默认风险");
                (Err(WeatherError::Timeout(ms)), Err(WeatherError::Timeout(ms)))
            }
        }
    }

    /// 由拉取结果组装分析（纯函数，便于单测）
    pub fn compose(
        &self,
        location: &str,
        sensitive_services: &[String],
        start_date: NaiveDate,
        climate: Result<ClimateProfile, WeatherError>,
        forecast: Result<Vec<DailyForecast>, WeatherError>,
    ) -> Result<WeatherAnalysis, WeatherError> {
        // 地点无法识别属于输入错误，直接上抛
        if let Err(WeatherError::UnknownLocation(loc)) = &climate {
            return Err(WeatherError::UnknownLocation(loc.clone()));
        }
        if let Err(WeatherError::UnknownLocation(loc)) = &forecast {
            return Err(WeatherError::UnknownLocation(loc.clone()));
        }

        let climate_failed = climate.is_err();
        let forecast_failed = forecast.is_err();
        if let Err(e) = &climate {
            warn!(location, error = %e, "历史气候数据不可用");
        }
        if let Err(e) = &forecast {
            warn!(location, error = %e, "天气预报不可用");
        }

        let historical = climate
            .ok()
            .and_then(|profile| Self::historical_risk(&profile, start_date.month()));
        let forecast_window = forecast
            .map(|days| self.classify_window(days, start_date))
            .unwrap_or_default();
        let forecast_risk = self.near_term_risk(&forecast_window, start_date);

        let weight = self.settings.forecast_weight.clamp(0.0, 1.0);
        let (risk, source) = match (&historical, forecast_risk) {
            (Some(h), Some(f)) => (weight * f + (1.0 - weight) * h.monthly_risk, WeatherSource::Live),
            (Some(h), None) => (h.monthly_risk, WeatherSource::HistoricalOnly),
            (None, Some(f)) => (f, WeatherSource::ForecastOnly),
            (None, None) => (self.settings.default_risk, WeatherSource::Default),
        };
        let risk = round_risk(risk.clamp(0.0, 1.0));

        // 开工日超出预报范围而回退到纯历史风险不算降级
        let degraded = climate_failed
            || historical.is_none()
            || forecast_failed
            || source == WeatherSource::Default;

        let per_service_risk: BTreeMap<String, f64> = sensitive_services
            .iter()
            .map(|id| (id.clone(), risk))
            .collect();

        let recommended_start_date = recommend_start_date(&forecast_window, start_date);

        info!(
            location,
            start_date = %start_date,
            overall_risk = risk,
            source = %source,
            degraded,
            sensitive_count = sensitive_services.len(),
            "天气风险分析完成"
        );

        Ok(WeatherAnalysis {
            location: location.trim().to_string(),
            start_date,
            historical,
            forecast_window,
            per_service_risk,
            overall_risk_score: risk,
            source,
            degraded,
            recommended_start_date,
        })
    }

    /// 天气缓冲工时；非敏感服务恒为 0
    pub fn buffer_hours(&self, analysis: &WeatherAnalysis, service_id: &str, base_hours: f64) -> f64 {
        match analysis.per_service_risk.get(service_id) {
            Some(risk) => round_hours(base_hours * risk * self.settings.sensitivity_coefficient),
            None => 0.0,
        }
    }

    // ==========================================
    // 内部计算
    // ==========================================

    fn historical_risk(profile: &ClimateProfile, month: u32) -> Option<HistoricalRisk> {
        let current = profile.month(month)?;
        let seasonal_risk = profile
            .months
            .iter()
            .map(|m| (m.month, RiskLevel::from_ratio(m.adverse_ratio())))
            .collect();
        Some(HistoricalRisk {
            month,
            rain_days: current.rain_days,
            extreme_temp_days: current.extreme_temp_days,
            high_wind_days: current.high_wind_days,
            monthly_risk: round_risk(current.adverse_ratio()),
            seasonal_risk,
        })
    }

    /// 预报逐日分级（仅保留开工日起、预报范围内的日期）
    fn classify_window(&self, mut days: Vec<DailyForecast>, start_date: NaiveDate) -> Vec<ForecastDay> {
        let horizon_end = days_after(start_date, self.settings.forecast_horizon_days);
        days.sort_by_key(|d| d.date);
        days.dedup_by_key(|d| d.date);
        days.iter()
            .filter(|d| d.date >= start_date && d.date < horizon_end)
            .map(|d| ForecastDay {
                date: d.date,
                risk: d.classify(),
            })
            .collect()
    }

    /// 近期预报风险: 开工日起 forecast_window_days 天内的平均分值
    ///
    /// 开工日不在预报范围内时返回 None
    fn near_term_risk(&self, window: &[ForecastDay], start_date: NaiveDate) -> Option<f64> {
        if !window.iter().any(|d| d.date == start_date) {
            return None;
        }
        let window_end = days_after(start_date, self.settings.forecast_window_days.max(1));
        let scores: Vec<f64> = window
            .iter()
            .filter(|d| d.date < window_end)
            .map(|d| d.risk.score())
            .collect();
        if scores.is_empty() {
            return None;
        }
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

// 日期上限处截断
fn days_after(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}

/// 推荐开工日
///
/// 规则:
/// 1. 候选日及之后预报窗口内首个低风险日
/// 2. 无低风险日时取风险最低的一天（同分取最早）
/// 3. 无预报时返回候选日本身
pub fn recommend_start_date(window: &[ForecastDay], candidate: NaiveDate) -> NaiveDate {
    let mut eligible: Vec<&ForecastDay> = window.iter().filter(|d| d.date >= candidate).collect();
    eligible.sort_by_key(|d| d.date);

    if let Some(day) = eligible.iter().find(|d| d.risk == RiskLevel::Low) {
        return day.date;
    }
    eligible
        .iter()
        .min_by_key(|d| (d.risk, d.date))
        .map(|d| d.date)
        .unwrap_or(candidate)
}

fn round_risk(risk: f64) -> f64 {
    (risk * 10_000.0).round() / 10_000.0
}
