// ==========================================
// Mock 天气数据源 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use service_schedule::domain::weather::{ClimateProfile, DailyForecast, MonthlyClimate};
use service_schedule::weather::{WeatherError, WeatherProvider};
use std::sync::atomic::{AtomicUsize, Ordering};

/// 单日天气
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DayKind {
    Clear,
    Showers,
    Storm,
}

impl DayKind {
    fn forecast(self, date: NaiveDate) -> DailyForecast {
        let (prob, wind) = match self {
            DayKind::Clear => (0.05, 8.0),
            DayKind::Showers => (0.4, 12.0),
            DayKind::Storm => (0.9, 55.0),
        };
        DailyForecast {
            date,
            precipitation_probability: prob,
            wind_kph: wind,
            temp_max_c: 18.0,
            temp_min_c: 9.0,
        }
    }
}

/// 可配置的天气数据源
///
/// - rain_days: 每月降雨天数（其余恶劣天数为 0）
/// - pattern: 预报按此序列循环；为空表示预报不可用
/// - known_locations: 为空时接受任意地点
pub struct MockWeatherProvider {
    pub rain_days: f64,
    pub pattern: Vec<DayKind>,
    pub known_locations: Vec<String>,
    pub climate_available: bool,
    pub delay: Option<std::time::Duration>,
    calls: AtomicUsize,
}

impl MockWeatherProvider {
    /// 全年零风险 + 全晴预报
    pub fn clear() -> Self {
        Self {
            rain_days: 0.0,
            pattern: vec![DayKind::Clear],
            known_locations: Vec::new(),
            climate_available: true,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// 历史 + 预报都不可用
    pub fn unreachable() -> Self {
        Self {
            pattern: Vec::new(),
            climate_available: false,
            ..Self::clear()
        }
    }

    /// 响应慢于超时阈值
    pub fn slow(delay_ms: u64) -> Self {
        Self {
            delay: Some(std::time::Duration::from_millis(delay_ms)),
            ..Self::clear()
        }
    }

    pub fn with_rain_days(mut self, rain_days: f64) -> Self {
        self.rain_days = rain_days;
        self
    }

    pub fn with_pattern(mut self, pattern: Vec<DayKind>) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn only_locations(mut self, locations: &[&str]) -> Self {
        self.known_locations = locations.iter().map(|l| l.to_lowercase()).collect();
        self
    }

    /// 数据源被调用次数（历史 + 预报）
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self, location: &str) -> Result<(), WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if !self.known_locations.is_empty()
            && !self.known_locations.contains(&location.trim().to_lowercase())
        {
            return Err(WeatherError::UnknownLocation(location.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl WeatherProvider for MockWeatherProvider {
    async fn climate_normals(&self, location: &str) -> Result<ClimateProfile, WeatherError> {
        self.enter(location).await?;
        if !self.climate_available {
            return Err(WeatherError::Unavailable("mock climate offline".to_string()));
        }
        Ok(ClimateProfile {
            location: location.to_string(),
            months: (1..=12)
                .map(|month| MonthlyClimate {
                    month,
                    rain_days: self.rain_days,
                    extreme_temp_days: 0.0,
                    high_wind_days: 0.0,
                })
                .collect(),
        })
    }

    async fn forecast(
        &self,
        location: &str,
        from: NaiveDate,
        days: u32,
    ) -> Result<Vec<DailyForecast>, WeatherError> {
        self.enter(location).await?;
        if self.pattern.is_empty() {
            return Err(WeatherError::Unavailable("mock forecast offline".to_string()));
        }
        Ok((0..days as usize)
            .map(|i| {
                let kind = self.pattern[i % self.pattern.len()];
                kind.forecast(from + Duration::days(i as i64))
            })
            .collect())
    }
}
