// ==========================================
// 服务排期引擎 - 气候常年值表
// ==========================================
// CSV 列: location,month,rain_days,extreme_temp_days,high_wind_days
// ==========================================

use crate::domain::weather::{ClimateProfile, DailyForecast, MonthlyClimate};
use crate::weather::{normalize_location, WeatherError, WeatherProvider};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct ClimateRow {
    location: String,
    month: u32,
    rain_days: f64,
    extreme_temp_days: f64,
    high_wind_days: f64,
}

// ==========================================
// ClimateTable - 按地点索引的气候常年值
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ClimateTable {
    profiles: BTreeMap<String, ClimateProfile>,
}

impl ClimateTable {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, WeatherError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut profiles: BTreeMap<String, ClimateProfile> = BTreeMap::new();
        for (line, record) in csv_reader.deserialize::<ClimateRow>().enumerate() {
            let row = record?;
            if !(1..=12).contains(&row.month) {
                return Err(WeatherError::InvalidData(format!(
                    "第{}行月份非法: {}",
                    line + 2,
                    row.month
                )));
            }
            if [row.rain_days, row.extreme_temp_days, row.high_wind_days]
                .iter()
                .any(|v| !v.is_finite() || *v < 0.0)
            {
                return Err(WeatherError::InvalidData(format!(
                    "第{}行天数为负或非数值",
                    line + 2
                )));
            }

            let key = normalize_location(&row.location);
            let profile = profiles.entry(key).or_insert_with(|| ClimateProfile {
                location: row.location.trim().to_string(),
                months: Vec::new(),
            });
            // 同月重复出现时以后者为准
            profile.months.retain(|m| m.month != row.month);
            profile.months.push(MonthlyClimate {
                month: row.month,
                rain_days: row.rain_days,
                extreme_temp_days: row.extreme_temp_days,
                high_wind_days: row.high_wind_days,
            });
        }

        for profile in profiles.values_mut() {
            profile.months.sort_by_key(|m| m.month);
        }

        info!(location_count = profiles.len(), "气候常年值表加载完成");
        Ok(Self { profiles })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, WeatherError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn insert(&mut self, profile: ClimateProfile) {
        self.profiles
            .insert(normalize_location(&profile.location), profile);
    }

    pub fn get(&self, location: &str) -> Option<&ClimateProfile> {
        self.profiles.get(&normalize_location(location))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

// ==========================================
// ClimateTableProvider - 离线数据源
// ==========================================
/// 只提供历史常年值；预报一律报告不可用，由风险模型退化为纯历史风险
#[derive(Debug, Clone)]
pub struct ClimateTableProvider {
    table: ClimateTable,
}

impl ClimateTableProvider {
    pub fn new(table: ClimateTable) -> Self {
        Self { table }
    }
}

#[async_trait]
impl WeatherProvider for ClimateTableProvider {
    async fn climate_normals(&self, location: &str) -> Result<ClimateProfile, WeatherError> {
        self.table
            .get(location)
            .cloned()
            .ok_or_else(|| WeatherError::UnknownLocation(location.to_string()))
    }

    async fn forecast(
        &self,
        location: &str,
        _from: NaiveDate,
        _days: u32,
    ) -> Result<Vec<DailyForecast>, WeatherError> {
        if self.table.get(location).is_none() {
            return Err(WeatherError::UnknownLocation(location.to_string()));
        }
        Err(WeatherError::Unavailable("离线数据源不提供预报".to_string()))
    }
}
