// ==========================================
// 配置与外部数据集成测试
// ==========================================
// 测试目标: JSON 配置文件 / 气候 CSV / 自定义服务目录 / 请求反序列化
// ==========================================

mod test_helpers;

use chrono::Weekday;
use service_schedule::api::{ApiError, ScheduleApi};
use service_schedule::catalog::builtin::*;
use service_schedule::catalog::{CatalogError, ServiceCatalog};
use service_schedule::config::{config_keys, ConfigManager, EngineConfig};
use service_schedule::engine::SolveInput;
use service_schedule::weather::{ClimateTable, ClimateTableProvider, UnavailableProvider};
use service_schedule::{Confidence, Difficulty, WeatherSource};
use std::io::Write;
use std::sync::Arc;
use tempfile::{tempdir, NamedTempFile};
use test_helpers::*;

const CLIMATE_CSV: &str = "location,month,rain_days,extreme_temp_days,high_wind_days
Seattle,11,18,1,3
Seattle,7,3,0,1
Phoenix,11,1,0,1
";

fn climate_provider() -> Arc<ClimateTableProvider> {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(CLIMATE_CSV.as_bytes()).unwrap();
    let table = ClimateTable::from_path(file.path()).expect("climate table");
    Arc::new(ClimateTableProvider::new(table))
}

// ==========================================
// 配置文件
// ==========================================

#[tokio::test]
async fn test_config_file_overrides_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{ "daily_capacity_hours": "6", "non_working_weekdays": "Sat, Sun" }"#,
    )
    .unwrap();

    let manager = ConfigManager::new(&path).unwrap();
    let config = EngineConfig::load(&manager).await.unwrap();
    assert_eq!(config.daily_capacity_hours, 6.0);
    assert_eq!(config.non_working_weekdays, vec![Weekday::Sat, Weekday::Sun]);
    assert_eq!(config.default_risk, 0.3);
}

#[tokio::test]
async fn test_config_changes_persist_to_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let manager = ConfigManager::new(&path).unwrap();
    manager
        .set_config_value(config_keys::FORECAST_WEIGHT, "0.6")
        .unwrap();
    assert!(path.exists());

    let reloaded = ConfigManager::new(&path).unwrap();
    let config = EngineConfig::load(&reloaded).await.unwrap();
    assert_eq!(config.forecast_weight, 0.6);
}

#[tokio::test]
async fn test_invalid_config_rejected_at_startup() {
    let manager = ConfigManager::in_memory();
    manager
        .set_config_value(config_keys::DEFAULT_RISK, "1.5")
        .unwrap();

    let catalog = Arc::new(ServiceCatalog::builtin().unwrap());
    let err = ScheduleApi::from_config_reader(catalog, Arc::new(UnavailableProvider), &manager, None)
        .await
        .err()
        .expect("config error");
    assert!(matches!(err, ApiError::Config(_)));
    assert_eq!(err.code(), "CONFIG_ERROR");
}

// ==========================================
// 气候常年值
// ==========================================

#[tokio::test]
async fn test_solve_with_offline_climate_table() {
    let catalog = Arc::new(ServiceCatalog::builtin().unwrap());
    let api = ScheduleApi::from_config_reader(
        catalog,
        climate_provider(),
        &ConfigManager::in_memory(),
        None,
    )
    .await
    .unwrap();

    let set = select(&api, &[PRESSURE_WASHING]);
    let input = with_area(plain_input(), PRESSURE_WASHING, 2_000.0);
    let input = with_glass(input, WINDOW_CLEANING, 800.0);
    let timeline = api.solve_as_of(&set, &input, today()).await.unwrap();

    // 11 月: (18 + 1 + 3) / 30
    let weather = &timeline.weather;
    assert_eq!(weather.source, WeatherSource::HistoricalOnly);
    assert!(weather.degraded);
    assert_eq!(weather.overall_risk_score, 0.7333);
    let historical = weather.historical.as_ref().unwrap();
    assert_eq!(historical.month, 11);
    assert_eq!(historical.rain_days, 18.0);
    assert_eq!(timeline.confidence, Confidence::Medium);

    // 24h × 0.7333 × 0.5 ≈ 8.8h
    assert_eq!(timeline.duration(PRESSURE_WASHING).unwrap().weather_buffer_hours, 8.8);

    // 地点不在表中
    let mut input = input;
    input.location = "Atlantis".to_string();
    let err = api.solve_as_of(&set, &input, today()).await.unwrap_err();
    assert_eq!(err.code(), "UNKNOWN_LOCATION");
}

// ==========================================
// 自定义服务目录
// ==========================================

const CUSTOM_CATALOG: &str = r#"[
  {
    "id": "prep",
    "displayName": "Surface Prep",
    "unit": "AREA",
    "baseRatePerUnit": 0.01,
    "weatherSensitive": false,
    "priority": 1,
    "mustPrecede": ["paint"],
    "minimumHours": 4
  },
  {
    "id": "paint",
    "displayName": "Exterior Paint",
    "unit": "AREA",
    "baseRatePerUnit": 0.02,
    "weatherSensitive": true,
    "priority": 2,
    "requires": ["prep"],
    "removalBlockedBy": [],
    "minimumHours": 8,
    "defaultable": false
  }
]"#;

#[tokio::test]
async fn test_custom_catalog_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(CUSTOM_CATALOG.as_bytes()).unwrap();
    let catalog = Arc::new(ServiceCatalog::from_json_file(file.path()).unwrap());
    assert_eq!(catalog.len(), 2);

    let api = ScheduleApi::from_config_reader(
        catalog,
        Arc::new(UnavailableProvider),
        &ConfigManager::in_memory(),
        None,
    )
    .await
    .unwrap();

    let outcome = api.validate_services(&ids(&["paint"]));
    assert!(outcome.is_valid());
    assert_eq!(outcome.order, ids(&["prep", "paint"]));

    let input = with_area(plain_input(), "prep", 800.0);
    let input = with_area(input, "paint", 800.0);
    let timeline = api
        .solve_as_of(&outcome.validated_set, &input, today())
        .await
        .unwrap();
    // prep 8h -> 1 天；paint 16h + 默认风险缓冲 2.4h -> 3 天
    assert_eq!(timeline.entry("prep").unwrap().end_day, 1);
    assert_eq!(timeline.duration("paint").unwrap().final_duration_hours, 18.4);
    assert_eq!(timeline.total_duration_days, 4);
    assert_eq!(timeline.confidence, Confidence::Low);
}

#[test]
fn test_cyclic_catalog_rejected_at_load() {
    let raw = r#"[
      { "id": "a", "displayName": "A", "unit": "FIXED", "baseRatePerUnit": 1,
        "weatherSensitive": false, "priority": 1, "mustPrecede": ["b"], "minimumHours": 1 },
      { "id": "b", "displayName": "B", "unit": "FIXED", "baseRatePerUnit": 1,
        "weatherSensitive": false, "priority": 2, "mustPrecede": ["a"], "minimumHours": 1 }
    ]"#;
    let err = ServiceCatalog::from_json_str(raw).unwrap_err();
    assert!(matches!(
        err,
        CatalogError::CyclicDependency { relation: "precedence", .. }
    ));

    let err = ServiceCatalog::from_json_file("/nonexistent/catalog.json").unwrap_err();
    assert!(matches!(err, CatalogError::Io(_)));
}

// ==========================================
// 请求格式
// ==========================================

#[test]
fn test_solve_input_from_json() {
    let raw = r#"{
        "measurements": {
            "pressure_washing": { "areaSqft": 2000 },
            "window_cleaning": { "glassAreaSqft": 800 }
        },
        "building": { "heightFt": 45 },
        "location": "Seattle",
        "startDate": "2026-11-02",
        "overrides": { "window_cleaning": { "hours": 10, "reason": "small crew" } }
    }"#;
    let input: SolveInput = serde_json::from_str(raw).unwrap();
    assert_eq!(input.difficulty, Difficulty::Medium);
    assert_eq!(input.start_date, start_date());
    assert_eq!(input.daily_capacity_hours, None);
    assert_eq!(input.building.story_equivalent(), (5, false));
    assert_eq!(
        input.measurements[PRESSURE_WASHING].area_sqft,
        Some(2000.0)
    );
    assert_eq!(input.overrides[WINDOW_CLEANING].reason, "small crew");
}
