// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 构造 API 实例、服务选择与求解输入
// ==========================================

#![allow(dead_code)]

#[path = "helpers/mock_config.rs"]
pub mod mock_config;
#[path = "helpers/mock_weather.rs"]
pub mod mock_weather;

use chrono::NaiveDate;
use mock_config::{MockConfig, MockConfigReader};
use mock_weather::MockWeatherProvider;
use service_schedule::api::ScheduleApi;
use service_schedule::catalog::ServiceCatalog;
use service_schedule::engine::{RecordingEventPublisher, SolveInput};
use service_schedule::{BuildingProfile, Difficulty, Measurement, SelectedServiceSet};
use std::sync::Arc;

/// 测试中固定的 "今天"
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

/// 默认开工日（周一）
pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 11, 2).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// 构造 API（内置目录 + 指定天气源 + Mock 配置）
pub async fn create_api(provider: MockWeatherProvider, config: MockConfig) -> ScheduleApi {
    create_api_with(Arc::new(provider), config, None).await
}

pub async fn create_api_with(
    provider: Arc<MockWeatherProvider>,
    config: MockConfig,
    publisher: Option<Arc<RecordingEventPublisher>>,
) -> ScheduleApi {
    service_schedule::logging::init_test();
    let catalog = Arc::new(ServiceCatalog::builtin().expect("builtin catalog"));
    let reader = MockConfigReader::new(config);
    let publisher = publisher.map(|p| p as Arc<dyn service_schedule::engine::TimelineEventPublisher>);
    ScheduleApi::from_config_reader(catalog, provider, &reader, publisher)
        .await
        .expect("api creation")
}

/// 校验并返回服务集（断言通过校验）
pub fn select(api: &ScheduleApi, services: &[&str]) -> SelectedServiceSet {
    let outcome = api.validate_services(&ids(services));
    assert!(outcome.is_valid(), "selection rejected: {:?}", outcome.errors);
    outcome.validated_set
}

/// 单层、低难度建筑的求解输入（系数均为 1.0，便于手算）
pub fn plain_input() -> SolveInput {
    let mut input = SolveInput::new("Seattle", start_date());
    input.building = BuildingProfile::with_stories(1);
    input.difficulty = Difficulty::Low;
    input
}

pub fn with_area(mut input: SolveInput, service_id: &str, sqft: f64) -> SolveInput {
    input
        .measurements
        .insert(service_id.to_string(), Measurement::area(sqft));
    input
}

pub fn with_glass(mut input: SolveInput, service_id: &str, sqft: f64) -> SolveInput {
    input
        .measurements
        .insert(service_id.to_string(), Measurement::glass_area(sqft));
    input
}
