// ==========================================
// 服务排期引擎 - 求解输入校验器
// ==========================================
// 职责: 外部协作方提供的输入一律视为不可信，求解前做取值范围校验
// 范围: 测量值 / 建筑高度 / 地点 / 开工日 / 日产能
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::selection::{BuildingProfile, Measurement};
use crate::engine::critical_path::MAX_SERVICE_HOURS;
use crate::engine::orchestrator::SolveInput;
use chrono::NaiveDate;

/// 层数上限
pub const MAX_STORIES: u32 = 200;

/// 单项测量值上限（平方英尺）
pub const MAX_MEASUREMENT_SQFT: f64 = 10_000_000.0;

/// 日产能上限（小时）
pub const MAX_DAILY_CAPACITY_HOURS: f64 = 24.0;

// ==========================================
// SolveInputValidator - 求解输入校验器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct SolveInputValidator;

impl SolveInputValidator {
    pub fn new() -> Self {
        Self
    }

    /// 校验完整的求解输入
    ///
    /// # 参数
    /// - input: 求解输入
    /// - today: 当前日期（开工日不得早于今天）
    pub fn validate(&self, input: &SolveInput, today: NaiveDate) -> ApiResult<()> {
        for (service_id, measurement) in &input.measurements {
            self.validate_measurement(service_id, measurement)?;
        }
        self.validate_building(&input.building)?;
        self.validate_location(&input.location)?;
        self.validate_start_date(input.start_date, today)?;
        if let Some(capacity) = input.daily_capacity_hours {
            self.validate_capacity(capacity)?;
        }
        for (service_id, o) in &input.overrides {
            if !o.hours.is_finite() || o.hours <= 0.0 {
                return Err(ApiError::InvalidOverride(format!(
                    "{}: 工期必须为正数 ({})",
                    service_id, o.hours
                )));
            }
            if o.hours > MAX_SERVICE_HOURS {
                return Err(ApiError::InvalidOverride(format!(
                    "{}: 工期超出上限 {}h ({})",
                    service_id, MAX_SERVICE_HOURS, o.hours
                )));
            }
            if o.reason.trim().is_empty() {
                return Err(ApiError::InvalidOverride(format!("{}: 覆写原因不能为空", service_id)));
            }
        }
        Ok(())
    }

    /// 测量值必须为有限非负数，且不超过上限
    pub fn validate_measurement(&self, service_id: &str, m: &Measurement) -> ApiResult<()> {
        for (name, value) in [("areaSqft", m.area_sqft), ("glassAreaSqft", m.glass_area_sqft)] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(ApiError::invalid_input(
                        &format!("measurements.{}.{}", service_id, name),
                        format!("测量值必须为非负数: {}", v),
                    ));
                }
                if v > MAX_MEASUREMENT_SQFT {
                    return Err(ApiError::invalid_input(
                        &format!("measurements.{}.{}", service_id, name),
                        format!("测量值超出上限 {}: {}", MAX_MEASUREMENT_SQFT, v),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn validate_building(&self, building: &BuildingProfile) -> ApiResult<()> {
        if let Some(stories) = building.stories {
            if stories == 0 || stories > MAX_STORIES {
                return Err(ApiError::invalid_input(
                    "building.stories",
                    format!("层数必须在 1..={} 之间: {}", MAX_STORIES, stories),
                ));
            }
        }
        if let Some(feet) = building.height_ft {
            if !feet.is_finite() || feet <= 0.0 {
                return Err(ApiError::invalid_input(
                    "building.heightFt",
                    format!("建筑高度必须为正数: {}", feet),
                ));
            }
        }
        Ok(())
    }

    /// 地点非空（能否被数据源识别由天气模型判断）
    pub fn validate_location(&self, location: &str) -> ApiResult<()> {
        if location.trim().is_empty() {
            return Err(ApiError::invalid_input("location", "地点不能为空"));
        }
        Ok(())
    }

    pub fn validate_start_date(&self, start_date: NaiveDate, today: NaiveDate) -> ApiResult<()> {
        if start_date < today {
            return Err(ApiError::invalid_input(
                "startDate",
                format!("开工日不能早于今天: {} < {}", start_date, today),
            ));
        }
        Ok(())
    }

    pub fn validate_capacity(&self, capacity: f64) -> ApiResult<()> {
        if !capacity.is_finite() || capacity <= 0.0 || capacity > MAX_DAILY_CAPACITY_HOURS {
            return Err(ApiError::invalid_input(
                "dailyCapacityHours",
                format!("日产能必须在 (0, {}] 之间: {}", MAX_DAILY_CAPACITY_HOURS, capacity),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::orchestrator::DurationOverride;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn input() -> SolveInput {
        SolveInput::new("Seattle", NaiveDate::from_ymd_opt(2026, 11, 2).unwrap())
    }

    fn field_of(err: ApiError) -> String {
        match err {
            ApiError::InvalidInput { field, .. } => field,
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_input_passes() {
        let mut input = input();
        input
            .measurements
            .insert("window_cleaning".to_string(), Measurement::glass_area(0.0));
        input.building = BuildingProfile::with_stories(12);
        input.daily_capacity_hours = Some(10.0);
        assert!(SolveInputValidator::new().validate(&input, today()).is_ok());
    }

    #[test]
    fn test_negative_measurement_rejected() {
        let mut input = input();
        input
            .measurements
            .insert("pressure_washing".to_string(), Measurement::area(-5.0));
        let err = SolveInputValidator::new().validate(&input, today()).unwrap_err();
        assert_eq!(field_of(err), "measurements.pressure_washing.areaSqft");
    }

    #[test]
    fn test_past_start_date_rejected() {
        let mut input = input();
        input.start_date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let err = SolveInputValidator::new().validate(&input, today()).unwrap_err();
        assert_eq!(field_of(err), "startDate");

        // 当天开工允许
        input.start_date = today();
        assert!(SolveInputValidator::new().validate(&input, today()).is_ok());
    }

    #[test]
    fn test_building_and_capacity_ranges() {
        let v = SolveInputValidator::new();
        assert!(v.validate_building(&BuildingProfile::with_stories(0)).is_err());
        assert!(v.validate_building(&BuildingProfile::with_stories(201)).is_err());
        assert!(v
            .validate_building(&BuildingProfile {
                stories: None,
                height_ft: Some(-3.0)
            })
            .is_err());
        assert!(v.validate_capacity(24.0).is_ok());
        assert!(v.validate_capacity(24.5).is_err());
        assert!(v.validate_capacity(f64::NAN).is_err());
        assert!(v.validate_location("   ").is_err());
    }

    #[test]
    fn test_preset_override_checked() {
        let mut input = input();
        input.overrides.insert(
            "window_cleaning".to_string(),
            DurationOverride {
                hours: -1.0,
                reason: "x".to_string(),
            },
        );
        let err = SolveInputValidator::new().validate(&input, today()).unwrap_err();
        assert_eq!(err.code(), "INVALID_OVERRIDE");
    }

    #[test]
    fn test_oversized_measurement_and_override_rejected() {
        let mut input = input();
        input
            .measurements
            .insert("window_cleaning".to_string(), Measurement::glass_area(1.0e13));
        let err = SolveInputValidator::new().validate(&input, today()).unwrap_err();
        assert_eq!(field_of(err), "measurements.window_cleaning.glassAreaSqft");

        let mut input = self::input();
        input.overrides.insert(
            "window_cleaning".to_string(),
            DurationOverride {
                hours: 1.0e12,
                reason: "long job".to_string(),
            },
        );
        let err = SolveInputValidator::new().validate(&input, today()).unwrap_err();
        assert_eq!(err.code(), "INVALID_OVERRIDE");
    }
}
