// ==========================================
// 服务排期引擎 - 工期估算引擎
// ==========================================
// 公式: base = 数量 × 单位工时 × 高度系数 × 难度系数
// 红线: 已选服务的工期永不为 0（测量缺失时取保守下限并降低置信度）
// ==========================================

use crate::domain::duration::{round_hours, ServiceDuration};
use crate::domain::selection::{BuildingProfile, Measurement};
use crate::domain::service::ServiceDefinition;
use crate::domain::types::{Confidence, Difficulty, Unit};
use tracing::debug;

/// 估算结果
#[derive(Debug, Clone, PartialEq)]
pub enum Estimate {
    /// 已得到工期
    Estimated(ServiceDuration),
    /// 测量缺失且该服务不允许兜底
    MeasurementRequired { service_id: String },
}

// ==========================================
// DurationEstimator - 工期估算引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct DurationEstimator {
    // 无状态引擎；各服务估算互不依赖，可并行调用
}

impl DurationEstimator {
    pub fn new() -> Self {
        Self {}
    }

    /// 高度系数（按等效层数的单调不减阶梯函数）
    pub fn height_multiplier(stories: u32) -> f64 {
        match stories {
            0..=2 => 1.0,
            3..=5 => 1.2,
            6..=10 => 1.45,
            11..=20 => 1.75,
            _ => 2.1,
        }
    }

    /// 估算单个服务的基础工期
    ///
    /// # 参数
    /// - `service`: 服务定义
    /// - `measurement`: 该服务的测量值（None 表示未提供）
    /// - `building`: 建筑属性
    /// - `difficulty`: 施工难度
    pub fn estimate(
        &self,
        service: &ServiceDefinition,
        measurement: Option<&Measurement>,
        building: &BuildingProfile,
        difficulty: Difficulty,
    ) -> Estimate {
        let (stories, height_assumed) = building.story_equivalent();
        let multiplier = Self::height_multiplier(stories) * difficulty.multiplier();

        let quantity = match measurement {
            Some(m) => m.quantity_for(service.unit),
            // 按次计的服务不依赖测量值
            None if service.unit == Unit::Fixed => Some(1.0),
            None => None,
        };

        let (base_hours, confidence) = match quantity {
            Some(q) => {
                let raw = round_hours(q * service.base_rate_per_unit * multiplier);
                let confidence = if height_assumed {
                    Confidence::Medium
                } else {
                    Confidence::High
                };
                (raw.max(service.minimum_hours), confidence)
            }
            None => {
                if !service.defaultable {
                    return Estimate::MeasurementRequired {
                        service_id: service.id.clone(),
                    };
                }
                (
                    round_hours(service.minimum_hours * multiplier),
                    Confidence::Low,
                )
            }
        };

        debug!(
            service_id = %service.id,
            stories,
            difficulty = %difficulty,
            base_hours,
            confidence = %confidence,
            "工期估算完成"
        );

        Estimate::Estimated(ServiceDuration::new(service.id.clone(), base_hours, confidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin::*;
    use crate::catalog::ServiceCatalog;

    fn catalog() -> ServiceCatalog {
        ServiceCatalog::builtin().unwrap()
    }

    fn estimated(estimate: Estimate) -> ServiceDuration {
        match estimate {
            Estimate::Estimated(d) => d,
            other => panic!("unexpected estimate: {other:?}"),
        }
    }

    #[test]
    fn test_height_multiplier_monotonic() {
        let mut last = 0.0;
        for stories in 0..40 {
            let m = DurationEstimator::height_multiplier(stories);
            assert!(m >= last, "stories={stories}");
            last = m;
        }
    }

    #[test]
    fn test_base_duration_formula() {
        let catalog = catalog();
        let window = catalog.get(WINDOW_CLEANING).unwrap();
        let d = estimated(DurationEstimator::new().estimate(
            window,
            Some(&Measurement::glass_area(10_000.0)),
            &BuildingProfile::with_stories(1),
            Difficulty::Low,
        ));
        assert_eq!(d.base_duration_hours, 100.0);
        assert_eq!(d.confidence, Confidence::High);

        let tall = estimated(DurationEstimator::new().estimate(
            window,
            Some(&Measurement::glass_area(10_000.0)),
            &BuildingProfile::with_stories(8),
            Difficulty::High,
        ));
        assert_eq!(tall.base_duration_hours, round_hours(100.0 * 1.45 * 1.35));
    }

    #[test]
    fn test_missing_measurement_uses_floor_with_low_confidence() {
        let catalog = catalog();
        let pressure = catalog.get(PRESSURE_WASHING).unwrap();
        let d = estimated(DurationEstimator::new().estimate(
            pressure,
            None,
            &BuildingProfile::with_stories(4),
            Difficulty::Medium,
        ));
        assert!(d.base_duration_hours > 0.0);
        assert_eq!(d.base_duration_hours, round_hours(4.0 * 1.2 * 1.15));
        assert_eq!(d.confidence, Confidence::Low);
    }

    #[test]
    fn test_zero_measurement_treated_as_missing() {
        let catalog = catalog();
        let window = catalog.get(WINDOW_CLEANING).unwrap();
        let d = estimated(DurationEstimator::new().estimate(
            window,
            Some(&Measurement::glass_area(0.0)),
            &BuildingProfile::with_stories(1),
            Difficulty::Low,
        ));
        assert_eq!(d.base_duration_hours, 4.0);
        assert_eq!(d.confidence, Confidence::Low);
    }

    #[test]
    fn test_non_defaultable_service_requires_measurement() {
        let catalog = catalog();
        let glass = catalog.get(GLASS_RESTORATION).unwrap();
        let estimate = DurationEstimator::new().estimate(
            glass,
            None,
            &BuildingProfile::with_stories(1),
            Difficulty::Low,
        );
        assert_eq!(
            estimate,
            Estimate::MeasurementRequired {
                service_id: GLASS_RESTORATION.to_string()
            }
        );
    }

    #[test]
    fn test_fixed_unit_needs_no_measurement() {
        let catalog = catalog();
        let inspection = catalog.get(FINAL_INSPECTION).unwrap();
        let d = estimated(DurationEstimator::new().estimate(
            inspection,
            None,
            &BuildingProfile::with_stories(1),
            Difficulty::Low,
        ));
        assert_eq!(d.base_duration_hours, 4.0);
        assert_eq!(d.confidence, Confidence::High);
    }

    #[test]
    fn test_small_quantity_clamped_to_minimum() {
        let catalog = catalog();
        let window = catalog.get(WINDOW_CLEANING).unwrap();
        let d = estimated(DurationEstimator::new().estimate(
            window,
            Some(&Measurement::glass_area(50.0)),
            &BuildingProfile::with_stories(1),
            Difficulty::Low,
        ));
        assert_eq!(d.base_duration_hours, window.minimum_hours);
        assert_eq!(d.confidence, Confidence::High);
    }

    #[test]
    fn test_assumed_height_lowers_confidence() {
        let catalog = catalog();
        let window = catalog.get(WINDOW_CLEANING).unwrap();
        let d = estimated(DurationEstimator::new().estimate(
            window,
            Some(&Measurement::glass_area(1_000.0)),
            &BuildingProfile::default(),
            Difficulty::Low,
        ));
        assert_eq!(d.confidence, Confidence::Medium);
    }
}
