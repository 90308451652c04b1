// ==========================================
// 服务排期引擎 - 引擎编排器
// ==========================================
// 主流程: 依赖校验 -> 工期估算 -> 天气风险 -> 关键路径排期
// 红线: 每次求解独立，不读取上一次选择的任何缓存结果
// 红线: 数据降级只体现在 confidence / warnings，不转为错误
// ==========================================

use crate::catalog::ServiceCatalog;
use crate::config::EngineConfig;
use crate::domain::duration::ServiceDuration;
use crate::domain::schedule::{SchedulePlan, Timeline, WorkCalendar};
use crate::domain::selection::{BuildingProfile, Measurement, SelectedServiceSet};
use crate::domain::types::{Confidence, Difficulty, WeatherSource};
use crate::domain::weather::WeatherAnalysis;
use crate::engine::critical_path::{CriticalPathScheduler, ScheduleError};
use crate::engine::dependency::{DependencyValidator, ValidationIssue};
use crate::engine::duration::{DurationEstimator, Estimate};
use crate::engine::override_ctl::{check_upper_bound, OverrideError};
use crate::engine::weather_risk::WeatherRiskModel;
use crate::i18n::t_with_args;
use crate::weather::{WeatherError, WeatherProvider};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

// ==========================================
// SolveInput - 求解输入
// ==========================================

/// 求解时预先给定的人工覆写
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationOverride {
    pub hours: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveInput {
    /// 服务ID -> 测量值
    #[serde(default)]
    pub measurements: BTreeMap<String, Measurement>,
    #[serde(default)]
    pub building: BuildingProfile,
    #[serde(default = "default_difficulty")]
    pub difficulty: Difficulty,
    pub location: String,
    pub start_date: NaiveDate,
    /// 缺省取配置中的日产能
    #[serde(default)]
    pub daily_capacity_hours: Option<f64>,
    /// 服务ID -> 覆写
    #[serde(default)]
    pub overrides: BTreeMap<String, DurationOverride>,
}

fn default_difficulty() -> Difficulty {
    Difficulty::Medium
}

impl SolveInput {
    pub fn new(location: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            measurements: BTreeMap::new(),
            building: BuildingProfile::default(),
            difficulty: default_difficulty(),
            location: location.into(),
            start_date,
            daily_capacity_hours: None,
            overrides: BTreeMap::new(),
        }
    }
}

// ==========================================
// SolveError - 求解失败（均为输入校验类错误）
// ==========================================
#[derive(Error, Debug)]
pub enum SolveError {
    #[error("服务选择无效: {} 个问题", .0.len())]
    InvalidSelection(Vec<ValidationIssue>),

    #[error("以下服务缺少必需的测量值: {0:?}")]
    MeasurementRequired(Vec<String>),

    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error(transparent)]
    Override(#[from] OverrideError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

// ==========================================
// ScheduleOrchestrator - 引擎编排器
// ==========================================
pub struct ScheduleOrchestrator {
    catalog: Arc<ServiceCatalog>,
    validator: DependencyValidator,
    estimator: DurationEstimator,
    weather: WeatherRiskModel,
    scheduler: CriticalPathScheduler,
    calendar: WorkCalendar,
    default_capacity_hours: f64,
}

impl ScheduleOrchestrator {
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - catalog: 只读服务目录
    /// - provider: 天气数据源
    /// - config: 引擎配置快照
    pub fn new(
        catalog: Arc<ServiceCatalog>,
        provider: Arc<dyn WeatherProvider>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            validator: DependencyValidator::new(catalog.clone()),
            estimator: DurationEstimator::new(),
            weather: WeatherRiskModel::new(provider, config.weather_settings()),
            scheduler: CriticalPathScheduler::new(),
            calendar: config.calendar(),
            default_capacity_hours: config.daily_capacity_hours,
            catalog,
        }
    }

    pub fn validator(&self) -> &DependencyValidator {
        &self.validator
    }

    pub fn weather_model(&self) -> &WeatherRiskModel {
        &self.weather
    }

    /// 执行完整求解流程
    ///
    /// # 返回
    /// - Ok(Timeline): 可能带有降级标记
    /// - Err(SolveError): 输入校验失败，未产生排期
    #[instrument(
        skip(self, selection, input),
        fields(location = %input.location, start_date = %input.start_date, services = selection.len())
    )]
    pub async fn solve(
        &self,
        selection: &SelectedServiceSet,
        input: &SolveInput,
    ) -> Result<Timeline, SolveError> {
        // ==========================================
        // 步骤1: 依赖校验（重新计算，不信任传入的集合）
        // ==========================================
        debug!("步骤1: 依赖校验");
        let requested: Vec<String> = selection.requested.clone();
        let outcome = self.validator.validate(&requested);
        if !outcome.is_valid() {
            return Err(SolveError::InvalidSelection(outcome.errors));
        }
        let order = outcome.order;
        let mut warnings: Vec<String> = outcome.warnings.into_iter().map(|w| w.message).collect();

        // ==========================================
        // 步骤2: 工期估算（各服务互不依赖）
        // ==========================================
        debug!("步骤2: 工期估算");
        let mut durations = Vec::with_capacity(order.len());
        let mut missing = Vec::new();
        for service_id in &order {
            let Some(service) = self.catalog.get(service_id) else {
                continue;
            };
            match self.estimator.estimate(
                service,
                input.measurements.get(service_id),
                &input.building,
                input.difficulty,
            ) {
                Estimate::Estimated(duration) => {
                    if duration.confidence == Confidence::Low {
                        warnings.push(t_with_args(
                            "warning.measurement_defaulted",
                            &[
                                ("service", service_id.as_str()),
                                ("hours", duration.base_duration_hours.to_string().as_str()),
                            ],
                        ));
                    }
                    durations.push(duration);
                }
                Estimate::MeasurementRequired { service_id } => missing.push(service_id),
            }
        }
        if !missing.is_empty() {
            return Err(SolveError::MeasurementRequired(missing));
        }
        let (stories, height_assumed) = input.building.story_equivalent();
        if height_assumed {
            warnings.push(t_with_args(
                "warning.height_assumed",
                &[("stories", stories.to_string().as_str())],
            ));
        }

        // ==========================================
        // 步骤3: 天气风险（每次求解只拉取一次）
        // ==========================================
        debug!("步骤3: 天气风险分析");
        let sensitive: Vec<String> = order
            .iter()
            .filter(|id| self.catalog.get(id).map(|s| s.weather_sensitive).unwrap_or(false))
            .cloned()
            .collect();
        let analysis = self
            .weather
            .analyze(&input.location, &sensitive, input.start_date)
            .await?;
        warnings.extend(weather_warnings(&analysis));

        let durations: Vec<ServiceDuration> = durations
            .into_iter()
            .map(|d| self.apply_weather(d, &analysis))
            .collect();

        // ==========================================
        // 步骤4: 预置覆写
        // ==========================================
        let durations = apply_overrides(durations, &input.overrides)?;

        // ==========================================
        // 步骤5: 关键路径排期
        // ==========================================
        debug!("步骤5: 关键路径排期");
        let plan = self.build_plan(
            order,
            input.start_date,
            input.daily_capacity_hours.unwrap_or(self.default_capacity_hours),
        );
        let scheduled = self.scheduler.schedule(&durations, &plan)?;

        let confidence = durations
            .iter()
            .map(|d| d.confidence)
            .min()
            .unwrap_or(Confidence::Low);

        info!(
            service_count = durations.len(),
            total_duration_days = scheduled.total_duration_days,
            confidence = %confidence,
            weather_source = %analysis.source,
            degraded = analysis.degraded,
            "求解完成"
        );

        Ok(scheduled.into_timeline(durations, analysis, plan, confidence, warnings))
    }

    /// 叠加天气缓冲并按数据来源下调置信度
    fn apply_weather(&self, duration: ServiceDuration, analysis: &WeatherAnalysis) -> ServiceDuration {
        if !analysis.per_service_risk.contains_key(&duration.service_id) {
            return duration;
        }
        let buffer = self
            .weather
            .buffer_hours(analysis, &duration.service_id, duration.base_duration_hours);
        let mut duration = duration.with_weather_buffer(buffer);

        let cap = match (analysis.source, analysis.degraded) {
            (WeatherSource::Default, _) => Confidence::Low,
            (_, true) => Confidence::Medium,
            (_, false) => Confidence::High,
        };
        duration.confidence = duration.confidence.min(cap);
        duration
    }

    fn build_plan(&self, order: Vec<String>, start_date: NaiveDate, capacity: f64) -> SchedulePlan {
        let selected: BTreeSet<String> = order.iter().cloned().collect();

        let mut depends_on: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (before, after) in self.catalog.precedence_edges_within(&selected) {
            let preds = depends_on.entry(after).or_default();
            if !preds.contains(&before) {
                preds.push(before);
            }
        }
        for preds in depends_on.values_mut() {
            preds.sort_by_key(|id| self.catalog.rank(id));
        }

        let priority_rank = order
            .iter()
            .map(|id| (id.clone(), self.catalog.rank(id)))
            .collect();

        SchedulePlan {
            order,
            depends_on,
            priority_rank,
            project_start: start_date,
            daily_capacity_hours: capacity,
            calendar: self.calendar.clone(),
        }
    }
}

fn weather_warnings(analysis: &WeatherAnalysis) -> Vec<String> {
    if analysis.source == WeatherSource::Default {
        vec![t_with_args(
            "warning.weather_default",
            &[("risk", analysis.overall_risk_score.to_string().as_str())],
        )]
    } else if analysis.degraded {
        vec![t_with_args(
            "warning.weather_degraded",
            &[("source", analysis.source.to_string().as_str())],
        )]
    } else {
        Vec::new()
    }
}

fn apply_overrides(
    mut durations: Vec<ServiceDuration>,
    overrides: &BTreeMap<String, DurationOverride>,
) -> Result<Vec<ServiceDuration>, OverrideError> {
    for (service_id, o) in overrides {
        if !o.hours.is_finite() || o.hours <= 0.0 {
            return Err(OverrideError::NonPositiveHours(o.hours));
        }
        check_upper_bound(o.hours)?;
        let reason = o.reason.trim();
        if reason.is_empty() {
            return Err(OverrideError::MissingReason);
        }
        let target = durations
            .iter_mut()
            .find(|d| &d.service_id == service_id)
            .ok_or_else(|| OverrideError::UnknownService(service_id.clone()))?;
        target.apply_override(o.hours, reason);
    }
    Ok(durations)
}
