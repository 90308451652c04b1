// ==========================================
// 服务排期引擎 - 人工覆写与重算控制器
// ==========================================
// 覆写是唯一的 "修改型" 入口: 只改目标服务的工期，然后整体重排
// 红线: 不修改天气分析结果；覆写值不再叠加天气缓冲
// 红线: 校验失败时原 Timeline 不变（纯函数，返回新 Timeline）
// ==========================================

use crate::domain::duration::ServiceDuration;
use crate::domain::schedule::Timeline;
use crate::engine::critical_path::{CriticalPathScheduler, ScheduleError, MAX_SERVICE_HOURS};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OverrideError {
    #[error("覆写工期必须为正数: {0}")]
    NonPositiveHours(f64),

    #[error("覆写工期超出上限 {max}h: {hours}")]
    HoursOutOfRange { hours: f64, max: f64 },

    #[error("覆写原因不能为空")]
    MissingReason,

    #[error("排期中不存在该服务: {0}")]
    UnknownService(String),

    #[error("重算失败: {0}")]
    Schedule(#[from] ScheduleError),
}

// ==========================================
// OverrideController
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct OverrideController {
    scheduler: CriticalPathScheduler,
}

impl OverrideController {
    pub fn new() -> Self {
        Self {
            scheduler: CriticalPathScheduler::new(),
        }
    }

    /// 覆写单个服务工期并重算
    ///
    /// # 参数
    /// - `timeline`: 上一次求解结果
    /// - `service_id`: 目标服务
    /// - `hours`: 新工期（小时，> 0）
    /// - `reason`: 覆写原因（非空）
    pub fn apply(
        &self,
        timeline: &Timeline,
        service_id: &str,
        hours: f64,
        reason: &str,
    ) -> Result<Timeline, OverrideError> {
        if !hours.is_finite() || hours <= 0.0 {
            warn!(service_id, hours, "覆写工期非法");
            return Err(OverrideError::NonPositiveHours(hours));
        }
        check_upper_bound(hours)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(OverrideError::MissingReason);
        }

        let mut durations = timeline.durations.clone();
        let target = durations
            .iter_mut()
            .find(|d| d.service_id == service_id)
            .ok_or_else(|| OverrideError::UnknownService(service_id.to_string()))?;
        let previous_hours = target.final_duration_hours;
        target.apply_override(hours, reason);

        let next = self.reschedule(timeline, durations)?;
        info!(
            service_id,
            previous_hours,
            new_hours = hours,
            reason,
            total_duration_days = next.total_duration_days,
            "工期覆写完成"
        );
        Ok(next)
    }

    /// 清除覆写，恢复 基础工期 + 天气缓冲 并重算
    pub fn clear(&self, timeline: &Timeline, service_id: &str) -> Result<Timeline, OverrideError> {
        let mut durations = timeline.durations.clone();
        let target = durations
            .iter_mut()
            .find(|d| d.service_id == service_id)
            .ok_or_else(|| OverrideError::UnknownService(service_id.to_string()))?;
        target.clear_override();

        let next = self.reschedule(timeline, durations)?;
        info!(
            service_id,
            total_duration_days = next.total_duration_days,
            "工期覆写已清除"
        );
        Ok(next)
    }

    fn reschedule(
        &self,
        timeline: &Timeline,
        durations: Vec<ServiceDuration>,
    ) -> Result<Timeline, OverrideError> {
        let scheduled = self.scheduler.schedule(&durations, &timeline.plan)?;
        Ok(scheduled.into_timeline(
            durations,
            timeline.weather.clone(),
            timeline.plan.clone(),
            timeline.confidence,
            timeline.warnings.clone(),
        ))
    }
}

/// 覆写工期不得超过单个服务工期上限
pub(crate) fn check_upper_bound(hours: f64) -> Result<(), OverrideError> {
    if hours > MAX_SERVICE_HOURS {
        return Err(OverrideError::HoursOutOfRange {
            hours,
            max: MAX_SERVICE_HOURS,
        });
    }
    Ok(())
}
