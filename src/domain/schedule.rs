// ==========================================
// 服务排期引擎 - 排期结果 (Timeline)
// ==========================================
// Timeline 是引擎唯一对外输出；每次求解整体重算，不做日期增量修补
// 结束日期为开区间: 占用工作日 [start_day, end_day)
// ==========================================

use crate::domain::duration::ServiceDuration;
use crate::domain::types::Confidence;
use crate::domain::weather::WeatherAnalysis;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// WorkCalendar - 工作日历
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkCalendar {
    /// 非工作日（默认每天都可施工）
    #[serde(default)]
    pub non_working_weekdays: Vec<Weekday>,
}

impl WorkCalendar {
    pub fn every_day() -> Self {
        Self::default()
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !self.non_working_weekdays.contains(&date.weekday())
    }

    /// 至少有一天可施工
    pub fn has_working_days(&self) -> bool {
        self.working_days_per_week() > 0
    }

    /// 第 offset 个工作日对应的日期（offset=0 为项目开工日之后的首个工作日）
    ///
    /// 整周按 7 个自然日跨步，余数逐日推进；超出日期范围时返回 None
    /// 没有任何工作日时按自然日推算
    pub fn date_at(&self, project_start: NaiveDate, offset: i64) -> Option<NaiveDate> {
        let offset = u64::try_from(offset).ok()?;
        let working_per_week = self.working_days_per_week();
        if working_per_week == 0 {
            return project_start.checked_add_days(Days::new(offset));
        }

        let mut current = project_start;
        while !self.is_working_day(current) {
            current = current.succ_opt()?;
        }

        current = current.checked_add_days(Days::new((offset / working_per_week).checked_mul(7)?))?;
        let mut remaining = offset % working_per_week;
        while remaining > 0 {
            current = current.succ_opt()?;
            if self.is_working_day(current) {
                remaining -= 1;
            }
        }
        Some(current)
    }

    fn working_days_per_week(&self) -> u64 {
        let mut days = self.non_working_weekdays.clone();
        days.sort_by_key(|d| d.num_days_from_monday());
        days.dedup();
        7 - days.len() as u64
    }
}

// ==========================================
// SchedulePlan - 求解输入（随 Timeline 保存，供覆写重算）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePlan {
    /// 拓扑顺序
    pub order: Vec<String>,
    /// 服务ID -> 直接前驱
    pub depends_on: BTreeMap<String, Vec<String>>,
    /// 服务ID -> 目录优先级排名（关键路径平局裁决）
    pub priority_rank: BTreeMap<String, usize>,
    pub project_start: NaiveDate,
    pub daily_capacity_hours: f64,
    pub calendar: WorkCalendar,
}

impl SchedulePlan {
    pub fn predecessors(&self, service_id: &str) -> &[String] {
        self.depends_on
            .get(service_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn rank(&self, service_id: &str) -> usize {
        self.priority_rank
            .get(service_id)
            .copied()
            .unwrap_or(usize::MAX)
    }
}

// ==========================================
// ScheduleEntry - 单个服务的排期
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub service_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// 距项目开工的工作日偏移
    pub start_day: i64,
    pub end_day: i64,
    pub duration_hours: f64,
    pub duration_days: i64,
    pub on_critical_path: bool,
    pub depends_on: Vec<String>,
}

// ==========================================
// Timeline - 排期结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub entries: Vec<ScheduleEntry>,
    pub total_duration_days: i64,
    pub critical_path_service_ids: Vec<String>,
    pub project_start: NaiveDate,
    pub project_end: NaiveDate,

    // ===== 重算所需上下文 =====
    pub durations: Vec<ServiceDuration>,
    pub weather: WeatherAnalysis,
    pub plan: SchedulePlan,

    // ===== 质量标记 =====
    pub confidence: Confidence,
    pub warnings: Vec<String>,
}

impl Timeline {
    pub fn entry(&self, service_id: &str) -> Option<&ScheduleEntry> {
        self.entries.iter().find(|e| e.service_id == service_id)
    }

    pub fn duration(&self, service_id: &str) -> Option<&ServiceDuration> {
        self.durations.iter().find(|d| d.service_id == service_id)
    }

    /// 总工时（成本/报价协作方读取）
    pub fn total_hours(&self) -> f64 {
        self.entries.iter().map(|e| e.duration_hours).sum()
    }
}
