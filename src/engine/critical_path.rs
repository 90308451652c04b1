// ==========================================
// 服务排期引擎 - 关键路径排期器
// ==========================================
// 前推: 按拓扑序，开工日 = 所有前驱完工日的最大值（无前驱为第 0 天）
//       完工日 = 开工日 + ceil(工时 / 日产能)，完工日为开区间
// 回溯: 从完工日等于总工期的服务出发，沿 "紧前驱" 回溯到第 0 天
// 红线: 互不依赖的服务并行开工，不因同时被选而串行化
// ==========================================

use crate::domain::duration::ServiceDuration;
use crate::domain::schedule::{ScheduleEntry, SchedulePlan, Timeline};
use crate::domain::types::Confidence;
use crate::domain::weather::WeatherAnalysis;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, info, warn};

/// 单个服务工期上限（工作日）
pub const MAX_SERVICE_DAYS: i64 = 3650;

/// 单个服务工期上限（小时，按每日 24 小时折算）
pub const MAX_SERVICE_HOURS: f64 = MAX_SERVICE_DAYS as f64 * 24.0;

// 工时/产能比值与整数的相对误差在此之内视为整数（例如 27.6 / 9.2 = 3.0000000000000004）
const RATIO_TOLERANCE: f64 = 1e-12;

// ==========================================
// ScheduleError - 排期前置条件错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("排期服务列表为空")]
    EmptyPlan,

    #[error("日产能必须在 (0, 24] 小时之间: {0}")]
    InvalidCapacity(f64),

    #[error("服务缺少工期: {0}")]
    MissingDuration(String),

    #[error("服务工期非法: service={service_id}, hours={hours}")]
    InvalidDuration { service_id: String, hours: f64 },

    #[error("服务工期超出上限: service={service_id}, hours={hours}, 上限 {max_days} 个工作日")]
    DurationOutOfRange {
        service_id: String,
        hours: f64,
        max_days: i64,
    },

    #[error("排期日期超出可表示范围: 第 {0} 个工作日")]
    DateOutOfRange(i64),

    #[error("前驱不在排期中或顺序错误: service={service_id}, predecessor={predecessor}")]
    BrokenOrder {
        service_id: String,
        predecessor: String,
    },
}

/// 排期结果（Timeline 的日期部分）
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTimeline {
    pub entries: Vec<ScheduleEntry>,
    pub total_duration_days: i64,
    pub critical_path_service_ids: Vec<String>,
    pub project_start: NaiveDate,
    pub project_end: NaiveDate,
}

impl ScheduledTimeline {
    /// 附上重算上下文，组装为对外的 Timeline
    pub fn into_timeline(
        self,
        durations: Vec<ServiceDuration>,
        weather: WeatherAnalysis,
        plan: SchedulePlan,
        confidence: Confidence,
        warnings: Vec<String>,
    ) -> Timeline {
        Timeline {
            entries: self.entries,
            total_duration_days: self.total_duration_days,
            critical_path_service_ids: self.critical_path_service_ids,
            project_start: self.project_start,
            project_end: self.project_end,
            durations,
            weather,
            plan,
            confidence,
            warnings,
        }
    }
}

// ==========================================
// CriticalPathScheduler - 关键路径排期器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CriticalPathScheduler {
    // 无状态引擎
}

impl CriticalPathScheduler {
    pub fn new() -> Self {
        Self {}
    }

    /// 工时折算为工作日数（向上取整，至少 1 天）
    ///
    /// 仅吸收比值本身的浮点舍入误差，8.000000001h / 8 仍为 2 天
    pub fn working_days(hours: f64, daily_capacity_hours: f64) -> i64 {
        let ratio = hours / daily_capacity_hours;
        let nearest = ratio.round();
        let days = if (ratio - nearest).abs() <= RATIO_TOLERANCE * nearest.max(1.0) {
            nearest
        } else {
            ratio.ceil()
        };
        (days as i64).max(1)
    }

    /// 排期主入口
    ///
    /// # 参数
    /// - `durations`: 各服务最终工期（覆写值优先）
    /// - `plan`: 拓扑顺序 / 依赖 / 优先级排名 / 开工日 / 日产能
    pub fn schedule(
        &self,
        durations: &[ServiceDuration],
        plan: &SchedulePlan,
    ) -> Result<ScheduledTimeline, ScheduleError> {
        if plan.order.is_empty() {
            return Err(ScheduleError::EmptyPlan);
        }
        let capacity = plan.daily_capacity_hours;
        if !capacity.is_finite() || capacity <= 0.0 || capacity > 24.0 {
            return Err(ScheduleError::InvalidCapacity(capacity));
        }

        let hours_by_id: BTreeMap<&str, f64> = durations
            .iter()
            .map(|d| (d.service_id.as_str(), d.final_duration_hours))
            .collect();

        // ===== 前推 =====
        let mut spans: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
        let mut entries = Vec::with_capacity(plan.order.len());

        for service_id in &plan.order {
            let hours = *hours_by_id
                .get(service_id.as_str())
                .ok_or_else(|| ScheduleError::MissingDuration(service_id.clone()))?;
            if !hours.is_finite() || hours <= 0.0 {
                return Err(ScheduleError::InvalidDuration {
                    service_id: service_id.clone(),
                    hours,
                });
            }

            let depends_on = plan.predecessors(service_id).to_vec();
            let mut start_day = 0;
            for predecessor in &depends_on {
                let (_, end) = spans.get(predecessor.as_str()).ok_or_else(|| {
                    ScheduleError::BrokenOrder {
                        service_id: service_id.clone(),
                        predecessor: predecessor.clone(),
                    }
                })?;
                start_day = start_day.max(*end);
            }

            let duration_days = Self::working_days(hours, capacity);
            if duration_days > MAX_SERVICE_DAYS {
                warn!(service_id = %service_id, hours, duration_days, "服务工期超出上限");
                return Err(ScheduleError::DurationOutOfRange {
                    service_id: service_id.clone(),
                    hours,
                    max_days: MAX_SERVICE_DAYS,
                });
            }
            let end_day = start_day
                .checked_add(duration_days)
                .ok_or(ScheduleError::DateOutOfRange(i64::MAX))?;
            spans.insert(service_id.as_str(), (start_day, end_day));

            debug!(service_id = %service_id, start_day, end_day, hours, "服务排期");

            entries.push(ScheduleEntry {
                service_id: service_id.clone(),
                start_date: date_at(plan, start_day)?,
                end_date: date_at(plan, end_day)?,
                start_day,
                end_day,
                duration_hours: hours,
                duration_days,
                on_critical_path: false,
                depends_on,
            });
        }

        let total_duration_days = entries.iter().map(|e| e.end_day).max().unwrap_or(0);

        // ===== 回溯关键路径 =====
        let critical_path = self.critical_path(&entries, plan, total_duration_days);
        let on_path: BTreeSet<&str> = critical_path.iter().map(|s| s.as_str()).collect();
        for entry in &mut entries {
            entry.on_critical_path = on_path.contains(entry.service_id.as_str());
        }

        info!(
            service_count = entries.len(),
            total_duration_days,
            critical_path = ?critical_path,
            "排期完成"
        );

        Ok(ScheduledTimeline {
            entries,
            total_duration_days,
            critical_path_service_ids: critical_path,
            project_start: plan.project_start,
            project_end: date_at(plan, total_duration_days)?,
        })
    }

    /// 在所有关键链中选出成员优先级排名（升序）字典序最小的一条
    ///
    /// 逐个确定链成员: 每轮取 "仍可能在候选链上" 的节点中排名最小者，
    /// 已确定成员恰好构成一条完整关键链时结束（前缀更短者字典序更小）
    fn critical_path(
        &self,
        entries: &[ScheduleEntry],
        plan: &SchedulePlan,
        total_duration_days: i64,
    ) -> Vec<String> {
        let graph = TightGraph::new(entries, total_duration_days);
        let keys: Vec<(usize, &str)> = entries
            .iter()
            .map(|e| (plan.rank(&e.service_id), e.service_id.as_str()))
            .collect();

        // 已确定成员（按开工日升序），以及相邻成员之间的候选区段
        let mut chosen: Vec<usize> = Vec::new();
        let mut gaps: Vec<BTreeSet<usize>> = vec![graph.between(None, None)];

        loop {
            if graph.closable(&chosen) {
                break;
            }
            let Some((gap_idx, node)) = gaps
                .iter()
                .enumerate()
                .flat_map(|(g, nodes)| nodes.iter().map(move |&n| (g, n)))
                .min_by_key(|&(_, n)| keys[n])
            else {
                break;
            };

            chosen.insert(gap_idx, node);
            let before = gap_idx.checked_sub(1).map(|i| chosen[i]);
            let after = chosen.get(gap_idx + 1).copied();
            gaps[gap_idx] = graph.between(Some(node), after);
            gaps.insert(gap_idx, graph.between(before, Some(node)));
        }

        chosen
            .into_iter()
            .map(|i| entries[i].service_id.clone())
            .collect()
    }
}

/// 第 offset 个工作日的日期，越界报错
fn date_at(plan: &SchedulePlan, offset: i64) -> Result<NaiveDate, ScheduleError> {
    plan.calendar
        .date_at(plan.project_start, offset)
        .ok_or(ScheduleError::DateOutOfRange(offset))
}

// ==========================================
// TightGraph - 紧前驱子图
// ==========================================
// 边 p -> s 当且仅当 p 是 s 的前驱且 p.end_day == s.start_day
struct TightGraph {
    preds: Vec<Vec<usize>>,
    succs: Vec<Vec<usize>>,
    starts_at_zero: Vec<bool>,
    ends_at_makespan: Vec<bool>,
}

impl TightGraph {
    fn new(entries: &[ScheduleEntry], total_duration_days: i64) -> Self {
        let index: BTreeMap<&str, usize> = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.service_id.as_str(), i))
            .collect();
        let mut preds = vec![Vec::new(); entries.len()];
        let mut succs = vec![Vec::new(); entries.len()];
        for (i, entry) in entries.iter().enumerate() {
            for predecessor in &entry.depends_on {
                if let Some(&p) = index.get(predecessor.as_str()) {
                    if entries[p].end_day == entry.start_day {
                        preds[i].push(p);
                        succs[p].push(i);
                    }
                }
            }
        }
        Self {
            preds,
            succs,
            starts_at_zero: entries.iter().map(|e| e.start_day == 0).collect(),
            ends_at_makespan: entries
                .iter()
                .map(|e| e.end_day == total_duration_days)
                .collect(),
        }
    }

    /// 位于 from 与 to 之间某条紧链上的节点（不含两端）
    ///
    /// from 为 None 表示第 0 天，to 为 None 表示总工期
    fn between(&self, from: Option<usize>, to: Option<usize>) -> BTreeSet<usize> {
        let forward = match from {
            Some(n) => reach(&self.succs, self.succs[n].iter().copied()),
            None => reach(&self.succs, flagged(&self.starts_at_zero)),
        };
        let backward = match to {
            Some(n) => reach(&self.preds, self.preds[n].iter().copied()),
            None => reach(&self.preds, flagged(&self.ends_at_makespan)),
        };
        forward.intersection(&backward).copied().collect()
    }

    /// 已确定成员自身能否首尾相接成一条完整关键链
    fn closable(&self, chosen: &[usize]) -> bool {
        let (Some(&first), Some(&last)) = (chosen.first(), chosen.last()) else {
            return false;
        };
        self.starts_at_zero[first]
            && self.ends_at_makespan[last]
            && chosen.windows(2).all(|w| self.succs[w[0]].contains(&w[1]))
    }
}

fn flagged(flags: &[bool]) -> impl Iterator<Item = usize> + '_ {
    flags.iter().enumerate().filter(|(_, f)| **f).map(|(i, _)| i)
}

/// 从 seeds 出发（含 seeds）沿 edges 可达的节点
fn reach(edges: &[Vec<usize>], seeds: impl Iterator<Item = usize>) -> BTreeSet<usize> {
    let mut seen = BTreeSet::new();
    let mut stack: Vec<usize> = seeds.collect();
    while let Some(n) = stack.pop() {
        if seen.insert(n) {
            stack.extend(edges[n].iter().copied());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schedule::WorkCalendar;
    use crate::domain::types::Confidence;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn plan(order: &[&str], deps: &[(&str, &[&str])]) -> SchedulePlan {
        SchedulePlan {
            order: order.iter().map(|s| s.to_string()).collect(),
            depends_on: deps
                .iter()
                .map(|(id, preds)| {
                    (
                        id.to_string(),
                        preds.iter().map(|p| p.to_string()).collect(),
                    )
                })
                .collect(),
            priority_rank: order
                .iter()
                .enumerate()
                .map(|(i, id)| (id.to_string(), i))
                .collect(),
            project_start: date(2026, 11, 2),
            daily_capacity_hours: 8.0,
            calendar: WorkCalendar::every_day(),
        }
    }

    fn hours(list: &[(&str, f64)]) -> Vec<ServiceDuration> {
        list.iter()
            .map(|(id, h)| ServiceDuration::new(*id, *h, Confidence::High))
            .collect()
    }

    #[test]
    fn test_working_days_ceil() {
        assert_eq!(CriticalPathScheduler::working_days(40.0, 8.0), 5);
        assert_eq!(CriticalPathScheduler::working_days(50.0, 8.0), 7);
        assert_eq!(CriticalPathScheduler::working_days(100.0, 8.0), 13);
        assert_eq!(CriticalPathScheduler::working_days(0.5, 8.0), 1);
    }

    #[test]
    fn test_working_days_only_absorbs_rounding_noise() {
        // 27.6 / 9.2 在浮点下略大于 3
        assert_eq!(CriticalPathScheduler::working_days(27.6, 9.2), 3);
        assert_eq!(CriticalPathScheduler::working_days(8.000000001, 8.0), 2);
        assert_eq!(CriticalPathScheduler::working_days(16.01, 8.0), 3);
    }

    #[test]
    fn test_duration_beyond_limit_rejected() {
        let plan = plan(&["window"], &[]);
        let err = CriticalPathScheduler::new()
            .schedule(&hours(&[("window", 1.0e12)]), &plan)
            .unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::DurationOutOfRange { ref service_id, max_days: MAX_SERVICE_DAYS, .. }
                if service_id == "window"
        ));

        // 刚好达到上限仍可排期
        let at_limit = MAX_SERVICE_DAYS as f64 * 8.0;
        let result = CriticalPathScheduler::new()
            .schedule(&hours(&[("window", at_limit)]), &plan)
            .unwrap();
        assert_eq!(result.total_duration_days, MAX_SERVICE_DAYS);
    }

    #[test]
    fn test_dates_beyond_calendar_range_rejected() {
        let mut plan = plan(&["window"], &[]);
        plan.project_start = NaiveDate::MAX - chrono::Duration::days(3);
        let err = CriticalPathScheduler::new()
            .schedule(&hours(&[("window", 80.0)]), &plan)
            .unwrap_err();
        assert!(matches!(err, ScheduleError::DateOutOfRange(_)));
    }

    #[test]
    fn test_wide_layered_plan_picks_first_service_per_layer() {
        // 12 层 × 6 个服务，层间全连接，工期相同：紧链共 6^12 条
        const LAYERS: usize = 12;
        const WIDTH: usize = 6;
        let ids: Vec<Vec<String>> = (0..LAYERS)
            .map(|l| (0..WIDTH).map(|w| format!("s{l:02}_{w}")).collect())
            .collect();
        let order: Vec<&str> = ids.iter().flatten().map(|s| s.as_str()).collect();
        let deps: Vec<(&str, Vec<&str>)> = (1..LAYERS)
            .flat_map(|l| {
                let preds: Vec<&str> = ids[l - 1].iter().map(|s| s.as_str()).collect();
                ids[l].iter().map(move |id| (id.as_str(), preds.clone()))
            })
            .collect();
        let deps: Vec<(&str, &[&str])> = deps.iter().map(|(id, p)| (*id, p.as_slice())).collect();
        let plan = plan(&order, &deps);
        let durations: Vec<(&str, f64)> = order.iter().map(|id| (*id, 8.0)).collect();

        let result = CriticalPathScheduler::new()
            .schedule(&hours(&durations), &plan)
            .unwrap();
        assert_eq!(result.total_duration_days, LAYERS as i64);
        let expected: Vec<String> = ids.iter().map(|layer| layer[0].clone()).collect();
        assert_eq!(result.critical_path_service_ids, expected);
        assert_eq!(
            result.entries.iter().filter(|e| e.on_critical_path).count(),
            LAYERS
        );
    }

    #[test]
    fn test_sequential_chain() {
        let plan = plan(&["window", "glass"], &[("glass", &["window"])]);
        let result = CriticalPathScheduler::new()
            .schedule(&hours(&[("window", 96.0), ("glass", 40.0)]), &plan)
            .unwrap();

        let glass = result.entries.iter().find(|e| e.service_id == "glass").unwrap();
        assert_eq!(result.entries[0].end_day, 12);
        assert_eq!(glass.start_day, 12);
        assert_eq!(glass.end_day, 17);
        assert_eq!(glass.start_date, date(2026, 11, 14));
        assert_eq!(result.total_duration_days, 17);
        assert_eq!(result.critical_path_service_ids, vec!["window", "glass"]);
        assert_eq!(result.project_end, date(2026, 11, 19));
    }

    #[test]
    fn test_independent_services_run_in_parallel() {
        let plan = plan(&["roof", "interior"], &[]);
        let result = CriticalPathScheduler::new()
            .schedule(&hours(&[("roof", 16.0), ("interior", 40.0)]), &plan)
            .unwrap();
        assert!(result.entries.iter().all(|e| e.start_day == 0));
        assert_eq!(result.total_duration_days, 5);
        assert_eq!(result.critical_path_service_ids, vec!["interior"]);
        assert!(!result.entries[0].on_critical_path);
    }

    #[test]
    fn test_tie_prefers_chain_with_earliest_priority() {
        // a -> c, b -> c; a 与 b 同长
        let plan = plan(&["a", "b", "c"], &[("c", &["b", "a"])]);
        let result = CriticalPathScheduler::new()
            .schedule(&hours(&[("a", 16.0), ("b", 16.0), ("c", 8.0)]), &plan)
            .unwrap();
        assert_eq!(result.critical_path_service_ids, vec!["a", "c"]);
    }

    #[test]
    fn test_dependency_respected_with_diamond() {
        let plan = plan(
            &["a", "b", "c", "d"],
            &[("b", &["a"]), ("c", &["a"]), ("d", &["b", "c"])],
        );
        let result = CriticalPathScheduler::new()
            .schedule(
                &hours(&[("a", 8.0), ("b", 24.0), ("c", 8.0), ("d", 8.0)]),
                &plan,
            )
            .unwrap();
        let by_id: BTreeMap<_, _> = result
            .entries
            .iter()
            .map(|e| (e.service_id.as_str(), e))
            .collect();
        for entry in &result.entries {
            for pred in &entry.depends_on {
                assert!(by_id[pred.as_str()].end_day <= entry.start_day);
            }
        }
        assert_eq!(by_id["d"].start_day, 4);
        assert_eq!(result.critical_path_service_ids, vec!["a", "b", "d"]);
    }

    #[test]
    fn test_calendar_skips_non_working_days() {
        let mut plan = plan(&["window"], &[]);
        plan.calendar = WorkCalendar {
            non_working_weekdays: vec![Weekday::Sat, Weekday::Sun],
        };
        let result = CriticalPathScheduler::new()
            .schedule(&hours(&[("window", 48.0)]), &plan)
            .unwrap();
        // 周一开工，6 个工作日，完工日（开区间）为下周二
        assert_eq!(result.total_duration_days, 6);
        assert_eq!(result.project_end, date(2026, 11, 10));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let scheduler = CriticalPathScheduler::new();
        let mut p = plan(&["window"], &[]);
        assert_eq!(
            scheduler.schedule(&[], &p).unwrap_err(),
            ScheduleError::MissingDuration("window".to_string())
        );
        p.daily_capacity_hours = 0.0;
        assert!(matches!(
            scheduler.schedule(&hours(&[("window", 8.0)]), &p),
            Err(ScheduleError::InvalidCapacity(_))
        ));
        let empty = plan(&[], &[]);
        assert_eq!(
            scheduler.schedule(&[], &empty).unwrap_err(),
            ScheduleError::EmptyPlan
        );
    }
}
