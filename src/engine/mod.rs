// ==========================================
// 服务排期引擎 - 引擎层
// ==========================================
// 流程: 依赖校验 -> 工期估算 -> 天气风险 -> 关键路径排期
//       (循环: 人工覆写 -> 关键路径排期)
// 红线: 引擎只做纯计算，唯一的 I/O 是天气数据拉取
// ==========================================

pub mod critical_path;
pub mod dependency;
pub mod duration;
pub mod events;
pub mod graph;
pub mod orchestrator;
pub mod override_ctl;
pub mod weather_risk;

// 重导出核心引擎
pub use critical_path::{
    CriticalPathScheduler, ScheduleError, ScheduledTimeline, MAX_SERVICE_DAYS, MAX_SERVICE_HOURS,
};
pub use dependency::{DependencyValidator, IssueCode, ValidationIssue, ValidationOutcome};
pub use duration::{DurationEstimator, Estimate};
pub use events::{
    NoOpEventPublisher, OptionalEventPublisher, RecordingEventPublisher, TimelineEvent,
    TimelineEventPublisher, TimelineEventType,
};
pub use orchestrator::{DurationOverride, ScheduleOrchestrator, SolveError, SolveInput};
pub use override_ctl::{OverrideController, OverrideError};
pub use weather_risk::{recommend_start_date, WeatherRiskModel, WeatherRiskSettings};
