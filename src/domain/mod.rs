// ==========================================
// 服务排期引擎 - 领域层
// ==========================================
// 职责: 实体与值类型定义，不含业务规则
// ==========================================

pub mod duration;
pub mod schedule;
pub mod selection;
pub mod service;
pub mod types;
pub mod weather;

// 重导出核心实体
pub use duration::ServiceDuration;
pub use schedule::{ScheduleEntry, SchedulePlan, Timeline, WorkCalendar};
pub use selection::{BuildingProfile, Measurement, SelectedServiceSet};
pub use service::ServiceDefinition;
pub use types::{Confidence, Difficulty, RiskLevel, Unit, WeatherSource};
pub use weather::{
    ClimateProfile, DailyForecast, ForecastDay, HistoricalRisk, MonthlyClimate, WeatherAnalysis,
};
