// ==========================================
// 服务排期引擎 - 核心库
// ==========================================
// 范围: 服务依赖校验 / 工期估算 / 天气风险 / 关键路径排期 / 人工覆写
// 系统定位: 决策支持（人工覆写拥有最终控制权）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 服务目录 - 静态规则表
pub mod catalog;

// 天气数据源
pub mod weather;

// 引擎层 - 纯计算
pub mod engine;

// 配置层 - 引擎参数
pub mod config;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 会话级接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Confidence, Difficulty, RiskLevel, Unit, WeatherSource};

// 领域实体
pub use domain::{
    BuildingProfile, Measurement, ScheduleEntry, SelectedServiceSet, ServiceDefinition,
    ServiceDuration, Timeline, WeatherAnalysis,
};

// 目录
pub use catalog::{CatalogError, ServiceCatalog};

// 引擎
pub use engine::{
    CriticalPathScheduler, DependencyValidator, DurationEstimator, OverrideController,
    ScheduleOrchestrator, SolveInput, WeatherRiskModel,
};

// API
pub use api::{ApiError, ApiResult, ScheduleApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "服务排期引擎";
