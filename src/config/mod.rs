// ==========================================
// 服务排期引擎 - 配置层
// ==========================================
// 职责: 引擎参数管理（日产能 / 天气超时 / 风险模型系数）
// 存储: JSON 配置文件，缺省键取默认值
// ==========================================

pub mod config_manager;
pub mod engine_config;
pub mod engine_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, ConfigResult};
pub use engine_config::EngineConfig;
pub use engine_config_trait::EngineConfigReader;
