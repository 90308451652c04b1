// ==========================================
// 服务排期引擎 - 服务定义 (目录条目)
// ==========================================
// 职责: 服务目录中的静态参考数据，加载后只读
// ==========================================

use crate::domain::types::Unit;
use serde::{Deserialize, Serialize};

// ==========================================
// ServiceDefinition - 服务定义
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDefinition {
    pub id: String,
    pub display_name: String,
    pub unit: Unit,
    /// 每单位工时（Fixed 单位为每次工时）
    pub base_rate_per_unit: f64,
    pub weather_sensitive: bool,
    /// 优先级数值，越小越靠前（拓扑排序平局裁决）
    pub priority: u32,

    // ===== 关系表 =====
    /// 必须同时存在的服务
    #[serde(default)]
    pub requires: Vec<String>,
    /// 本服务必须先于这些服务执行
    #[serde(default)]
    pub must_precede: Vec<String>,
    /// 本服务必须在这些服务之后执行
    #[serde(default)]
    pub must_follow: Vec<String>,
    /// 这些服务存在时，禁止移除本服务
    #[serde(default)]
    pub removal_blocked_by: Vec<String>,
    /// 不可同时选择的服务
    #[serde(default)]
    pub excludes: Vec<String>,

    // ===== 估算参数 =====
    /// 保守下限工时（测量缺失时的兜底基准）
    pub minimum_hours: f64,
    /// 测量缺失时能否按下限兜底
    #[serde(default = "default_true")]
    pub defaultable: bool,
}

fn default_true() -> bool {
    true
}

impl ServiceDefinition {
    /// 本服务相关的全部前驱约束 (before -> self)
    pub fn predecessors(&self) -> impl Iterator<Item = &String> {
        self.must_follow.iter()
    }

    /// 本服务相关的全部后继约束 (self -> after)
    pub fn successors(&self) -> impl Iterator<Item = &String> {
        self.must_precede.iter()
    }

    /// 全部被引用的服务ID（用于目录加载时的引用完整性检查）
    pub fn referenced_ids(&self) -> impl Iterator<Item = &String> {
        self.requires
            .iter()
            .chain(self.must_precede.iter())
            .chain(self.must_follow.iter())
            .chain(self.removal_blocked_by.iter())
            .chain(self.excludes.iter())
    }
}
