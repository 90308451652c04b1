// ==========================================
// 服务排期引擎 - 服务目录错误
// ==========================================
// 目录缺陷属于数据编写错误，加载即失败，不在单次请求内恢复
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("服务ID重复: {0}")]
    DuplicateId(String),

    #[error("服务ID为空")]
    EmptyId,

    #[error("未知服务引用: {service_id}.{relation} -> {target}")]
    UnknownReference {
        service_id: String,
        relation: &'static str,
        target: String,
    },

    #[error("{relation} 关系存在环: {}", .cycle.join(" -> "))]
    CyclicDependency {
        relation: &'static str,
        cycle: Vec<String>,
    },

    #[error("服务参数非法: {service_id} - {reason}")]
    InvalidDefinition { service_id: String, reason: String },

    #[error("目录解析失败: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("目录文件读取失败: {0}")]
    Io(#[from] std::io::Error),
}
