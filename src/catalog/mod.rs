// ==========================================
// 服务排期引擎 - 服务目录
// ==========================================
// 职责: 静态参考数据 + 声明式关系表 (requires / mustPrecede / removalBlockedBy / excludes)
// 约束: 加载时完成全部完整性检查，加载后只读，经 Arc 共享
// ==========================================

pub mod builtin;
pub mod error;

pub use error::CatalogError;

use crate::domain::service::ServiceDefinition;
use crate::engine::graph::{find_cycle, Edge};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info};

// ==========================================
// ServiceCatalog - 服务目录
// ==========================================
#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    definitions: Vec<ServiceDefinition>,
    index: HashMap<String, usize>,
    /// 服务ID -> 优先级排名 (priority, 目录位置)
    ranks: HashMap<String, usize>,
    precedence: Vec<Edge>,
}

impl ServiceCatalog {
    /// 构建目录并执行完整性检查
    ///
    /// # 检查项
    /// 1. ID 非空且唯一
    /// 2. 工时参数为正
    /// 3. 关系引用的服务均存在
    /// 4. 同一服务不能既依赖又排斥同一目标
    /// 5. requires 关系无环
    /// 6. 先后顺序关系 (mustPrecede + mustFollow) 无环
    pub fn new(definitions: Vec<ServiceDefinition>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(definitions.len());
        for (pos, def) in definitions.iter().enumerate() {
            if def.id.trim().is_empty() {
                return Err(CatalogError::EmptyId);
            }
            if index.insert(def.id.clone(), pos).is_some() {
                return Err(CatalogError::DuplicateId(def.id.clone()));
            }
        }

        for def in &definitions {
            Self::check_definition(def, &index)?;
        }

        let ids: Vec<String> = definitions.iter().map(|d| d.id.clone()).collect();

        let requires_edges: Vec<Edge> = definitions
            .iter()
            .flat_map(|d| d.requires.iter().map(move |r| (d.id.clone(), r.clone())))
            .collect();
        if let Some(cycle) = find_cycle(&ids, &requires_edges) {
            return Err(CatalogError::CyclicDependency {
                relation: "requires",
                cycle,
            });
        }

        let precedence = Self::collect_precedence(&definitions);
        if let Some(cycle) = find_cycle(&ids, &precedence) {
            return Err(CatalogError::CyclicDependency {
                relation: "precedence",
                cycle,
            });
        }

        let mut by_priority: Vec<(u32, usize, &str)> = definitions
            .iter()
            .enumerate()
            .map(|(pos, d)| (d.priority, pos, d.id.as_str()))
            .collect();
        by_priority.sort();
        let ranks = by_priority
            .iter()
            .enumerate()
            .map(|(rank, (_, _, id))| (id.to_string(), rank))
            .collect();

        info!(
            service_count = definitions.len(),
            precedence_edges = precedence.len(),
            "服务目录加载完成"
        );

        Ok(Self {
            definitions,
            index,
            ranks,
            precedence,
        })
    }

    /// 内置目录
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new(builtin::definitions())
    }

    /// 从 JSON 数组解析目录
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let definitions: Vec<ServiceDefinition> = serde_json::from_str(raw)?;
        Self::new(definitions)
    }

    /// 从 JSON 文件加载目录
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "读取服务目录文件");
        Self::from_json_str(&raw)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get(&self, service_id: &str) -> Option<&ServiceDefinition> {
        self.index.get(service_id).map(|pos| &self.definitions[*pos])
    }

    pub fn contains(&self, service_id: &str) -> bool {
        self.index.contains_key(service_id)
    }

    pub fn definitions(&self) -> &[ServiceDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// 优先级排名（越小越靠前；未知服务排在最后）
    pub fn rank(&self, service_id: &str) -> usize {
        self.ranks.get(service_id).copied().unwrap_or(usize::MAX)
    }

    /// 全部先后顺序边 (before -> after)
    pub fn precedence_edges(&self) -> &[Edge] {
        &self.precedence
    }

    /// 限定在给定服务子集内的先后顺序边
    pub fn precedence_edges_within(&self, selected: &BTreeSet<String>) -> Vec<Edge> {
        self.precedence
            .iter()
            .filter(|(from, to)| selected.contains(from) && selected.contains(to))
            .cloned()
            .collect()
    }

    /// 阻止移除 target 的已选服务
    ///
    /// 来源: target.removalBlockedBy 与 "requires target" 的反向关系
    pub fn removal_blockers<'a>(
        &'a self,
        target: &str,
        selected: &'a BTreeSet<String>,
    ) -> Vec<&'a str> {
        let declared: Vec<&str> = self
            .get(target)
            .map(|d| d.removal_blocked_by.iter().map(|s| s.as_str()).collect())
            .unwrap_or_default();

        let mut blockers: Vec<&str> = selected
            .iter()
            .filter(|id| id.as_str() != target)
            .filter(|id| {
                declared.contains(&id.as_str())
                    || self
                        .get(id)
                        .map(|d| d.requires.iter().any(|r| r == target))
                        .unwrap_or(false)
            })
            .map(|id| id.as_str())
            .collect();
        blockers.sort_by_key(|id| self.rank(id));
        blockers
    }

    // ==========================================
    // 内部校验
    // ==========================================

    fn check_definition(
        def: &ServiceDefinition,
        index: &HashMap<String, usize>,
    ) -> Result<(), CatalogError> {
        if !(def.base_rate_per_unit.is_finite() && def.base_rate_per_unit > 0.0) {
            return Err(CatalogError::InvalidDefinition {
                service_id: def.id.clone(),
                reason: format!("baseRatePerUnit 必须为正数: {}", def.base_rate_per_unit),
            });
        }
        if !(def.minimum_hours.is_finite() && def.minimum_hours > 0.0) {
            return Err(CatalogError::InvalidDefinition {
                service_id: def.id.clone(),
                reason: format!("minimumHours 必须为正数: {}", def.minimum_hours),
            });
        }

        let relations: [(&'static str, &Vec<String>); 5] = [
            ("requires", &def.requires),
            ("mustPrecede", &def.must_precede),
            ("mustFollow", &def.must_follow),
            ("removalBlockedBy", &def.removal_blocked_by),
            ("excludes", &def.excludes),
        ];
        for (relation, targets) in relations {
            for target in targets {
                if !index.contains_key(target) {
                    return Err(CatalogError::UnknownReference {
                        service_id: def.id.clone(),
                        relation,
                        target: target.clone(),
                    });
                }
            }
        }

        if let Some(conflict) = def.requires.iter().find(|r| def.excludes.contains(r)) {
            return Err(CatalogError::InvalidDefinition {
                service_id: def.id.clone(),
                reason: format!("同时依赖并排斥 {}", conflict),
            });
        }

        Ok(())
    }

    fn collect_precedence(definitions: &[ServiceDefinition]) -> Vec<Edge> {
        let mut edges: BTreeSet<Edge> = BTreeSet::new();
        for def in definitions {
            for after in def.successors() {
                edges.insert((def.id.clone(), after.clone()));
            }
            for before in def.predecessors() {
                edges.insert((before.clone(), def.id.clone()));
            }
        }
        edges.into_iter().collect()
    }
}
