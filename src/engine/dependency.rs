// ==========================================
// 服务排期引擎 - 依赖校验器
// ==========================================
// 职责: 依赖闭包补齐 / 移除拦截 / 互斥检查 / 稳定拓扑排序
// 输入: 用户请求的服务ID (+ 上一次的已选服务集)
// 输出: ValidationOutcome {validated_set, auto_added, order, errors, warnings}
// 红线: 依赖完整性只允许 "补齐"，不允许 "静默移除"
// ==========================================

use crate::catalog::ServiceCatalog;
use crate::domain::selection::SelectedServiceSet;
use crate::engine::graph::stable_topological_order;
use crate::i18n::t_with_args;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

// ==========================================
// 校验问题
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    // 错误
    EmptySelection,
    UnknownService,
    RemovalBlocked,
    MutuallyExclusive,
    DependencyCycle,
    // 警告
    DuplicateRequest,
    AutoAdded,
}

impl IssueCode {
    fn message_key(&self) -> &'static str {
        match self {
            IssueCode::EmptySelection => "validation.empty_selection",
            IssueCode::UnknownService => "validation.unknown_service",
            IssueCode::RemovalBlocked => "validation.removal_blocked",
            IssueCode::MutuallyExclusive => "validation.mutually_exclusive",
            IssueCode::DependencyCycle => "validation.dependency_cycle",
            IssueCode::DuplicateRequest => "validation.duplicate_request",
            IssueCode::AutoAdded => "validation.auto_added",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssueCode::EmptySelection => "EMPTY_SELECTION",
            IssueCode::UnknownService => "UNKNOWN_SERVICE",
            IssueCode::RemovalBlocked => "REMOVAL_BLOCKED",
            IssueCode::MutuallyExclusive => "MUTUALLY_EXCLUSIVE",
            IssueCode::DependencyCycle => "DEPENDENCY_CYCLE",
            IssueCode::DuplicateRequest => "DUPLICATE_REQUEST",
            IssueCode::AutoAdded => "AUTO_ADDED",
        };
        write!(f, "{}", s)
    }
}

/// 结构化校验问题（UI 据此渲染字段级提示）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub code: IssueCode,
    pub service_id: Option<String>,
    pub related_service_id: Option<String>,
    pub message: String,
}

impl ValidationIssue {
    fn new(code: IssueCode, service_id: Option<&str>, related: Option<&str>) -> Self {
        let message = t_with_args(
            code.message_key(),
            &[
                ("service", service_id.unwrap_or("")),
                ("related", related.unwrap_or("")),
            ],
        );
        Self {
            code,
            service_id: service_id.map(|s| s.to_string()),
            related_service_id: related.map(|s| s.to_string()),
            message,
        }
    }
}

// ==========================================
// ValidationOutcome - 校验结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub validated_set: SelectedServiceSet,
    pub auto_added: Vec<String>,
    /// 执行顺序；存在环时为空
    pub order: Vec<String>,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationOutcome {
    /// 无错误时才允许进入下一步
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_error(&self, code: IssueCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    pub fn has_warning(&self, code: IssueCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}

// ==========================================
// DependencyValidator - 依赖校验器
// ==========================================
pub struct DependencyValidator {
    catalog: Arc<ServiceCatalog>,
}

impl DependencyValidator {
    pub fn new(catalog: Arc<ServiceCatalog>) -> Self {
        Self { catalog }
    }

    /// 校验一次全新的服务选择
    pub fn validate(&self, requested: &[String]) -> ValidationOutcome {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let known = self.normalize_request(requested, &mut errors, &mut warnings);
        self.complete(known, errors, warnings)
    }

    /// 校验选择变更（整体替换语义）
    ///
    /// 上一次用户选择、但本次请求中缺失的服务视为 "移除"；
    /// 若仍有已选服务依赖它，拒绝本次变更并原样返回上一次的服务集
    pub fn validate_change(
        &self,
        previous: &SelectedServiceSet,
        requested: &[String],
    ) -> ValidationOutcome {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let known = self.normalize_request(requested, &mut errors, &mut warnings);

        let removed: Vec<String> = previous
            .requested
            .iter()
            .filter(|id| !known.contains(id))
            .cloned()
            .collect();

        let remaining = self.closure(&known).0;
        let blocked = self.blocked_removals(&removed, &remaining);
        if !blocked.is_empty() {
            return self.reject(previous, blocked);
        }

        self.complete(known, errors, warnings)
    }

    /// 显式移除服务（包括自动补齐的服务）
    pub fn remove(&self, previous: &SelectedServiceSet, to_remove: &[String]) -> ValidationOutcome {
        let remove_set: BTreeSet<&str> = to_remove.iter().map(|s| s.trim()).collect();
        let remaining: BTreeSet<String> = previous
            .ids()
            .filter(|id| !remove_set.contains(id.as_str()))
            .cloned()
            .collect();

        let removed: Vec<String> = previous
            .ids()
            .filter(|id| remove_set.contains(id.as_str()))
            .cloned()
            .collect();

        let blocked = self.blocked_removals(&removed, &remaining);
        if !blocked.is_empty() {
            return self.reject(previous, blocked);
        }

        let kept: Vec<String> = previous
            .requested
            .iter()
            .filter(|id| !remove_set.contains(id.as_str()))
            .cloned()
            .collect();
        self.complete(kept, Vec::new(), Vec::new())
    }

    // ==========================================
    // 内部步骤
    // ==========================================

    /// 去重 + 未知服务过滤
    fn normalize_request(
        &self,
        requested: &[String],
        errors: &mut Vec<ValidationIssue>,
        warnings: &mut Vec<ValidationIssue>,
    ) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut known = Vec::new();
        for raw in requested {
            let id = raw.trim();
            if !seen.insert(id.to_string()) {
                warnings.push(ValidationIssue::new(IssueCode::DuplicateRequest, Some(id), None));
                continue;
            }
            if self.catalog.contains(id) {
                known.push(id.to_string());
            } else {
                errors.push(ValidationIssue::new(IssueCode::UnknownService, Some(id), None));
            }
        }
        known
    }

    /// requires 闭包
    ///
    /// # 返回
    /// (闭包集合, 自动补齐列表[(服务, 被谁依赖)])，自动补齐按目录优先级排序
    fn closure(&self, seeds: &[String]) -> (BTreeSet<String>, Vec<(String, String)>) {
        let mut selected: BTreeSet<String> = seeds.iter().cloned().collect();
        let mut added = Vec::new();

        let mut queue: VecDeque<String> = seeds.iter().cloned().collect();
        // 目录规模有限，补齐必然在有限步内到达不动点
        while let Some(id) = queue.pop_front() {
            let Some(def) = self.catalog.get(&id) else {
                continue;
            };
            let mut required: Vec<&String> = def.requires.iter().collect();
            required.sort_by_key(|r| self.catalog.rank(r));
            for req in required {
                if selected.insert(req.clone()) {
                    added.push((req.clone(), id.clone()));
                    queue.push_back(req.clone());
                }
            }
        }

        added.sort_by_key(|(id, _)| self.catalog.rank(id));
        (selected, added)
    }

    /// 被拦截的移除: (被移除服务, 阻止者)
    fn blocked_removals(
        &self,
        removed: &[String],
        remaining: &BTreeSet<String>,
    ) -> Vec<(String, String)> {
        let mut blocked = Vec::new();
        for id in removed {
            if let Some(blocker) = self.catalog.removal_blockers(id, remaining).first() {
                blocked.push((id.clone(), blocker.to_string()));
            }
        }
        blocked
    }

    fn reject(
        &self,
        previous: &SelectedServiceSet,
        blocked: Vec<(String, String)>,
    ) -> ValidationOutcome {
        let errors: Vec<ValidationIssue> = blocked
            .iter()
            .map(|(id, blocker)| {
                ValidationIssue::new(IssueCode::RemovalBlocked, Some(id.as_str()), Some(blocker.as_str()))
            })
            .collect();

        warn!(
            blocked = ?blocked,
            "移除被拦截: 仍有已选服务依赖被移除的服务"
        );

        let ids: Vec<String> = previous.ids().cloned().collect();
        let selected: BTreeSet<String> = ids.iter().cloned().collect();
        let order = self.order(&ids, &selected).unwrap_or_default();

        ValidationOutcome {
            validated_set: previous.clone(),
            auto_added: previous.auto_added.clone(),
            order,
            errors,
            warnings: Vec::new(),
        }
    }

    /// 闭包 + 互斥 + 排序
    fn complete(
        &self,
        requested: Vec<String>,
        mut errors: Vec<ValidationIssue>,
        mut warnings: Vec<ValidationIssue>,
    ) -> ValidationOutcome {
        let (selected, added) = self.closure(&requested);

        for (id, required_by) in &added {
            warnings.push(ValidationIssue::new(
                IssueCode::AutoAdded,
                Some(id.as_str()),
                Some(required_by.as_str()),
            ));
        }
        let auto_added: Vec<String> = added.into_iter().map(|(id, _)| id).collect();

        errors.extend(self.exclusion_conflicts(&selected));

        if selected.is_empty() {
            errors.push(ValidationIssue::new(IssueCode::EmptySelection, None, None));
        }

        let ids: Vec<String> = requested.iter().chain(auto_added.iter()).cloned().collect();
        let order = match self.order(&ids, &selected) {
            Ok(order) => order,
            Err(members) => {
                let first = members.first().map(|s| s.as_str());
                let last = members.last().map(|s| s.as_str());
                errors.push(ValidationIssue::new(IssueCode::DependencyCycle, first, last));
                Vec::new()
            }
        };

        info!(
            requested_count = requested.len(),
            auto_added_count = auto_added.len(),
            error_count = errors.len(),
            warning_count = warnings.len(),
            "服务依赖校验完成"
        );

        ValidationOutcome {
            validated_set: SelectedServiceSet::new(requested, auto_added.clone()),
            auto_added,
            order,
            errors,
            warnings,
        }
    }

    fn exclusion_conflicts(&self, selected: &BTreeSet<String>) -> Vec<ValidationIssue> {
        let mut pairs: BTreeSet<(usize, String, String)> = BTreeSet::new();
        for id in selected {
            let Some(def) = self.catalog.get(id) else {
                continue;
            };
            for other in def.excludes.iter().filter(|o| selected.contains(*o)) {
                // 对称关系只报一次，排名靠前者为主
                let (a, b) = if self.catalog.rank(id) <= self.catalog.rank(other) {
                    (id.clone(), other.clone())
                } else {
                    (other.clone(), id.clone())
                };
                pairs.insert((self.catalog.rank(&a), a, b));
            }
        }
        pairs
            .into_iter()
            .map(|(_, a, b)| ValidationIssue::new(IssueCode::MutuallyExclusive, Some(a.as_str()), Some(b.as_str())))
            .collect()
    }

    /// 限定子集上的稳定拓扑排序
    fn order(&self, ids: &[String], selected: &BTreeSet<String>) -> Result<Vec<String>, Vec<String>> {
        let edges = self.catalog.precedence_edges_within(selected);
        debug!(node_count = ids.len(), edge_count = edges.len(), "计算执行顺序");
        stable_topological_order(ids, &edges, |id| (self.catalog.rank(id), id.to_string()))
            .map_err(|cycle| cycle.members)
    }
}
