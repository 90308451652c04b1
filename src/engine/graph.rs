// ==========================================
// 服务排期引擎 - 通用图算法
// ==========================================
// 稳定拓扑排序 (Kahn + 优先级堆) / 环检测 (DFS 三色标记)
// 关系表由服务目录声明，这里不感知任何具体服务
// ==========================================

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

/// 有向边 (from -> to)，from 必须先于 to
pub type Edge = (String, String);

/// 图中存在环
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleDetected {
    /// 未能排序的节点（按排序键升序）
    pub members: Vec<String>,
}

/// 稳定拓扑排序
///
/// # 参数
/// - `nodes`: 节点列表
/// - `edges`: 有向边；端点不在 nodes 中的边被忽略
/// - `sort_key`: 平局裁决键，越小越靠前
///
/// # 返回
/// - Ok(order): 每个节点都排在其全部前驱之后
/// - Err(CycleDetected): 存在环
pub fn stable_topological_order<K, F>(
    nodes: &[String],
    edges: &[Edge],
    sort_key: F,
) -> Result<Vec<String>, CycleDetected>
where
    K: Ord + Clone,
    F: Fn(&str) -> K,
{
    let node_set: BTreeSet<&str> = nodes.iter().map(|n| n.as_str()).collect();

    let mut in_degree: BTreeMap<&str, usize> = node_set.iter().map(|n| (*n, 0)).collect();
    let mut adjacency: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for (from, to) in edges {
        let (from, to) = (from.as_str(), to.as_str());
        if !node_set.contains(from) || !node_set.contains(to) {
            continue;
        }
        // 重复边只计一次入度
        if adjacency.entry(from).or_default().insert(to) {
            if let Some(deg) = in_degree.get_mut(to) {
                *deg += 1;
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<(K, &str)>> = in_degree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(node, _)| Reverse((sort_key(node), *node)))
        .collect();

    let mut order = Vec::with_capacity(node_set.len());
    while let Some(Reverse((_, node))) = ready.pop() {
        order.push(node.to_string());
        if let Some(successors) = adjacency.get(node) {
            for succ in successors {
                if let Some(deg) = in_degree.get_mut(succ) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.push(Reverse((sort_key(succ), *succ)));
                    }
                }
            }
        }
    }

    if order.len() != node_set.len() {
        let placed: BTreeSet<&str> = order.iter().map(|n| n.as_str()).collect();
        let mut members: Vec<&str> = node_set.difference(&placed).copied().collect();
        members.sort_by_key(|n| (sort_key(n), n.to_string()));
        return Err(CycleDetected {
            members: members.into_iter().map(|n| n.to_string()).collect(),
        });
    }

    Ok(order)
}

/// 查找一个环
///
/// # 返回
/// - Some(path): 环上节点，首尾相同（如 [a, b, a]）
/// - None: 无环
pub fn find_cycle(nodes: &[String], edges: &[Edge]) -> Option<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        White,
        Gray,
        Black,
    }

    let mut adjacency: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (from, to) in edges {
        adjacency.entry(from.as_str()).or_default().push(to.as_str());
    }
    for targets in adjacency.values_mut() {
        targets.sort_unstable();
        targets.dedup();
    }

    let mut marks: BTreeMap<&str, Mark> = nodes.iter().map(|n| (n.as_str(), Mark::White)).collect();

    fn visit<'a>(
        node: &'a str,
        adjacency: &BTreeMap<&'a str, Vec<&'a str>>,
        marks: &mut BTreeMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        marks.insert(node, Mark::Gray);
        stack.push(node);

        if let Some(targets) = adjacency.get(node) {
            for next in targets {
                match marks.get(next).copied().unwrap_or(Mark::White) {
                    Mark::Gray => {
                        let start = stack.iter().position(|n| n == next).unwrap_or(0);
                        let mut cycle: Vec<String> =
                            stack[start..].iter().map(|n| n.to_string()).collect();
                        cycle.push(next.to_string());
                        return Some(cycle);
                    }
                    Mark::White => {
                        if let Some(cycle) = visit(next, adjacency, marks, stack) {
                            return Some(cycle);
                        }
                    }
                    Mark::Black => {}
                }
            }
        }

        stack.pop();
        marks.insert(node, Mark::Black);
        None
    }

    let roots: Vec<&str> = marks.keys().copied().collect();
    for root in roots {
        if marks.get(root).copied() == Some(Mark::White) {
            let mut stack = Vec::new();
            if let Some(cycle) = visit(root, &adjacency, &mut marks, &mut stack) {
                return Some(cycle);
            }
        }
    }
    None
}
