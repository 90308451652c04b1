// ==========================================
// 服务排期引擎 - 引擎层事件发布
// ==========================================
// 职责: 定义排期事件发布 trait，实现依赖倒置
// 说明: 报价/成本等协作方实现发布者，引擎不感知其存在
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;
use std::sync::Mutex;
use uuid::Uuid;

// ==========================================
// 排期事件类型
// ==========================================

/// 排期事件触发类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimelineEventType {
    /// 完整求解
    Solved,
    /// 人工覆写工期
    DurationOverridden,
    /// 清除覆写
    OverrideCleared,
}

impl TimelineEventType {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            TimelineEventType::Solved => "Solved",
            TimelineEventType::DurationOverridden => "DurationOverridden",
            TimelineEventType::OverrideCleared => "OverrideCleared",
        }
    }
}

/// 排期事件
///
/// 只携带摘要；需要完整结果的订阅方应持有 Timeline 本身
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// 会话 ID（同一会话内的求解与覆写共享）
    pub session_id: Uuid,
    pub event_type: TimelineEventType,
    /// 涉及的服务（覆写类事件）
    pub service_id: Option<String>,
    pub total_duration_days: i64,
    /// 总工时（报价协作方按此重新计价）
    pub total_hours: f64,
}

impl TimelineEvent {
    pub fn new(
        session_id: Uuid,
        event_type: TimelineEventType,
        service_id: Option<String>,
        total_duration_days: i64,
        total_hours: f64,
    ) -> Self {
        Self {
            session_id,
            event_type,
            service_id,
            total_duration_days,
            total_hours,
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 排期事件发布者 Trait
///
/// # 返回
/// - `Ok(task_id)`: 任务 ID（如果支持）或空字符串
/// - `Err`: 发布失败（调用方只记录日志，不影响排期结果）
pub trait TimelineEventPublisher: Send + Sync {
    fn publish(&self, event: TimelineEvent) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl TimelineEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: TimelineEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - session_id={}, event_type={}",
            event.session_id,
            event.event_type.as_str()
        );
        Ok(String::new())
    }
}

/// 记录型事件发布者（进程内订阅 / 测试断言）
#[derive(Debug, Default)]
pub struct RecordingEventPublisher {
    events: Mutex<Vec<TimelineEvent>>,
}

impl RecordingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已发布事件的快照
    pub fn events(&self) -> Vec<TimelineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl TimelineEventPublisher for RecordingEventPublisher {
    fn publish(&self, event: TimelineEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        let mut events = self
            .events
            .lock()
            .map_err(|e| format!("事件记录锁中毒: {}", e))?;
        events.push(event);
        Ok(events.len().to_string())
    }
}

/// 可选的事件发布者包装
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn TimelineEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn with_publisher(publisher: Arc<dyn TimelineEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）
    pub fn publish(&self, event: TimelineEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        match &self.inner {
            Some(publisher) => publisher.publish(event),
            None => {
                tracing::debug!(
                    "OptionalEventPublisher: 未配置发布者，跳过事件 - session_id={}, event_type={}",
                    event.session_id,
                    event.event_type.as_str()
                );
                Ok(String::new())
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}
