// ==========================================
// 服务排期引擎 - 服务工期
// ==========================================
// 每次求解为每个服务重新生成；仅 override 字段允许原地修改
// ==========================================

use crate::domain::types::Confidence;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDuration {
    pub service_id: String,
    pub base_duration_hours: f64,
    pub weather_buffer_hours: f64,
    /// base + buffer；人工覆写时为覆写值
    pub final_duration_hours: f64,
    pub confidence: Confidence,
    pub is_overridden: bool,
    /// 覆写原因（当且仅当 is_overridden 时存在）
    pub override_reason: Option<String>,
}

impl ServiceDuration {
    pub fn new(service_id: impl Into<String>, base_hours: f64, confidence: Confidence) -> Self {
        Self {
            service_id: service_id.into(),
            base_duration_hours: base_hours,
            weather_buffer_hours: 0.0,
            final_duration_hours: base_hours,
            confidence,
            is_overridden: false,
            override_reason: None,
        }
    }

    /// 叠加天气缓冲（覆写后的工期不受天气调整）
    pub fn with_weather_buffer(mut self, buffer_hours: f64) -> Self {
        self.weather_buffer_hours = buffer_hours;
        if !self.is_overridden {
            self.final_duration_hours = round_hours(self.base_duration_hours + buffer_hours);
        }
        self
    }

    /// 计算得出的工期（不含覆写）
    pub fn computed_hours(&self) -> f64 {
        round_hours(self.base_duration_hours + self.weather_buffer_hours)
    }

    pub(crate) fn apply_override(&mut self, hours: f64, reason: &str) {
        self.final_duration_hours = hours;
        self.is_overridden = true;
        self.override_reason = Some(reason.to_string());
    }

    pub(crate) fn clear_override(&mut self) {
        self.final_duration_hours = self.computed_hours();
        self.is_overridden = false;
        self.override_reason = None;
    }
}

/// 工时统一保留两位小数
pub fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}
