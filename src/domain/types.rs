// ==========================================
// 服务排期引擎 - 领域类型定义
// ==========================================
// 计量单位 / 难度等级 / 置信度 / 天气风险等级
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 计量单位 (Unit)
// ==========================================
// 决定工期估算时读取哪一项测量值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Unit {
    Area,      // 立面面积 (平方英尺)
    GlassArea, // 玻璃面积 (平方英尺)
    Count,     // 离散数量 (窗框、排水口等)
    Fixed,     // 按次计 (数量恒为 1)
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Area => write!(f, "AREA"),
            Unit::GlassArea => write!(f, "GLASS_AREA"),
            Unit::Count => write!(f, "COUNT"),
            Unit::Fixed => write!(f, "FIXED"),
        }
    }
}

// ==========================================
// 施工难度 (Difficulty)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Low,
    Medium,
    High,
}

impl Difficulty {
    /// 难度系数（固定三档查表）
    pub fn multiplier(&self) -> f64 {
        match self {
            Difficulty::Low => 1.0,
            Difficulty::Medium => 1.15,
            Difficulty::High => 1.35,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Low => write!(f, "LOW"),
            Difficulty::Medium => write!(f, "MEDIUM"),
            Difficulty::High => write!(f, "HIGH"),
        }
    }
}

// ==========================================
// 估算置信度 (Confidence)
// ==========================================
// 顺序: Low < Medium < High，合并时取最小值
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "LOW"),
            Confidence::Medium => write!(f, "MEDIUM"),
            Confidence::High => write!(f, "HIGH"),
        }
    }
}

// ==========================================
// 天气风险等级 (Weather Risk Level)
// ==========================================
// 顺序: Low < Medium < High
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// 单日风险分值
    pub fn score(&self) -> f64 {
        match self {
            RiskLevel::Low => 0.0,
            RiskLevel::Medium => 0.5,
            RiskLevel::High => 1.0,
        }
    }

    /// 由月度风险比例划分等级
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 0.2 {
            RiskLevel::Low
        } else if ratio < 0.4 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

// ==========================================
// 天气数据来源 (Weather Source)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherSource {
    Live,           // 历史 + 预报均可用
    HistoricalOnly, // 仅历史常年值
    ForecastOnly,   // 仅预报
    Default,        // 数据源不可用，使用固定默认风险
}

impl fmt::Display for WeatherSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherSource::Live => write!(f, "LIVE"),
            WeatherSource::HistoricalOnly => write!(f, "HISTORICAL_ONLY"),
            WeatherSource::ForecastOnly => write!(f, "FORECAST_ONLY"),
            WeatherSource::Default => write!(f, "DEFAULT"),
        }
    }
}
