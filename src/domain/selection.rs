// ==========================================
// 服务排期引擎 - 选择集与测量输入
// ==========================================
// SelectedServiceSet: 仅由依赖校验器创建，选择变更时整体替换
// Measurement / BuildingProfile: 外部协作方提供的原始输入（不可信）
// ==========================================

use crate::domain::types::Unit;
use serde::{Deserialize, Serialize};

// ==========================================
// SelectedServiceSet - 已选服务集
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedServiceSet {
    /// 用户选择的服务（保持用户顺序，已去重）
    pub requested: Vec<String>,
    /// 校验器自动补齐的服务
    pub auto_added: Vec<String>,
}

impl SelectedServiceSet {
    pub(crate) fn new(requested: Vec<String>, auto_added: Vec<String>) -> Self {
        Self {
            requested,
            auto_added,
        }
    }

    /// 全部服务ID（用户选择在前，自动补齐在后）
    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.requested.iter().chain(self.auto_added.iter())
    }

    pub fn contains(&self, service_id: &str) -> bool {
        self.ids().any(|id| id == service_id)
    }

    pub fn len(&self) -> usize {
        self.requested.len() + self.auto_added.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_auto_added(&self, service_id: &str) -> bool {
        self.auto_added.iter().any(|id| id == service_id)
    }
}

// ==========================================
// Measurement - 单个服务的测量值
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    #[serde(default)]
    pub area_sqft: Option<f64>,
    #[serde(default)]
    pub glass_area_sqft: Option<f64>,
    #[serde(default)]
    pub count: Option<u32>,
}

impl Measurement {
    pub fn area(sqft: f64) -> Self {
        Self {
            area_sqft: Some(sqft),
            ..Self::default()
        }
    }

    pub fn glass_area(sqft: f64) -> Self {
        Self {
            glass_area_sqft: Some(sqft),
            ..Self::default()
        }
    }

    pub fn count(count: u32) -> Self {
        Self {
            count: Some(count),
            ..Self::default()
        }
    }

    /// 按计量单位取数量
    ///
    /// # 返回
    /// - Some(q): q > 0
    /// - None: 测量缺失或为 0
    pub fn quantity_for(&self, unit: Unit) -> Option<f64> {
        let raw = match unit {
            Unit::Area => self.area_sqft,
            Unit::GlassArea => self.glass_area_sqft,
            Unit::Count => self.count.map(f64::from),
            Unit::Fixed => Some(1.0),
        };
        raw.filter(|q| *q > 0.0)
    }
}

// ==========================================
// BuildingProfile - 建筑属性
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingProfile {
    #[serde(default)]
    pub stories: Option<u32>,
    #[serde(default)]
    pub height_ft: Option<f64>,
}

/// 单层等效高度（英尺）
pub const FEET_PER_STORY: f64 = 10.0;

/// 建筑高度缺失时假定的层数
pub const ASSUMED_STORIES: u32 = 2;

impl BuildingProfile {
    pub fn with_stories(stories: u32) -> Self {
        Self {
            stories: Some(stories),
            height_ft: None,
        }
    }

    /// 等效层数
    ///
    /// # 返回
    /// (层数, 是否为假定值)
    pub fn story_equivalent(&self) -> (u32, bool) {
        if let Some(stories) = self.stories.filter(|s| *s > 0) {
            return (stories, false);
        }
        if let Some(feet) = self.height_ft.filter(|h| *h > 0.0) {
            let stories = (feet / FEET_PER_STORY).ceil().max(1.0) as u32;
            return (stories, false);
        }
        (ASSUMED_STORIES, true)
    }
}
