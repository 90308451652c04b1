// ==========================================
// 服务排期引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: JSON 文件 (key -> value 字符串)，文件不存在时全部取默认值
// ==========================================

use crate::config::engine_config_trait::EngineConfigReader;
use async_trait::async_trait;
use chrono::Weekday;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    path: Option<PathBuf>,
    values: Arc<Mutex<BTreeMap<String, String>>>,
}

impl ConfigManager {
    /// 从配置文件创建（文件不存在视为空配置）
    ///
    /// # 参数
    /// - path: 配置文件路径
    pub fn new(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str::<BTreeMap<String, String>>(&raw)?
            }
        } else {
            BTreeMap::new()
        };

        info!(path = %path.display(), key_count = values.len(), "配置加载完成");
        Ok(Self {
            path: Some(path),
            values: Arc::new(Mutex::new(values)),
        })
    }

    /// 纯内存配置（不落盘）
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// 默认配置文件路径: <config_dir>/service-schedule/config.json
    pub fn default_path() -> PathBuf {
        match dirs::config_dir() {
            Some(dir) => dir.join("service-schedule").join("config.json"),
            None => PathBuf::from("./service-schedule.config.json"),
        }
    }

    /// 读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let values = self.values.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        Ok(values.get(key).cloned())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入配置值（有文件路径时立即落盘）
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        {
            let mut values = self.values.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            values.insert(key.to_string(), value.to_string());
        }
        debug!(key, value, "配置已更新");
        self.save()
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let values = self.values.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        Ok(serde_json::to_string(&*values)?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> ConfigResult<usize> {
        let snapshot: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;
        let count = snapshot.len();
        {
            let mut values = self.values.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            values.extend(snapshot);
        }
        self.save()?;
        Ok(count)
    }

    fn save(&self) -> ConfigResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = {
            let values = self.values.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            serde_json::to_string_pretty(&*values)?
        };
        std::fs::write(path, raw)?;
        Ok(())
    }

    fn get_f64(&self, key: &str, default: f64) -> ConfigResult<f64> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        value
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("配置项 {} 不是数值: {} ({})", key, value, e).into())
    }

    fn get_u32(&self, key: &str, default: u32) -> ConfigResult<u32> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        value
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("配置项 {} 不是整数: {} ({})", key, value, e).into())
    }
}

// ==========================================
// EngineConfigReader 实现
// ==========================================
#[async_trait]
impl EngineConfigReader for ConfigManager {
    async fn get_daily_capacity_hours(&self) -> ConfigResult<f64> {
        self.get_f64(config_keys::DAILY_CAPACITY_HOURS, 8.0)
    }

    async fn get_weather_timeout_ms(&self) -> ConfigResult<u64> {
        let value = self.get_config_or_default(config_keys::WEATHER_TIMEOUT_MS, "3000")?;
        Ok(value
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("配置项 {} 不是整数: {} ({})", config_keys::WEATHER_TIMEOUT_MS, value, e))?)
    }

    async fn get_forecast_horizon_days(&self) -> ConfigResult<u32> {
        self.get_u32(config_keys::FORECAST_HORIZON_DAYS, 14)
    }

    async fn get_forecast_window_days(&self) -> ConfigResult<u32> {
        self.get_u32(config_keys::FORECAST_WINDOW_DAYS, 7)
    }

    async fn get_forecast_weight(&self) -> ConfigResult<f64> {
        self.get_f64(config_keys::FORECAST_WEIGHT, 0.7)
    }

    async fn get_sensitivity_coefficient(&self) -> ConfigResult<f64> {
        self.get_f64(config_keys::SENSITIVITY_COEFFICIENT, 0.5)
    }

    async fn get_default_risk(&self) -> ConfigResult<f64> {
        self.get_f64(config_keys::DEFAULT_RISK, 0.3)
    }

    async fn get_non_working_weekdays(&self) -> ConfigResult<Vec<Weekday>> {
        // 格式: 逗号分隔，如 "Sat,Sun"
        let value = self.get_config_or_default(config_keys::NON_WORKING_WEEKDAYS, "")?;
        let mut days = Vec::new();
        for part in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let day = part
                .parse::<Weekday>()
                .map_err(|_| format!("配置项 {} 含非法星期: {}", config_keys::NON_WORKING_WEEKDAYS, part))?;
            if !days.contains(&day) {
                days.push(day);
            }
        }
        Ok(days)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 产能
    pub const DAILY_CAPACITY_HOURS: &str = "daily_capacity_hours";
    pub const NON_WORKING_WEEKDAYS: &str = "non_working_weekdays";

    // 天气数据源
    pub const WEATHER_TIMEOUT_MS: &str = "weather_timeout_ms";
    pub const FORECAST_HORIZON_DAYS: &str = "forecast_horizon_days";
    pub const FORECAST_WINDOW_DAYS: &str = "forecast_window_days";

    // 风险模型
    pub const FORECAST_WEIGHT: &str = "forecast_weight";
    pub const SENSITIVITY_COEFFICIENT: &str = "sensitivity_coefficient";
    pub const DEFAULT_RISK: &str = "default_risk";
}
