// ==========================================
// 服务排期引擎 - 排期 API
// ==========================================
// 职责: 服务选择校验、求解、人工覆写、推荐开工日
// 生命周期: 每个用户会话一个实例（会话ID随事件发布）
// ==========================================

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::SolveInputValidator;
use crate::catalog::ServiceCatalog;
use crate::config::{EngineConfig, EngineConfigReader};
use crate::domain::schedule::Timeline;
use crate::domain::selection::SelectedServiceSet;
use crate::engine::dependency::ValidationOutcome;
use crate::engine::events::{
    OptionalEventPublisher, TimelineEvent, TimelineEventPublisher, TimelineEventType,
};
use crate::engine::orchestrator::{ScheduleOrchestrator, SolveInput};
use crate::engine::override_ctl::OverrideController;
use crate::weather::WeatherProvider;

// ==========================================
// ScheduleApi - 排期 API
// ==========================================

/// 排期API
///
/// 职责：
/// 1. 服务选择校验（新选择 / 变更 / 显式移除）
/// 2. 输入范围校验 + 完整求解
/// 3. 人工覆写与清除覆写（整体重排）
/// 4. 推荐开工日
pub struct ScheduleApi {
    session_id: Uuid,
    orchestrator: ScheduleOrchestrator,
    override_controller: OverrideController,
    input_validator: SolveInputValidator,
    // 事件发布器（报价/成本协作方订阅总工时变化）
    event_publisher: OptionalEventPublisher,
}

impl ScheduleApi {
    /// 创建新的ScheduleApi实例
    pub fn new(
        catalog: Arc<ServiceCatalog>,
        provider: Arc<dyn WeatherProvider>,
        config: &EngineConfig,
        event_publisher: Option<Arc<dyn TimelineEventPublisher>>,
    ) -> Self {
        let event_publisher = match event_publisher {
            Some(p) => OptionalEventPublisher::with_publisher(p),
            None => OptionalEventPublisher::none(),
        };

        let session_id = Uuid::new_v4();
        info!(session_id = %session_id, catalog_size = catalog.len(), "排期会话已创建");

        Self {
            session_id,
            orchestrator: ScheduleOrchestrator::new(catalog, provider, config),
            override_controller: OverrideController::new(),
            input_validator: SolveInputValidator::new(),
            event_publisher,
        }
    }

    /// 从配置读取器创建（配置非法时报 Config 错误）
    pub async fn from_config_reader<R>(
        catalog: Arc<ServiceCatalog>,
        provider: Arc<dyn WeatherProvider>,
        reader: &R,
        event_publisher: Option<Arc<dyn TimelineEventPublisher>>,
    ) -> ApiResult<Self>
    where
        R: EngineConfigReader + ?Sized,
    {
        let config = EngineConfig::load(reader)
            .await
            .map_err(|e| ApiError::Config(e.to_string()))?;
        Ok(Self::new(catalog, provider, &config, event_publisher))
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    // ==========================================
    // 服务选择
    // ==========================================

    /// 校验一次全新的服务选择
    ///
    /// 校验问题以结构化结果返回（errors / warnings），不作为 Err
    pub fn validate_services(&self, requested: &[String]) -> ValidationOutcome {
        self.orchestrator.validator().validate(requested)
    }

    /// 校验选择变更（请求中缺失的已选服务视为移除）
    pub fn validate_service_change(
        &self,
        previous: &SelectedServiceSet,
        requested: &[String],
    ) -> ValidationOutcome {
        self.orchestrator
            .validator()
            .validate_change(previous, requested)
    }

    /// 显式移除服务
    pub fn remove_services(
        &self,
        previous: &SelectedServiceSet,
        to_remove: &[String],
    ) -> ValidationOutcome {
        self.orchestrator.validator().remove(previous, to_remove)
    }

    // ==========================================
    // 求解
    // ==========================================

    /// 求解（以本地日期作为 "今天"）
    pub async fn solve(
        &self,
        selection: &SelectedServiceSet,
        input: &SolveInput,
    ) -> ApiResult<Timeline> {
        self.solve_as_of(selection, input, Local::now().date_naive())
            .await
    }

    /// 求解（显式给定 "今天"，用于开工日校验）
    pub async fn solve_as_of(
        &self,
        selection: &SelectedServiceSet,
        input: &SolveInput,
        today: NaiveDate,
    ) -> ApiResult<Timeline> {
        self.input_validator.validate(input, today)?;
        let timeline = self.orchestrator.solve(selection, input).await?;
        self.publish(TimelineEventType::Solved, None, &timeline);
        Ok(timeline)
    }

    // ==========================================
    // 人工覆写
    // ==========================================

    /// 覆写单个服务工期并整体重排
    ///
    /// # 返回
    /// - Ok(Timeline): 新排期（入参 Timeline 不变）
    /// - Err(InvalidOverride / UnknownService): 排期不变
    pub fn override_duration(
        &self,
        timeline: &Timeline,
        service_id: &str,
        hours: f64,
        reason: &str,
    ) -> ApiResult<Timeline> {
        let next = self
            .override_controller
            .apply(timeline, service_id, hours, reason)?;
        self.publish(
            TimelineEventType::DurationOverridden,
            Some(service_id),
            &next,
        );
        Ok(next)
    }

    /// 清除覆写
    pub fn clear_override(&self, timeline: &Timeline, service_id: &str) -> ApiResult<Timeline> {
        let next = self.override_controller.clear(timeline, service_id)?;
        self.publish(TimelineEventType::OverrideCleared, Some(service_id), &next);
        Ok(next)
    }

    // ==========================================
    // 推荐开工日
    // ==========================================

    /// 在预报窗口内寻找推荐开工日
    ///
    /// 规则: 首个低风险日 → 风险最低的一天（同分取最早）→ 候选日本身
    pub async fn recommend_start_date(
        &self,
        location: &str,
        candidate: NaiveDate,
    ) -> ApiResult<NaiveDate> {
        self.input_validator.validate_location(location)?;
        let analysis = self
            .orchestrator
            .weather_model()
            .analyze(location, &[], candidate)
            .await?;
        Ok(analysis.recommended_start_date)
    }

    fn publish(&self, event_type: TimelineEventType, service_id: Option<&str>, timeline: &Timeline) {
        let event = TimelineEvent::new(
            self.session_id,
            event_type,
            service_id.map(|s| s.to_string()),
            timeline.total_duration_days,
            timeline.total_hours(),
        );
        // 发布失败不影响排期结果
        if let Err(e) = self.event_publisher.publish(event) {
            warn!(session_id = %self.session_id, error = %e, "排期事件发布失败");
        }
    }
}
