// ==========================================
// 服务排期引擎 - 命令行入口
// ==========================================
// 用法:
//   service-schedule <request.json> [climate.csv]
//
// request.json: { "services": [...], "location": ..., "startDate": ..., ... }
// 输出: 成功时 stdout 打印 Timeline JSON；失败时打印错误体并以非零码退出
// 环境变量:
//   SERVICE_SCHEDULE_CONFIG  配置文件路径（默认 <config_dir>/service-schedule/config.json）
//   SERVICE_SCHEDULE_CATALOG 自定义服务目录 JSON（默认内置目录）
// ==========================================

use anyhow::{bail, Context};
use serde::Deserialize;
use service_schedule::api::{ApiError, ScheduleApi};
use service_schedule::catalog::ServiceCatalog;
use service_schedule::config::ConfigManager;
use service_schedule::engine::SolveInput;
use service_schedule::weather::{ClimateTable, ClimateTableProvider, UnavailableProvider, WeatherProvider};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliRequest {
    services: Vec<String>,
    #[serde(flatten)]
    input: SolveInput,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    service_schedule::logging::init();

    let mut args = std::env::args().skip(1);
    let Some(request_path) = args.next() else {
        bail!("用法: service-schedule <request.json> [climate.csv]");
    };
    let climate_path = args.next();

    tracing::info!("服务排期引擎 v{}", service_schedule::VERSION);

    let raw = std::fs::read_to_string(&request_path)
        .with_context(|| format!("无法读取请求文件: {}", request_path))?;
    let request: CliRequest =
        serde_json::from_str(&raw).with_context(|| format!("请求格式错误: {}", request_path))?;

    let catalog = match std::env::var_os("SERVICE_SCHEDULE_CATALOG") {
        Some(path) => ServiceCatalog::from_json_file(&path)
            .with_context(|| format!("服务目录加载失败: {}", PathBuf::from(&path).display()))?,
        None => ServiceCatalog::builtin().context("内置服务目录加载失败")?,
    };

    let provider: Arc<dyn WeatherProvider> = match climate_path {
        Some(path) => {
            let table = ClimateTable::from_path(&path)
                .with_context(|| format!("气候数据加载失败: {}", path))?;
            Arc::new(ClimateTableProvider::new(table))
        }
        None => Arc::new(UnavailableProvider),
    };

    let config_path = std::env::var_os("SERVICE_SCHEDULE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(ConfigManager::default_path);
    let config = ConfigManager::new(&config_path)
        .map_err(|e| anyhow::anyhow!("配置加载失败: {}: {}", config_path.display(), e))?;

    let api = ScheduleApi::from_config_reader(Arc::new(catalog), provider, &config, None).await?;

    let outcome = api.validate_services(&request.services);
    if !outcome.is_valid() {
        return report(ApiError::InvalidSelection {
            issues: outcome.errors,
        });
    }
    for warning in &outcome.warnings {
        tracing::warn!("{}", warning.message);
    }

    match api.solve(&outcome.validated_set, &request.input).await {
        Ok(timeline) => {
            println!("{}", serde_json::to_string_pretty(&timeline)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => report(e),
    }
}

fn report(err: ApiError) -> anyhow::Result<ExitCode> {
    tracing::error!(code = err.code(), "{}", err);
    println!("{}", serde_json::to_string_pretty(&err.to_body())?);
    Ok(ExitCode::from(2))
}
