// ==========================================
// 服务排期引擎 - 内置服务目录
// ==========================================
// 外墙清洗 / 玻璃修复类服务的默认关系表
// ==========================================

use crate::domain::service::ServiceDefinition;
use crate::domain::types::Unit;

pub const ROOF_CLEANING: &str = "roof_cleaning";
pub const GUTTER_CLEANING: &str = "gutter_cleaning";
pub const PRESSURE_WASHING: &str = "pressure_washing";
pub const SOFT_WASHING: &str = "soft_washing";
pub const WINDOW_CLEANING: &str = "window_cleaning";
pub const GLASS_RESTORATION: &str = "glass_restoration";
pub const FRAME_RESTORATION: &str = "frame_restoration";
pub const PROTECTIVE_COATING: &str = "protective_coating";
pub const INTERIOR_GLASS_CLEANING: &str = "interior_glass_cleaning";
pub const FINAL_INSPECTION: &str = "final_inspection";

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn service(
    id: &str,
    display_name: &str,
    unit: Unit,
    base_rate_per_unit: f64,
    weather_sensitive: bool,
    priority: u32,
    minimum_hours: f64,
) -> ServiceDefinition {
    ServiceDefinition {
        id: id.to_string(),
        display_name: display_name.to_string(),
        unit,
        base_rate_per_unit,
        weather_sensitive,
        priority,
        requires: Vec::new(),
        must_precede: Vec::new(),
        must_follow: Vec::new(),
        removal_blocked_by: Vec::new(),
        excludes: Vec::new(),
        minimum_hours,
        defaultable: true,
    }
}

/// 内置服务定义
pub fn definitions() -> Vec<ServiceDefinition> {
    let mut roof = service(ROOF_CLEANING, "Roof Cleaning", Unit::Area, 0.015, true, 10, 6.0);
    roof.must_precede = ids(&[GUTTER_CLEANING, PRESSURE_WASHING, SOFT_WASHING]);

    let mut gutter = service(GUTTER_CLEANING, "Gutter Cleaning", Unit::Count, 0.75, true, 20, 2.0);
    gutter.must_precede = ids(&[PRESSURE_WASHING, SOFT_WASHING]);

    // 高压冲洗会溅污玻璃，必须配套擦窗并在其之前完成
    let mut pressure = service(PRESSURE_WASHING, "Pressure Washing", Unit::Area, 0.012, true, 30, 4.0);
    pressure.requires = ids(&[WINDOW_CLEANING]);
    pressure.must_precede = ids(&[WINDOW_CLEANING]);
    pressure.excludes = ids(&[SOFT_WASHING]);

    let mut soft = service(SOFT_WASHING, "Soft Washing", Unit::Area, 0.016, true, 35, 4.0);
    soft.requires = ids(&[WINDOW_CLEANING]);
    soft.must_precede = ids(&[WINDOW_CLEANING]);
    soft.excludes = ids(&[PRESSURE_WASHING]);

    let mut window = service(WINDOW_CLEANING, "Window Cleaning", Unit::GlassArea, 0.01, true, 40, 4.0);
    window.removal_blocked_by = ids(&[PRESSURE_WASHING, SOFT_WASHING, GLASS_RESTORATION]);

    let mut glass = service(GLASS_RESTORATION, "Glass Restoration", Unit::GlassArea, 0.04, false, 50, 8.0);
    glass.requires = ids(&[WINDOW_CLEANING]);
    glass.must_follow = ids(&[WINDOW_CLEANING]);
    // 修复面积无法凭经验兜底
    glass.defaultable = false;

    let mut frame = service(FRAME_RESTORATION, "Frame Restoration", Unit::Count, 1.5, false, 60, 4.0);
    frame.must_follow = ids(&[WINDOW_CLEANING]);

    let mut coating = service(PROTECTIVE_COATING, "Protective Glass Coating", Unit::GlassArea, 0.02, true, 70, 6.0);
    coating.requires = ids(&[GLASS_RESTORATION]);
    coating.must_follow = ids(&[GLASS_RESTORATION, FRAME_RESTORATION]);

    let interior = service(
        INTERIOR_GLASS_CLEANING,
        "Interior Glass Cleaning",
        Unit::GlassArea,
        0.008,
        false,
        45,
        2.0,
    );

    let mut inspection = service(FINAL_INSPECTION, "Final Inspection", Unit::Fixed, 4.0, false, 90, 4.0);
    inspection.must_follow = ids(&[
        WINDOW_CLEANING,
        GLASS_RESTORATION,
        FRAME_RESTORATION,
        PROTECTIVE_COATING,
        INTERIOR_GLASS_CLEANING,
    ]);

    vec![
        roof, gutter, pressure, soft, window, glass, frame, coating, interior, inspection,
    ]
}
