//! Bridge 指标收集模块
//!
//! Counters for frame ingestion and gauges/histograms for the session
//! lifecycle. All functions are no-ops until a recorder is installed.

use metrics::{counter, gauge, histogram};

/// 记录 transport 发布的帧
pub fn record_frame_received() {
    counter!("mono_bridge_frames_received_total").increment(1);
}

/// 记录被更新帧替换的待投递帧
pub fn record_frame_replaced() {
    counter!("mono_bridge_frames_replaced_total").increment(1);
}

/// 记录图像转换失败
pub fn record_conversion_error() {
    counter!("mono_bridge_conversion_errors_total").increment(1);
}

/// 记录跟踪结果
pub fn record_frame_tracked(tracked: bool) {
    let status = if tracked { "tracked" } else { "lost" };
    counter!("mono_bridge_frames_tracked_total", "status" => status).increment(1);
}

/// 记录会话状态切换
///
/// `index` is the state's position in the lifecycle, exported as a gauge so
/// a dashboard can show where a session is stuck.
pub fn record_session_state(state: &'static str, index: u8) {
    gauge!("mono_bridge_session_state").set(index as f64);
    counter!("mono_bridge_session_transitions_total", "state" => state).increment(1);
}

/// 记录关闭阶段耗时
pub fn record_phase_duration_ms(phase: &'static str, duration_ms: f64) {
    histogram!("mono_bridge_phase_duration_ms", "phase" => phase).record(duration_ms);
}

/// 记录导出结果
pub fn record_export(artifact: &'static str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "mono_bridge_exports_total",
        "artifact" => artifact,
        "status" => status
    )
    .increment(1);
}
