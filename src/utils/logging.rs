//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use crate::error::Result;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化全局日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info。
/// 重复调用不会报错（测试中常见）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n选课监控日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 向日志文件追加一行
pub fn append_log_line(log_file_path: &str, line: &str) -> Result<()> {
    use std::io::Write;

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;
    writeln!(
        file,
        "[{}] {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        line
    )?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `username`: 学号
/// - `monitored`: 监控的课程数
pub fn log_startup(username: &str, monitored: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 选课监控模式");
    info!("👤 学号: {}", username);
    info!("📋 监控课程数: {}", monitored);
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
pub fn log_batch_start(batch_num: usize, total_batches: usize, codes: &[String]) {
    info!("\n{}", "─".repeat(60));
    info!(
        "📦 第 {}/{} 批: <{}>",
        batch_num,
        total_batches,
        codes.join(", ")
    );
}

/// 打印本轮统计信息
///
/// # 参数
/// - `checked`: 检查的课程数
/// - `vacancies`: 有名额的课程数
/// - `enrolled`: 成功加选的课程数
/// - `failed`: 查询或加选失败的课程数
pub fn print_cycle_stats(checked: usize, vacancies: usize, enrolled: usize, failed: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 本轮检查完成");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("🔍 检查: {}", checked);
    info!("🟢 有名额: {}", vacancies);
    info!("✅ 加选成功: {}", enrolled);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
