//! # 示例应用程序
//!
//! 演示如何使用 Lorn 组件运行时：声明式组件、配置注入、定时任务与优雅关闭

mod services;

use anyhow::Context;
use clap::Parser;
use infrastructure_composition::{install_shutdown_hook, ApplicationContext};
use services::{BiddingService, ReportExporter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn 组件运行时示例应用")]
struct Args {
    /// 配置文件路径（properties / json / yaml / toml）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 组件扫描根
    #[arg(long, default_value = "example_app::services")]
    scan: String,

    /// 日志级别，RUST_LOG 优先
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 运行指定秒数后退出，缺省时等待退出信号
    #[arg(long)]
    run_for: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日志
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("启动 Lorn 组件运行时示例应用");

    let mut builder = ApplicationContext::builder().scan(args.scan.as_str());
    builder = match &args.config {
        Some(path) => builder.config_file(path),
        None => builder
            .with_value("bidding.strategy", "ADAPTIVE")
            .with_value("bidding.base_price", 0.8),
    };
    let context = Arc::new(builder.build().await.context("应用上下文启动失败")?);

    demonstrate(&context)?;

    let shutdown = install_shutdown_hook(Arc::clone(&context));
    match args.run_for {
        Some(seconds) => {
            tokio::time::sleep(Duration::from_secs(seconds)).await;
            shutdown.abort();
            context.close().await;
        }
        None => shutdown.await.context("关闭钩子异常退出")?,
    }

    info!("应用已关闭");
    Ok(())
}

/// 演示组件获取与配置查询
fn demonstrate(context: &ApplicationContext) -> anyhow::Result<()> {
    for component in context.registered_components() {
        info!("已注册组件: {}", component);
    }

    let bidding = context.get_component::<BiddingService>()?;
    info!("出价策略: {:?}", bidding.strategy());
    for slot in ["banner-top", "popup"] {
        match bidding.quote(slot) {
            Some(price) => info!("广告位 {} 报价: {:.2}", slot, price),
            None => info!("广告位 {} 不可用", slot),
        }
    }

    for activity in context.scheduled_activities() {
        info!(
            "定时任务: {}::{} 每 {} {}",
            activity.component, activity.method, activity.schedule.fixed_delay, activity.schedule.unit
        );
    }

    // 延迟组件在首次获取时构建
    if context.find_component::<ReportExporter>()?.is_some() {
        info!("报表导出器已就绪");
    }

    let base_price: f64 = context.get_config_value("bidding.base_price")?;
    info!("基础价格: {}", base_price);
    Ok(())
}
