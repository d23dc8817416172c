//! 示例组件

use component_macros::{Component, ConfigEnum};
use infrastructure_common::BoxError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// 出价策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, ConfigEnum)]
pub enum BiddingStrategy {
    Fixed,
    Adaptive,
}

/// 广告库存仓储
#[derive(Component)]
#[component(post_construct = "connect", pre_destroy = "disconnect")]
pub struct InventoryRepository {
    #[value("inventory.url")]
    url: Option<String>,
    slots: Mutex<Vec<String>>,
}

impl InventoryRepository {
    fn connect(&mut self) -> Result<(), BoxError> {
        let url = self.url.get_or_insert_with(|| "memory://inventory".to_string());
        info!("连接库存仓储: {}", url);
        self.slots.lock().extend(["banner-top", "sidebar", "footer"].map(String::from));
        Ok(())
    }

    fn disconnect(&self) -> Result<(), BoxError> {
        info!("断开库存仓储");
        Ok(())
    }

    /// 可用广告位
    pub fn slots(&self) -> Vec<String> {
        self.slots.lock().clone()
    }
}

/// 出价服务
#[derive(Component)]
pub struct BiddingService {
    #[inject]
    inventory: Arc<InventoryRepository>,
    #[value("bidding.strategy")]
    strategy: BiddingStrategy,
    #[value("bidding.base_price")]
    base_price: f64,
}

impl BiddingService {
    /// 为广告位报价
    pub fn quote(&self, slot: &str) -> Option<f64> {
        if !self.inventory.slots().iter().any(|s| s == slot) {
            return None;
        }
        let price = match self.strategy {
            BiddingStrategy::Fixed => self.base_price,
            BiddingStrategy::Adaptive => self.base_price * 1.25,
        };
        Some(price)
    }

    /// 出价策略
    pub const fn strategy(&self) -> BiddingStrategy {
        self.strategy
    }
}

/// 定期汇总统计，延迟组件但由于拥有定时方法会在启动时构建
#[derive(Component, Default)]
#[component(lazy, scheduled(method = "report", initial_delay = 1, fixed_delay = 2, unit = "seconds"))]
pub struct StatsReporter {
    ticks: AtomicU64,
}

impl StatsReporter {
    fn report(&self) -> Result<(), BoxError> {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        if tick % 5 == 0 {
            warn!("第 {} 次汇总跳过: 统计源繁忙", tick);
            return Err("statistics source busy".into());
        }
        info!("第 {} 次汇总完成", tick);
        Ok(())
    }
}

/// 只在需要时构建的报表导出器
#[derive(Component)]
#[component(lazy, pre_destroy = "flush")]
pub struct ReportExporter;

impl ReportExporter {
    fn flush(&self) -> Result<(), BoxError> {
        info!("导出剩余报表");
        Ok(())
    }
}
