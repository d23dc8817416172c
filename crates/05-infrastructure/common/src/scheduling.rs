//! 定时任务的调度参数

use std::fmt;
use std::time::Duration;

/// 时间单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    #[default]
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// 将数量转换为时长，负数视为 0
    pub fn to_duration(self, amount: i64) -> Duration {
        let amount = u64::try_from(amount).unwrap_or(0);
        match self {
            Self::Nanoseconds => Duration::from_nanos(amount),
            Self::Microseconds => Duration::from_micros(amount),
            Self::Milliseconds => Duration::from_millis(amount),
            Self::Seconds => Duration::from_secs(amount),
            Self::Minutes => Duration::from_secs(amount.saturating_mul(60)),
            Self::Hours => Duration::from_secs(amount.saturating_mul(3_600)),
            Self::Days => Duration::from_secs(amount.saturating_mul(86_400)),
        }
    }

    /// 单位名称
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nanoseconds => "nanoseconds",
            Self::Microseconds => "microseconds",
            Self::Milliseconds => "milliseconds",
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 固定延迟调度参数
///
/// 数值保留符号，非法声明（`fixed_delay < 1`）在调度器启动时被拒绝。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Schedule {
    /// 首次执行前的延迟
    pub initial_delay: i64,
    /// 上一次执行结束到下一次执行开始之间的延迟
    pub fixed_delay: i64,
    /// 时间单位
    pub unit: TimeUnit,
}

impl Schedule {
    /// 创建固定延迟调度，首次延迟为 0
    pub const fn fixed_delay(fixed_delay: i64, unit: TimeUnit) -> Self {
        Self {
            initial_delay: 0,
            fixed_delay,
            unit,
        }
    }

    /// 设置首次延迟
    pub const fn with_initial_delay(mut self, initial_delay: i64) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// 固定延迟是否合法
    pub const fn is_valid(&self) -> bool {
        self.fixed_delay >= 1
    }

    /// 实际首次延迟，非正数按 0 处理
    pub fn initial_delay_duration(&self) -> Duration {
        self.unit.to_duration(self.initial_delay.max(0))
    }

    /// 两次执行之间的间隔
    pub fn delay_duration(&self) -> Duration {
        self.unit.to_duration(self.fixed_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversion() {
        assert_eq!(TimeUnit::Seconds.to_duration(2), Duration::from_secs(2));
        assert_eq!(TimeUnit::Minutes.to_duration(1), Duration::from_secs(60));
        assert_eq!(TimeUnit::Days.to_duration(1), Duration::from_secs(86_400));
        assert_eq!(TimeUnit::Milliseconds.to_duration(-5), Duration::ZERO);
    }

    #[test]
    fn test_schedule_validity() {
        assert!(Schedule::fixed_delay(1, TimeUnit::Seconds).is_valid());
        assert!(!Schedule::fixed_delay(0, TimeUnit::Seconds).is_valid());
        assert!(!Schedule::fixed_delay(-3, TimeUnit::Seconds).is_valid());
    }

    #[test]
    fn test_negative_initial_delay_defaults_to_zero() {
        let schedule = Schedule::fixed_delay(10, TimeUnit::Milliseconds).with_initial_delay(-1);
        assert_eq!(schedule.initial_delay_duration(), Duration::ZERO);
        assert_eq!(schedule.delay_duration(), Duration::from_millis(10));
    }
}
