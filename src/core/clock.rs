//! 时间与 ID 生成能力
//!
//! 消息的 id / ts 不直接读系统时钟与随机源，而是通过注入的 Clock / IdGenerator 获得，
//! 测试中可替换为 FixedClock / SequentialIdGenerator 得到确定性结果。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, SubsecRound, Utc};

/// 时钟：返回 UTC 时间（精度截断到微秒，保证序列化往返一致）
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }
}

/// 固定时钟（测试用），可通过 advance 手动推进
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now.trunc_subsecs(6)),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now = (*now + by).trunc_subsecs(6);
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
            .lock()
            .map(|n| *n)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}

/// 消息 ID 生成器
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// 默认生成器：`msg_` + uuid v4（32 位十六进制）
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> String {
        format!("msg_{}", uuid::Uuid::new_v4().simple())
    }
}

/// 递增生成器（测试用）：`{prefix}_1`、`{prefix}_2` …
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new("msg")
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}_{}", self.prefix, n)
    }
}
