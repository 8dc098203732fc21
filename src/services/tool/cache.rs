//! 检测结果短期缓存
//!
//! 每个适配器持有一个实例，缓存只读检测命令（`--version`、`config get`）的结果：
//! - TTL 从写入时刻开始计算
//! - 任何变更操作之后调用 `clear()`
//! - 代数计数器保证 `clear()` 之前开始的计算不会把旧值写回缓存
//!
//! 内部使用同步 `Mutex`，锁从不跨越 `.await` 持有。

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// 默认有效期
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() >= ttl
    }
}

#[derive(Debug)]
struct CacheState<V> {
    generation: u64,
    entries: HashMap<String, CacheEntry<V>>,
}

/// 检测缓存
#[derive(Debug)]
pub struct DetectionCache<V: Clone> {
    ttl: Duration,
    state: Mutex<CacheState<V>>,
}

impl<V: Clone> DetectionCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(CacheState {
                generation: 0,
                entries: HashMap::new(),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 读取未过期的缓存值
    pub fn get(&self, key: &str) -> Option<V> {
        let state = self.lock();
        state
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(self.ttl))
            .map(|entry| entry.value.clone())
    }

    /// 命中则直接返回，否则执行 `compute` 并写入缓存
    ///
    /// 计算期间发生过 `clear()` 时，结果照常返回给调用方但不会写入缓存。
    pub async fn get_or_compute<F, Fut>(&self, key: &str, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let generation = {
            let state = self.lock();
            if let Some(entry) = state.entries.get(key) {
                if !entry.is_expired(self.ttl) {
                    tracing::trace!(key = %key, "检测缓存命中");
                    return entry.value.clone();
                }
            }
            state.generation
        };

        let value = compute().await;

        let mut state = self.lock();
        if state.generation == generation {
            state
                .entries
                .insert(key.to_string(), CacheEntry::new(value.clone()));
        } else {
            tracing::trace!(key = %key, "缓存已失效，丢弃过期的计算结果");
        }
        value
    }

    /// 清空缓存
    pub fn clear(&self) {
        let mut state = self.lock();
        state.generation = state.generation.wrapping_add(1);
        state.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<V>> {
        // 临界区内没有会 panic 的操作，中毒时直接取回数据
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<V: Clone> Default for DetectionCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}
