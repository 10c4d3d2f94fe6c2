//! A bounded pool of handler instances.
//!
//! Instances are created up front. [`HandlerPool::acquire`] waits until one is free and hands it
//! out exclusively; dropping the returned guard puts the instance back at the end of the queue,
//! so instances are used in round-robin order.

use std::collections::VecDeque;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::{Semaphore, SemaphorePermit};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    #[error("handler pool is closed")]
    Closed,
}

pub struct HandlerPool<H> {
    instances: Mutex<VecDeque<H>>,
    permits: Semaphore,
    size: usize,
}

impl<H> HandlerPool<H> {
    pub fn new(instances: Vec<H>) -> Self {
        let size = instances.len();
        Self { instances: Mutex::new(instances.into()), permits: Semaphore::new(size), size }
    }

    pub fn with_factory(size: usize, factory: impl FnMut() -> H) -> Self {
        Self::new(std::iter::repeat_with(factory).take(size).collect())
    }

    /// Waits for a free instance.
    pub async fn acquire(&self) -> Result<PooledHandler<'_, H>, PoolError> {
        let permit = self.permits.acquire().await.map_err(|_| PoolError::Closed)?;
        // one permit per queued instance
        let instance = self.lock().pop_front().ok_or(PoolError::Closed)?;
        Ok(PooledHandler { pool: self, instance: Some(instance), _permit: permit })
    }

    /// Fails every pending and future `acquire`.
    pub fn close(&self) {
        self.permits.close();
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Instances not handed out right now.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<H>> {
        self.instances.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<H> fmt::Debug for HandlerPool<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerPool").field("size", &self.size).field("available", &self.available()).finish()
    }
}

/// Exclusive access to one pooled instance.
pub struct PooledHandler<'a, H> {
    pool: &'a HandlerPool<H>,
    instance: Option<H>,
    _permit: SemaphorePermit<'a>,
}

impl<H> Deref for PooledHandler<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.instance.as_ref().expect("instance is present until drop")
    }
}

impl<H> DerefMut for PooledHandler<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.instance.as_mut().expect("instance is present until drop")
    }
}

impl<H> Drop for PooledHandler<'_, H> {
    fn drop(&mut self) {
        // returned before the permit is released
        if let Some(instance) = self.instance.take() {
            self.pool.lock().push_back(instance);
        }
    }
}

impl<H: fmt::Debug> fmt::Debug for PooledHandler<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PooledHandler").field(&self.instance).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn round_robin() {
        let pool = HandlerPool::new(vec![1, 2, 3]);

        let mut seen = Vec::new();
        for _ in 0..4 {
            let instance = pool.acquire().await.unwrap();
            seen.push(*instance);
        }
        assert_eq!(seen, vec![1, 2, 3, 1]);
    }

    #[tokio::test]
    async fn acquire_waits_for_release() {
        let pool = HandlerPool::with_factory(1, String::new);

        let mut first = pool.acquire().await.unwrap();
        first.push_str("used");
        assert_eq!(pool.available(), 0);
        assert!(timeout(Duration::from_millis(20), pool.acquire()).await.is_err());

        drop(first);
        assert_eq!(pool.available(), 1);
        let second = timeout(Duration::from_millis(20), pool.acquire()).await.unwrap().unwrap();
        assert_eq!(second.as_str(), "used");
    }

    #[tokio::test]
    async fn instances_are_never_shared() {
        let pool = Arc::new(HandlerPool::with_factory(2, || 0_usize));
        let in_use = Arc::new(AtomicUsize::new(0));
        let max_in_use = Arc::new(AtomicUsize::new(0));

        let tasks = (0..16)
            .map(|_| {
                let pool = Arc::clone(&pool);
                let in_use = Arc::clone(&in_use);
                let max_in_use = Arc::clone(&max_in_use);
                tokio::spawn(async move {
                    let mut instance = pool.acquire().await.unwrap();
                    let now = in_use.fetch_add(1, Ordering::SeqCst) + 1;
                    max_in_use.fetch_max(now, Ordering::SeqCst);
                    *instance += 1;
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    in_use.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect::<Vec<_>>();

        for task in tasks {
            task.await.unwrap();
        }

        assert!(max_in_use.load(Ordering::SeqCst) <= 2);
        let first = *pool.acquire().await.unwrap();
        let second = *pool.acquire().await.unwrap();
        assert_eq!(first + second, 16);
    }

    #[tokio::test]
    async fn closed_pool_fails_acquire() {
        let pool = HandlerPool::new(vec![()]);
        pool.close();
        assert_eq!(pool.acquire().await.unwrap_err(), PoolError::Closed);
    }
}
