//! Per-category mutual exclusion
//!
//! Each category owns one async mutex. `tokio::sync::Mutex` queues waiters
//! in FIFO order, so holders are granted access in arrival order. The guard
//! releases on drop, which covers early returns and errors alike.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use super::Category;

pub struct CategoryLocks {
    locks: HashMap<Category, Arc<Mutex<()>>>,
}

impl Default for CategoryLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryLocks {
    pub fn new() -> Self {
        let locks = Category::ALL
            .iter()
            .map(|c| (*c, Arc::new(Mutex::new(()))))
            .collect();
        Self { locks }
    }

    /// Wait until no other holder is active for `category`.
    pub async fn acquire(&self, category: Category) -> CategoryGuard {
        let lock = self.locks[&category].clone();
        let guard = lock.lock_owned().await;
        debug!("Acquired {} lock", category);
        CategoryGuard {
            category,
            _guard: guard,
        }
    }

    /// Whether an operation currently holds `category`.
    pub fn is_held(&self, category: Category) -> bool {
        self.locks[&category].try_lock().is_err()
    }
}

/// Exclusive access to one category until dropped.
pub struct CategoryGuard {
    category: Category,
    _guard: OwnedMutexGuard<()>,
}

impl CategoryGuard {
    pub fn category(&self) -> Category {
        self.category
    }
}

impl Drop for CategoryGuard {
    fn drop(&mut self) {
        debug!("Released {} lock", self.category);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_category_is_exclusive() {
        let locks = Arc::new(CategoryLocks::new());
        let guard = locks.acquire(Category::Decisions).await;
        assert!(locks.is_held(Category::Decisions));

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let g = locks.acquire(Category::Decisions).await;
                g.category()
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        assert_eq!(waiter.await.unwrap(), Category::Decisions);
        assert!(!locks.is_held(Category::Decisions));
    }

    #[tokio::test]
    async fn different_categories_do_not_block() {
        let locks = CategoryLocks::new();
        let _a = locks.acquire(Category::Decisions).await;
        let b = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(Category::Patterns),
        )
        .await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn waiters_are_served_in_arrival_order() {
        let locks = Arc::new(CategoryLocks::new());
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let first = locks.acquire(Category::Corrections).await;

        let mut handles = Vec::new();
        for i in 0..3 {
            let locks = locks.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                let _g = locks.acquire(Category::Corrections).await;
                order.lock().unwrap().push(i);
            }));
            // let each task enqueue before spawning the next
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        drop(first);
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn guard_released_on_error_path() {
        let locks = CategoryLocks::new();

        async fn failing(locks: &CategoryLocks) -> Result<(), &'static str> {
            let _g = locks.acquire(Category::Patterns).await;
            Err("boom")
        }

        assert!(failing(&locks).await.is_err());
        assert!(!locks.is_held(Category::Patterns));
    }
}
