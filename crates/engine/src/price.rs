//! Debounced write-through of the egg price.
//!
//! The price lives in memory and is persisted only after a quiet period with
//! no further change. At most one timer is outstanding: a new price cancels a
//! pending timer and starts a fresh one. A write already in flight is never
//! cancelled; the next write waits for it to finish.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::{MoneyCents, ResultEngine};

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(800);

/// Destination of debounced price writes.
#[async_trait]
pub trait PriceSink: Send + Sync {
    async fn save_price(&self, price: MoneyCents) -> ResultEngine<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AutosaveStatus {
    Idle,
    /// A timer is waiting for the quiet period to elapse.
    Pending,
    /// A write is in flight.
    Writing,
}

enum Slot {
    Idle,
    Pending { generation: u64, handle: JoinHandle<()> },
    Writing { generation: u64 },
}

struct State {
    generation: u64,
    slot: Slot,
}

struct Shared {
    price: Mutex<MoneyCents>,
    state: Mutex<State>,
    write_gate: tokio::sync::Mutex<()>,
    sink: Arc<dyn PriceSink>,
    quiet: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    async fn fire(self: Arc<Self>, generation: u64) {
        tokio::time::sleep(self.quiet).await;
        {
            let mut state = lock(&self.state);
            match state.slot {
                Slot::Pending { generation: g, .. } if g == generation => {}
                _ => return,
            }
            state.slot = Slot::Writing { generation };
        }
        self.write(generation).await;
    }

    async fn write(&self, generation: u64) {
        let _gate = self.write_gate.lock().await;
        let price = *lock(&self.price);
        match self.sink.save_price(price).await {
            Ok(()) => tracing::debug!("egg price {price} persisted"),
            Err(err) => tracing::warn!("failed to persist egg price {price}: {err}"),
        }
        let mut state = lock(&self.state);
        if matches!(state.slot, Slot::Writing { generation: g } if g == generation) {
            state.slot = Slot::Idle;
        }
    }
}

/// In-memory egg price with debounced persistence.
///
/// Must be used from within a tokio runtime.
#[derive(Clone)]
pub struct PriceAutosave {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for PriceAutosave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceAutosave")
            .field("price", &self.price())
            .field("status", &self.status())
            .field("quiet", &self.shared.quiet)
            .finish()
    }
}

impl PriceAutosave {
    pub fn new(sink: Arc<dyn PriceSink>, initial: MoneyCents, quiet: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                price: Mutex::new(initial),
                state: Mutex::new(State {
                    generation: 0,
                    slot: Slot::Idle,
                }),
                write_gate: tokio::sync::Mutex::new(()),
                sink,
                quiet,
            }),
        }
    }

    /// The latest price, persisted or not.
    pub fn price(&self) -> MoneyCents {
        *lock(&self.shared.price)
    }

    pub fn status(&self) -> AutosaveStatus {
        match lock(&self.shared.state).slot {
            Slot::Idle => AutosaveStatus::Idle,
            Slot::Pending { .. } => AutosaveStatus::Pending,
            Slot::Writing { .. } => AutosaveStatus::Writing,
        }
    }

    /// Update the price and (re)start the quiet period.
    pub fn set_price(&self, price: MoneyCents) {
        *lock(&self.shared.price) = price;

        let mut state = lock(&self.shared.state);
        if let Slot::Pending { handle, .. } = std::mem::replace(&mut state.slot, Slot::Idle) {
            handle.abort();
        }
        state.generation += 1;
        let generation = state.generation;
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(shared.fire(generation));
        state.slot = Slot::Pending { generation, handle };
    }

    /// Persist a pending price now, or wait for an in-flight write.
    pub async fn flush(&self) {
        let generation = {
            let mut state = lock(&self.shared.state);
            match std::mem::replace(&mut state.slot, Slot::Idle) {
                Slot::Pending { generation, handle } => {
                    handle.abort();
                    state.slot = Slot::Writing { generation };
                    Some(generation)
                }
                other => {
                    state.slot = other;
                    None
                }
            }
        };
        match generation {
            Some(generation) => self.shared.write(generation).await,
            None => {
                let _gate = self.shared.write_gate.lock().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineError;

    #[derive(Default)]
    struct RecordingSink {
        writes: Mutex<Vec<MoneyCents>>,
        delay: Duration,
        fail: bool,
    }

    impl RecordingSink {
        fn writes(&self) -> Vec<MoneyCents> {
            lock(&self.writes).clone()
        }
    }

    #[async_trait]
    impl PriceSink for RecordingSink {
        async fn save_price(&self, price: MoneyCents) -> ResultEngine<()> {
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(EngineError::StoreUnavailable(sea_orm::DbErr::Custom(
                    "offline".to_string(),
                )));
            }
            lock(&self.writes).push(price);
            Ok(())
        }
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_last_price_of_a_burst_is_written() {
        let sink = Arc::new(RecordingSink::default());
        let autosave = PriceAutosave::new(sink.clone(), MoneyCents::ZERO, ms(800));

        autosave.set_price(MoneyCents::new(100));
        tokio::time::sleep(ms(300)).await;
        autosave.set_price(MoneyCents::new(150));
        tokio::time::sleep(ms(300)).await;
        autosave.set_price(MoneyCents::new(200));
        assert_eq!(autosave.status(), AutosaveStatus::Pending);
        assert!(sink.writes().is_empty());

        tokio::time::sleep(ms(900)).await;
        assert_eq!(sink.writes(), vec![MoneyCents::new(200)]);
        assert_eq!(autosave.status(), AutosaveStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_write_keeps_the_in_memory_price() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let autosave = PriceAutosave::new(sink.clone(), MoneyCents::new(50), ms(800));

        autosave.set_price(MoneyCents::new(175));
        tokio::time::sleep(ms(1_000)).await;

        assert_eq!(autosave.price(), MoneyCents::new(175));
        assert_eq!(autosave.status(), AutosaveStatus::Idle);
        assert!(sink.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_write_is_not_cancelled() {
        let sink = Arc::new(RecordingSink {
            delay: ms(500),
            ..Default::default()
        });
        let autosave = PriceAutosave::new(sink.clone(), MoneyCents::ZERO, ms(800));

        autosave.set_price(MoneyCents::new(100));
        tokio::time::sleep(ms(900)).await;
        assert_eq!(autosave.status(), AutosaveStatus::Writing);

        autosave.set_price(MoneyCents::new(200));
        tokio::time::sleep(ms(2_000)).await;

        assert_eq!(
            sink.writes(),
            vec![MoneyCents::new(100), MoneyCents::new(200)]
        );
        assert_eq!(autosave.status(), AutosaveStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_writes_immediately() {
        let sink = Arc::new(RecordingSink::default());
        let autosave = PriceAutosave::new(sink.clone(), MoneyCents::ZERO, ms(800));

        autosave.set_price(MoneyCents::new(300));
        autosave.flush().await;
        assert_eq!(sink.writes(), vec![MoneyCents::new(300)]);
        assert_eq!(autosave.status(), AutosaveStatus::Idle);

        tokio::time::sleep(ms(1_000)).await;
        assert_eq!(sink.writes().len(), 1);
    }
}
