use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tempfile::TempDir;

use tillsync_core::{
    Customer, LineItem, PaymentInput, ProductId, SaleComposer, StaffId, StoreId,
};
use tillsync_engine::{
    CheckoutReceipt, DrainReport, EngineError, Register, RetryPolicy, SyncCoordinator, SyncSignal,
};
use tillsync_storage::{QueueError, QueueRecord, SaleQueue, SqliteQueue};

use crate::backend::InMemoryBackend;
use crate::connectivity::SharedConnectivity;
use crate::listener::{RecordingListener, SyncEvent};

/// One simulated point-of-sale device: a file-backed queue in a temp
/// directory (so process restarts can be simulated by reopening), an
/// in-memory document store, and a switchable connectivity flag.
pub struct TestTill {
    pub register: Register<SqliteQueue>,
    pub coordinator: SyncCoordinator<InMemoryBackend, SharedConnectivity, RecordingListener>,
    pub net: SharedConnectivity,
    store_id: StoreId,
    staff_id: StaffId,
    db_path: PathBuf,
    _dir: TempDir,
}

impl TestTill {
    pub fn new(backend: InMemoryBackend) -> Result<Self, QueueError> {
        let dir = tempfile::tempdir().map_err(|e| QueueError::Serialization(e.to_string()))?;
        let db_path = dir.path().join("queue.db");
        let store_id = StoreId::from("store-1");
        let staff_id = StaffId::from("staff-1");
        let net = SharedConnectivity::new(true);

        Ok(Self {
            register: Register::new(
                SaleComposer::new(store_id.clone(), staff_id.clone()),
                SqliteQueue::open(&db_path)?,
            ),
            coordinator: SyncCoordinator::new(
                backend,
                net.clone(),
                RecordingListener::default(),
                RetryPolicy::default(),
            ),
            net,
            store_id,
            staff_id,
            db_path,
            _dir: dir,
        })
    }

    /// Simulate an app restart: drop the open queue and reload it from
    /// the same file. The cart and any in-memory state are lost; the
    /// durable queue is not.
    pub fn restart(&mut self) -> Result<(), QueueError> {
        self.register = Register::new(
            SaleComposer::new(self.store_id.clone(), self.staff_id.clone()),
            SqliteQueue::open(&self.db_path)?,
        );
        Ok(())
    }

    pub fn add(&mut self, product_id: &str, name: &str, price_cents: i64, qty: u32) {
        self.register.add_item(LineItem {
            product_id: ProductId::from(product_id),
            variant_id: None,
            name: name.to_string(),
            unit_price: Decimal::new(price_cents, 2),
            quantity: qty,
        });
    }

    pub fn checkout_cash(
        &mut self,
        tendered_cents: i64,
        now: DateTime<Utc>,
    ) -> Result<CheckoutReceipt, EngineError> {
        self.register.checkout(
            Customer::guest(),
            PaymentInput::cash(Decimal::new(tendered_cents, 2)),
            now,
        )
    }

    pub fn drain(&mut self, now: DateTime<Utc>) -> Result<DrainReport, EngineError> {
        self.coordinator.drain(self.register.queue_mut(), now)
    }

    pub fn signal(
        &mut self,
        signal: SyncSignal,
        now: DateTime<Utc>,
    ) -> Result<DrainReport, EngineError> {
        self.coordinator.handle(signal, self.register.queue_mut(), now)
    }

    pub fn pending(&self) -> Result<Vec<QueueRecord>, QueueError> {
        self.register.queue().list_pending()
    }

    pub fn stock(&self, product_id: &str) -> Option<i64> {
        self.coordinator.store().stock(&ProductId::from(product_id))
    }

    pub fn sale_count(&self) -> usize {
        self.coordinator.store().sale_count()
    }

    pub fn events(&self) -> &[SyncEvent] {
        &self.coordinator.listener().events
    }
}
