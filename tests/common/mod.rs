#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use tokio::sync::mpsc;
use uuid::Uuid;

use vendordesk_api::{
    attachments::InMemoryAttachmentStore,
    config::AppConfig,
    entities::order_item,
    events::{Event, EventSender},
    handlers::{self, AppServices},
    migrator::Migrator,
    AppState,
};

pub const TEST_PAYMENT_DUE_DAYS: i64 = 30;

/// A fully wired service stack over a fresh in-memory database.
pub struct TestCtx {
    pub db: Arc<DatabaseConnection>,
    pub services: AppServices,
    pub event_sender: EventSender,
    pub events: mpsc::Receiver<Event>,
}

pub async fn setup() -> TestCtx {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    Migrator::up(&db, None).await.expect("migrations");
    let db = Arc::new(db);

    let (tx, rx) = mpsc::channel(1024);
    let event_sender = EventSender::new(tx);
    let services = AppServices::new(
        db.clone(),
        event_sender.clone(),
        Arc::new(InMemoryAttachmentStore::default()),
        TEST_PAYMENT_DUE_DAYS,
    );
    TestCtx {
        db,
        services,
        event_sender,
        events: rx,
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        auto_migrate: false,
        environment: "test".to_string(),
        log_level: "info".to_string(),
        log_json: false,
        payment_due_days: TEST_PAYMENT_DUE_DAYS,
    }
}

/// The full application router over this context's service stack.
pub fn app(ctx: &TestCtx) -> axum::Router {
    handlers::app_router(AppState {
        config: test_config(),
        event_sender: ctx.event_sender.clone(),
        services: ctx.services.clone(),
    })
}

pub async fn seed_order_item(
    ctx: &TestCtx,
    order_id: Uuid,
    sku: &str,
    requested_qty: i32,
    unit_price: Decimal,
) -> order_item::Model {
    order_item::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        product_sku: Set(sku.to_string()),
        requested_qty: Set(requested_qty),
        unit_price: Set(unit_price),
        created_at: Set(Utc::now()),
    }
    .insert(&*ctx.db)
    .await
    .expect("seed order item")
}

/// Closes the event channel by dropping the receiver. Senders fail from
/// here on; lifecycle transitions must not care.
pub fn close_events(ctx: &mut TestCtx) {
    let (_tx, rx) = mpsc::channel(1);
    drop(std::mem::replace(&mut ctx.events, rx));
}

/// Drains buffered events, returning them in emission order.
pub fn drain_events(ctx: &mut TestCtx) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = ctx.events.try_recv() {
        events.push(event);
    }
    events
}
