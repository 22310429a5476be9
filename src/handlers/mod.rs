pub mod assignments;
pub mod common;
pub mod dispatches;
pub mod goods_receipts;
pub mod health;
pub mod invoices;
pub mod orders;
pub mod payments;
pub mod purchase_orders;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    attachments::AttachmentStore,
    events::EventSender,
    openapi::ApiDoc,
    services::{
        AssignmentService, DispatchService, GoodsReceiptService, InvoiceService,
        OrderStatusService, PaymentService, PurchaseOrderService,
    },
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub db: Arc<DatabaseConnection>,
    pub assignments: Arc<AssignmentService>,
    pub purchase_orders: Arc<PurchaseOrderService>,
    pub dispatches: Arc<DispatchService>,
    pub goods_receipts: Arc<GoodsReceiptService>,
    pub invoices: Arc<InvoiceService>,
    pub payments: Arc<PaymentService>,
    pub order_status: Arc<OrderStatusService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        attachment_store: Arc<dyn AttachmentStore>,
        payment_due_days: i64,
    ) -> Self {
        Self {
            db: db.clone(),
            assignments: Arc::new(AssignmentService::new(db.clone(), event_sender.clone())),
            purchase_orders: Arc::new(PurchaseOrderService::new(
                db.clone(),
                event_sender.clone(),
            )),
            dispatches: Arc::new(DispatchService::new(db.clone(), event_sender.clone())),
            goods_receipts: Arc::new(GoodsReceiptService::new(db.clone(), event_sender.clone())),
            invoices: Arc::new(InvoiceService::new(
                db.clone(),
                event_sender.clone(),
                attachment_store,
                payment_due_days,
            )),
            payments: Arc::new(PaymentService::new(db.clone(), event_sender)),
            order_status: Arc::new(OrderStatusService::new(db)),
        }
    }
}

/// Assembles the full application router with middleware and API docs.
pub fn app_router(state: AppState) -> Router {
    use utoipa::OpenApi;

    Router::new()
        .merge(health::health_routes())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/v1/assignments", assignments::assignment_routes())
        .nest("/api/v1/orders", orders::order_routes())
        .nest(
            "/api/v1/purchase-orders",
            purchase_orders::purchase_order_routes(),
        )
        .nest("/api/v1/dispatches", dispatches::dispatch_routes())
        .nest(
            "/api/v1/goods-receipts",
            goods_receipts::goods_receipt_routes(),
        )
        .nest("/api/v1/invoices", invoices::invoice_routes())
        .nest("/api/v1/payments", payments::payment_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state)
}
