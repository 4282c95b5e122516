use axum::extract::{Path, State};
use axum::Json;
use domain::records::{InvoiceSummary, Order};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Newest first.
pub async fn list_orders(State(state): State<AppState>) -> ApiResult<Json<Vec<Order>>> {
    let orders = state.records.orders.read().await;
    Ok(Json(orders.iter().rev().cloned().collect()))
}

pub async fn list_invoices(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<InvoiceSummary>>> {
    let invoices = state.records.invoices.read().await;
    Ok(Json(
        invoices.iter().rev().cloned().map(InvoiceSummary::from).collect(),
    ))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<InvoiceSummary>> {
    let invoices = state.records.invoices.read().await;
    invoices
        .iter()
        .find(|invoice| invoice.id == id || invoice.invoice_number == id)
        .cloned()
        .map(|invoice| Json(InvoiceSummary::from(invoice)))
        .ok_or_else(|| ApiError::not_found(format!("Invoice {id}")))
}
