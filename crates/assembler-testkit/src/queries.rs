//! Retrieval functions over the fixtures

use std::collections::{HashSet, LinkedList};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::fixtures::{all_billing_info, all_order_items, BillingInfo, OrderItem};

/// Error raised by the fixture "database".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("SQL error: {message}")]
pub struct SqlError {
    message: String,
}

impl SqlError {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

fn billing_info_where(matches: impl Fn(u64) -> bool) -> Vec<BillingInfo> {
    all_billing_info()
        .into_iter()
        .filter(|info| matches(info.customer_id))
        .collect()
}

fn orders_where(matches: impl Fn(u64) -> bool) -> Vec<OrderItem> {
    all_order_items()
        .into_iter()
        .filter(|order| matches(order.customer_id))
        .collect()
}

pub fn billing_info_for_customers(ids: Vec<u64>) -> Result<Vec<BillingInfo>, SqlError> {
    Ok(billing_info_where(|id| ids.contains(&id)))
}

pub fn billing_info_for_customer_set(ids: HashSet<u64>) -> Result<Vec<BillingInfo>, SqlError> {
    Ok(billing_info_where(|id| ids.contains(&id)))
}

pub fn all_orders_for_customers(ids: Vec<u64>) -> Result<Vec<OrderItem>, SqlError> {
    Ok(orders_where(|id| ids.contains(&id)))
}

pub fn orders_for_customer_list(ids: LinkedList<u64>) -> Result<Vec<OrderItem>, SqlError> {
    Ok(orders_where(|id| ids.contains(&id)))
}

pub fn billing_info_failure(_ids: Vec<u64>) -> Result<Vec<BillingInfo>, SqlError> {
    Err(SqlError::new("billing_info: connection refused"))
}

pub fn orders_failure(_ids: Vec<u64>) -> Result<Vec<OrderItem>, SqlError> {
    Err(SqlError::new("orders: connection refused"))
}

type Query<R> = fn(Vec<u64>) -> Result<Vec<R>, SqlError>;

/// Wraps a fixture query and records every id batch it receives.
pub struct CountingQuery<R> {
    query: Query<R>,
    requests: Arc<Mutex<Vec<Vec<u64>>>>,
}

impl CountingQuery<BillingInfo> {
    pub fn billing_info() -> Self {
        Self::new(billing_info_for_customers)
    }
}

impl CountingQuery<OrderItem> {
    pub fn orders() -> Self {
        Self::new(all_orders_for_customers)
    }
}

impl<R: 'static> CountingQuery<R> {
    pub fn new(query: Query<R>) -> Self {
        Self {
            query,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Retrieval function recording into this counter
    pub fn as_fn(&self) -> impl Fn(Vec<u64>) -> Result<Vec<R>, SqlError> + Send + Sync + 'static {
        let requests = Arc::clone(&self.requests);
        let query = self.query;
        move |ids| {
            requests.lock().push(ids.clone());
            query(ids)
        }
    }

    /// Number of times the retrieval ran
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    /// Id batches received, in call order
    pub fn requested_ids(&self) -> Vec<Vec<u64>> {
        self.requests.lock().clone()
    }
}
