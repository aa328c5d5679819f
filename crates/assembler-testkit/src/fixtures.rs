//! Domain fixtures: three customers, billing info for customers 1 and 3,
//! orders for all three.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Customer {
    pub customer_id: u64,
    pub name: String,
}

impl Customer {
    pub fn new(customer_id: u64, name: &str) -> Self {
        Self {
            customer_id,
            name: name.to_string(),
        }
    }

    pub fn customer_id(&self) -> u64 {
        self.customer_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BillingInfo {
    pub id: u64,
    pub customer_id: u64,
    pub credit_card_number: String,
}

impl BillingInfo {
    pub fn new(id: u64, customer_id: u64, credit_card_number: &str) -> Self {
        Self {
            id,
            customer_id,
            credit_card_number: credit_card_number.to_string(),
        }
    }

    /// Stand-in for customers without billing info on file
    pub fn placeholder(customer_id: u64) -> Self {
        Self::new(0, customer_id, "")
    }

    pub fn customer_id(&self) -> u64 {
        self.customer_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderItem {
    pub id: u64,
    pub customer_id: u64,
    pub description: String,
    pub price_cents: u64,
}

impl OrderItem {
    pub fn new(id: u64, customer_id: u64, description: &str, price_cents: u64) -> Self {
        Self {
            id,
            customer_id,
            description: description.to_string(),
            price_cents,
        }
    }

    pub fn customer_id(&self) -> u64 {
        self.customer_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub customer: Customer,
    pub billing_info: Option<BillingInfo>,
    pub order_items: Vec<OrderItem>,
}

impl Transaction {
    /// Combiner for a (billing info, order list) lookup pair
    pub fn new(
        customer: Customer,
        (billing_info, order_items): (Option<BillingInfo>, Vec<OrderItem>),
    ) -> Self {
        Self {
            customer,
            billing_info,
            order_items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSet {
    pub customer: Customer,
    pub billing_info: Option<BillingInfo>,
    pub order_items: HashSet<OrderItem>,
}

impl TransactionSet {
    /// Combiner for a (billing info, order set) lookup pair
    pub fn new(
        customer: Customer,
        (billing_info, order_items): (Option<BillingInfo>, HashSet<OrderItem>),
    ) -> Self {
        Self {
            customer,
            billing_info,
            order_items,
        }
    }
}

pub fn customer1() -> Customer {
    Customer::new(1, "Clair Gabriel")
}

pub fn customer2() -> Customer {
    Customer::new(2, "Erick Daria")
}

pub fn customer3() -> Customer {
    Customer::new(3, "Brenden Jacob")
}

pub fn customers() -> Vec<Customer> {
    vec![customer1(), customer2(), customer3()]
}

pub fn billing_info1() -> BillingInfo {
    BillingInfo::new(1, 1, "4540977822220971")
}

pub fn billing_info3() -> BillingInfo {
    BillingInfo::new(2, 3, "4530987722349872")
}

pub fn order_item11() -> OrderItem {
    OrderItem::new(1, 1, "Sweater", 1999)
}

pub fn order_item12() -> OrderItem {
    OrderItem::new(2, 1, "Socks", 499)
}

pub fn order_item21() -> OrderItem {
    OrderItem::new(3, 2, "Shoes", 8999)
}

pub fn order_item31() -> OrderItem {
    OrderItem::new(4, 3, "Hat", 2499)
}

pub fn all_billing_info() -> Vec<BillingInfo> {
    vec![billing_info1(), billing_info3()]
}

pub fn all_order_items() -> Vec<OrderItem> {
    vec![order_item11(), order_item12(), order_item21(), order_item31()]
}

pub fn transaction1() -> Transaction {
    Transaction::new(
        customer1(),
        (Some(billing_info1()), vec![order_item11(), order_item12()]),
    )
}

/// Customer 2 with its billing info filled in by a default provider
pub fn transaction2() -> Transaction {
    Transaction::new(
        customer2(),
        (Some(BillingInfo::placeholder(2)), vec![order_item21()]),
    )
}

/// Customer 2 without billing info
pub fn transaction2_without_billing_info() -> Transaction {
    Transaction::new(customer2(), (None, vec![order_item21()]))
}

pub fn transaction3() -> Transaction {
    Transaction::new(customer3(), (Some(billing_info3()), vec![order_item31()]))
}

pub fn transaction_set1() -> TransactionSet {
    TransactionSet::new(
        customer1(),
        (
            Some(billing_info1()),
            [order_item11(), order_item12()].into_iter().collect(),
        ),
    )
}

pub fn transaction_set2() -> TransactionSet {
    TransactionSet::new(
        customer2(),
        (
            Some(BillingInfo::placeholder(2)),
            [order_item21()].into_iter().collect(),
        ),
    )
}

pub fn transaction_set3() -> TransactionSet {
    TransactionSet::new(
        customer3(),
        (
            Some(billing_info3()),
            [order_item31()].into_iter().collect(),
        ),
    )
}
