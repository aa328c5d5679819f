//! Join engine tests over the synchronous adapter
//!
//! Covers order and multiplicity preservation, default and empty-collection
//! substitution, id-collection shapes, caching across passes, and the
//! all-or-nothing failure contract.

#![allow(clippy::unwrap_used)]

use assembler_core::prelude::*;
use assembler_core::{ConfigurationError, MapperSet};
use assembler_testkit::*;
use assert_matches::assert_matches;
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Caller-side error type produced by a custom converter
#[derive(Debug)]
struct UserDefinedError(AggregationFailure);

impl From<AggregationFailure> for UserDefinedError {
    fn from(failure: AggregationFailure) -> Self {
        Self(failure)
    }
}

fn default_billing_info(customer_id: &u64) -> Option<BillingInfo> {
    Some(BillingInfo::placeholder(*customer_id))
}

// ============================================================================
// Join semantics
// ============================================================================

#[test]
fn assembles_one_transaction_per_customer_in_order() {
    init_tracing();

    let transactions = EntitySource::from_entities(customers(), Customer::customer_id)
        .assemble_with(
            (
                one_to_one_with_default(
                    billing_info_for_customers,
                    BillingInfo::customer_id,
                    default_billing_info,
                ),
                one_to_many_as_list(all_orders_for_customers, OrderItem::customer_id),
            ),
            Transaction::new,
        )
        .assemble_using(SynchronousAdapter)
        .unwrap();

    assert_eq!(
        transactions,
        vec![transaction1(), transaction2(), transaction3()]
    );
}

#[test]
fn missing_billing_info_resolves_to_none() {
    let transactions = EntitySource::from_entities(customers(), Customer::customer_id)
        .assemble_with(
            (
                one_to_one(billing_info_for_customers, BillingInfo::customer_id),
                one_to_many_as_list(all_orders_for_customers, OrderItem::customer_id),
            ),
            Transaction::new,
        )
        .assemble_using(SynchronousAdapter)
        .unwrap();

    assert_eq!(
        transactions,
        vec![
            transaction1(),
            transaction2_without_billing_info(),
            transaction3()
        ]
    );
}

#[test]
fn duplicate_entities_each_get_an_aggregate() {
    let orders = CountingQuery::orders();
    let entities = vec![customer1(), customer2(), customer3(), customer1(), customer2()];

    let transactions = EntitySource::from_entities(entities, Customer::customer_id)
        .assemble_with(
            (
                one_to_one(billing_info_for_customers, BillingInfo::customer_id),
                one_to_many_as_list(orders.as_fn(), OrderItem::customer_id),
            ),
            Transaction::new,
        )
        .assemble_using(SynchronousAdapter)
        .unwrap();

    assert_eq!(
        transactions,
        vec![
            transaction1(),
            transaction2_without_billing_info(),
            transaction3(),
            transaction1(),
            transaction2_without_billing_info(),
        ]
    );
    // List-shaped id batches keep duplicates, one retrieval per pass
    assert_eq!(orders.requested_ids(), vec![vec![1, 2, 3, 1, 2]]);
}

#[test]
fn lookups_receive_their_declared_id_collection_shape() {
    let transactions = EntitySource::from_entities(customers(), Customer::customer_id)
        .assemble_with(
            (
                one_to_one_with_default(
                    billing_info_for_customer_set,
                    BillingInfo::customer_id,
                    default_billing_info,
                ),
                one_to_many_as_set(orders_for_customer_list, OrderItem::customer_id),
            ),
            TransactionSet::new,
        )
        .assemble_using(SynchronousAdapter)
        .unwrap();

    assert_eq!(
        transactions,
        vec![transaction_set1(), transaction_set2(), transaction_set3()]
    );
}

#[test]
fn customers_without_orders_get_empty_order_list() {
    let stranger = Customer::new(404, "Nobody");

    let transactions = EntitySource::from_entities(vec![stranger.clone()], Customer::customer_id)
        .assemble_with(
            (
                one_to_one(billing_info_for_customers, BillingInfo::customer_id),
                one_to_many_as_list(all_orders_for_customers, OrderItem::customer_id),
            ),
            Transaction::new,
        )
        .assemble_using(SynchronousAdapter)
        .unwrap();

    assert_eq!(
        transactions,
        vec![Transaction::new(stranger, (None, Vec::new()))]
    );
}

#[test]
fn zero_lookups_combine_entity_alone() {
    let names = EntitySource::from_entities(customers(), Customer::customer_id)
        .assemble_with((), |customer: Customer, (): ()| customer.name)
        .assemble_using(SynchronousAdapter)
        .unwrap();

    assert_eq!(names, vec!["Clair Gabriel", "Erick Daria", "Brenden Jacob"]);
}

#[test]
fn empty_batch_still_invokes_lookups() {
    let billing = CountingQuery::billing_info();

    let transactions = EntitySource::from_entities(Vec::<Customer>::new(), Customer::customer_id)
        .assemble_with(
            (
                one_to_one(billing.as_fn(), BillingInfo::customer_id),
                one_to_many_as_list(all_orders_for_customers, OrderItem::customer_id),
            ),
            Transaction::new,
        )
        .assemble_using(SynchronousAdapter)
        .unwrap();

    assert!(transactions.is_empty());
    assert_eq!(billing.requested_ids(), vec![Vec::<u64>::new()]);
}

// ============================================================================
// Entity sources
// ============================================================================

#[test]
fn deferred_source_is_evaluated_once_per_pass() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&loads);

    let assembler = EntitySource::from_supplier(
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, SqlError>(customers())
        },
        Customer::customer_id,
    )
    .assemble_with(
        (one_to_many_as_list(all_orders_for_customers, OrderItem::customer_id),),
        |customer: Customer, (orders,): (Vec<OrderItem>,)| (customer.customer_id, orders.len()),
    );

    assert_eq!(
        assembler.assemble_using(SynchronousAdapter).unwrap(),
        vec![(1, 2), (2, 1), (3, 1)]
    );
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    assembler.assemble_using(SynchronousAdapter).unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

#[test]
fn failing_entity_source_skips_lookups() {
    let billing = CountingQuery::billing_info();

    let result = EntitySource::from_supplier(
        || Err::<Vec<Customer>, _>(SqlError::new("customers: timeout")),
        Customer::customer_id,
    )
    .assemble_with(
        (one_to_one(billing.as_fn(), BillingInfo::customer_id),),
        |customer: Customer, (billing,): (Option<BillingInfo>,)| (customer, billing),
    )
    .assemble_using(SynchronousAdapter);

    assert_matches!(result, Err(AggregationFailure::EntitySource(_)));
    assert_eq!(billing.calls(), 0);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn first_failing_lookup_aborts_the_pass() {
    let orders = CountingQuery::orders();

    let result = EntitySource::from_entities(customers(), Customer::customer_id)
        .assemble_with(
            (
                one_to_one(billing_info_failure, BillingInfo::customer_id),
                one_to_many_as_list(orders.as_fn(), OrderItem::customer_id),
            ),
            Transaction::new,
        )
        .assemble_using(SynchronousAdapter);

    let failure = result.unwrap_err();
    assert_matches!(&failure, AggregationFailure::Retrieval { lookup: 0, .. });
    assert_eq!(
        failure.retrieval().and_then(|r| r.downcast_ref::<SqlError>()),
        Some(&SqlError::new("billing_info: connection refused"))
    );
    assert_eq!(orders.calls(), 0);
}

#[test]
fn failures_go_through_custom_converter() {
    let result = EntitySource::from_entities(customers(), Customer::customer_id)
        .assemble_with(
            (
                one_to_one(billing_info_for_customers, BillingInfo::customer_id),
                one_to_many_as_list(orders_failure, OrderItem::customer_id),
            ),
            Transaction::new,
        )
        .with_error_converter(UserDefinedError::from)
        .assemble_using(SynchronousAdapter);

    assert_matches!(
        result,
        Err(UserDefinedError(AggregationFailure::Retrieval { lookup: 1, .. }))
    );
}

#[test]
fn mapper_omitting_an_id_fails_the_pass() {
    let partial = from_fn(|ids: &[u64]| {
        Ok(ids
            .iter()
            .filter(|id| **id != 2)
            .map(|id| (*id, id * 100))
            .collect::<HashMap<_, _>>())
    });

    let result = EntitySource::from_entities(customers(), Customer::customer_id)
        .assemble_with((partial,), |customer: Customer, (points,): (u64,)| {
            (customer.customer_id, points)
        })
        .assemble_using(SynchronousAdapter);

    assert_matches!(result, Err(AggregationFailure::MissingResult { lookup: 0 }));
}

#[test]
fn configuration_errors_name_the_lookup() {
    let failure = AggregationFailure::from(ConfigurationError::ResultTypeMismatch { lookup: 3 });

    assert_eq!(
        failure.to_string(),
        "lookup 3 produced results of an unexpected type"
    );
}

// ============================================================================
// Caching
// ============================================================================

#[test]
fn cached_lookup_is_reused_across_passes() {
    let billing = CountingQuery::billing_info();
    let orders = CountingQuery::orders();

    let assembler = EntitySource::from_entities(customers(), Customer::customer_id)
        .assemble_with(
            (
                cached(one_to_one(billing.as_fn(), BillingInfo::customer_id)),
                one_to_many_as_list(orders.as_fn(), OrderItem::customer_id),
            ),
            Transaction::new,
        );

    let first = assembler.assemble_using(SynchronousAdapter).unwrap();
    let second = assembler.assemble_using(SynchronousAdapter).unwrap();

    assert_eq!(first, second);
    assert_eq!(billing.calls(), 1);
    assert_eq!(orders.calls(), 2);
}

#[test]
fn rebound_batches_only_fetch_unseen_ids() {
    let billing = CountingQuery::billing_info();

    let entities = vec![customer1(), customer2()];

    let assembler = EntitySource::from_entities(entities, Customer::customer_id).assemble_with(
        (
            cached(one_to_one(billing.as_fn(), BillingInfo::customer_id)),
            one_to_many_as_list(all_orders_for_customers, OrderItem::customer_id),
        ),
        Transaction::new,
    );

    assembler.assemble_using(SynchronousAdapter).unwrap();
    let transactions = assembler
        .with_entities(vec![customer2(), customer3()])
        .assemble_using(SynchronousAdapter)
        .unwrap();

    assert_eq!(
        transactions,
        vec![transaction2_without_billing_info(), transaction3()]
    );
    assert_eq!(billing.requested_ids(), vec![vec![1, 2], vec![3]]);
}

#[test]
fn one_cached_mapper_can_serve_several_assemblers() {
    let billing = CountingQuery::billing_info();
    let shared = Arc::new(cached(one_to_one(billing.as_fn(), BillingInfo::customer_id)));

    let by_customer = EntitySource::from_entities(customers(), Customer::customer_id)
        .assemble_with((Arc::clone(&shared),), |c: Customer, (b,): (Option<BillingInfo>,)| {
            (c.customer_id, b.is_some())
        });
    let by_order = EntitySource::from_entities(all_order_items(), OrderItem::customer_id)
        .assemble_with((Arc::clone(&shared),), |o: OrderItem, (b,): (Option<BillingInfo>,)| {
            (o.id, b.map(|b| b.id))
        });

    assert_eq!(
        by_customer.assemble_using(SynchronousAdapter).unwrap(),
        vec![(1, true), (2, false), (3, true)]
    );
    assert_eq!(
        by_order.assemble_using(SynchronousAdapter).unwrap(),
        vec![(1, Some(1)), (2, Some(1)), (3, None), (4, Some(2))]
    );
    assert_eq!(billing.calls(), 1);
    assert_eq!(by_customer.lookups(), 1);
}

#[test]
fn tuple_sets_report_their_arity() {
    let set = (
        one_to_one(billing_info_for_customers, BillingInfo::customer_id),
        one_to_many_as_list(all_orders_for_customers, OrderItem::customer_id),
    );

    assert_eq!(MapperSet::<u64>::len(&set), 2);
    assert!(MapperSet::<u64>::is_empty(&()));
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn output_preserves_input_order_and_multiplicity(
        ids in proptest::collection::vec(0u64..6, 0..40)
    ) {
        let entities: Vec<Customer> =
            ids.iter().map(|id| Customer::new(*id, "anonymous")).collect();

        let aggregates = EntitySource::from_entities(entities, Customer::customer_id)
            .assemble_with(
                (
                    one_to_one(billing_info_for_customers, BillingInfo::customer_id),
                    one_to_many_as_list(all_orders_for_customers, OrderItem::customer_id),
                ),
                |customer: Customer, values: (Option<BillingInfo>, Vec<OrderItem>)| {
                    let (billing, orders) = values;
                    let owner = customer.customer_id;
                    let consistent = billing.iter().all(|b| b.customer_id == owner)
                        && orders.iter().all(|o| o.customer_id == owner);
                    (customer.customer_id, consistent)
                },
            )
            .assemble_using(SynchronousAdapter)
            .unwrap();

        prop_assert_eq!(aggregates.len(), ids.len());
        for ((id, consistent), expected) in aggregates.into_iter().zip(ids) {
            prop_assert_eq!(id, expected);
            prop_assert!(consistent);
        }
    }
}
