//! # Assembler Core - batch join engine
//!
//! Assembles one aggregate per top-level entity from several independent,
//! batched per-id lookups.
//!
//! - [`mapper`]: keyed lookups (one-to-one, one-to-many) and the per-id
//!   memoizing [`Cached`] decorator
//! - [`engine`]: the [`Assembler`], which derives the id batch once,
//!   dispatches every lookup over it through an adapter, and correlates
//!   the results back to the entities in input order
//! - [`adapter`]: the [`AssemblerAdapter`] contract; [`SynchronousAdapter`]
//!   is the in-thread implementation, worker-pool and stream based ones
//!   live in `assembler-tokio`
//!
//! ## Example
//!
//! ```rust
//! use assembler_core::prelude::*;
//! use std::convert::Infallible;
//!
//! #[derive(Clone)]
//! struct Customer { id: u64 }
//! #[derive(Clone)]
//! struct Order { customer_id: u64 }
//!
//! fn orders(ids: Vec<u64>) -> Result<Vec<Order>, Infallible> {
//!     Ok(ids.into_iter().map(|customer_id| Order { customer_id }).collect())
//! }
//!
//! let assembler = EntitySource::from_entities(vec![Customer { id: 1 }], |c: &Customer| c.id)
//!     .assemble_with(
//!         (one_to_many_as_list(orders, |o: &Order| o.customer_id),),
//!         |customer: Customer, (orders,): (Vec<Order>,)| (customer.id, orders.len()),
//!     );
//!
//! let summary = assembler.assemble_using(SynchronousAdapter).unwrap();
//! assert_eq!(summary, vec![(1, 1)]);
//! ```

#![forbid(unsafe_code)]

pub mod adapter;
pub mod engine;
pub mod error;
pub mod mapper;
pub mod prelude;
pub mod synchronous;

pub use adapter::{AggregateBuilder, AssemblerAdapter, ErasedResults, MapperSource};
pub use engine::{Assembler, EntitySource, IdBatch, MapperSet};
pub use error::{
    AggregationFailure, BoxError, ConfigurationError, ErrorConverter, RetrievalFailure,
};
pub use mapper::{
    cached, from_fn, one_to_many, one_to_many_as_list, one_to_many_as_set, one_to_one,
    one_to_one_with_default, Cached, EntityId, FnMapper, Mapper, OneToMany, OneToOne,
};
pub use synchronous::SynchronousAdapter;
