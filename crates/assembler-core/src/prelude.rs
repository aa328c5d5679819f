//! Assembler prelude.
//!
//! Curated re-exports for configuring and running assembly passes.

pub use crate::{
    cached, from_fn, one_to_many, one_to_many_as_list, one_to_many_as_set, one_to_one,
    one_to_one_with_default, AggregationFailure, Assembler, AssemblerAdapter, EntitySource,
    Mapper, RetrievalFailure, SynchronousAdapter,
};
