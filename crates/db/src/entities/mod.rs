//! `SeaORM` entities for the finance tables.

// Items generated by `DeriveEntityModel` carry no docs.
#[allow(missing_docs)]
pub mod expense_records;
#[allow(missing_docs)]
pub mod income_records;
#[allow(missing_docs)]
pub mod transactions;
