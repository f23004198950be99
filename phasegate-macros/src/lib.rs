//! Procedural macros for phasegate.
//!
//! This crate provides:
//! - `#[derive(Record)]` - implements `Record` from field annotations

use proc_macro::TokenStream;

mod record;

/// Derive macro for implementing the `Record` trait.
///
/// # Example
///
/// ```rust,ignore
/// use phasegate::{AuditStatus, Record, Yn};
///
/// #[derive(Debug, Clone, Record)]
/// #[record(name = "order")]
/// struct Order {
///     #[record(id)]
///     id: u64,
///     customer: String,
///     #[record(status)]
///     status: OrderStatus,
///     #[record(locked)]
///     locked: bool,
///     #[record(audit)]
///     audit: AuditStatus,
///     #[record(remark)]
///     remark: Option<String>,
/// }
/// ```
///
/// Capabilities follow the annotated fields: `status` enables
/// `UpdateStatus`, `locked` enables `UpdateLock`, `yn` enables `UpdateYn` and
/// `audit` enables `UpdateAuditStatus`.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive_record_impl(input)
}
