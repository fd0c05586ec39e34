//! Domain models for the Draftline cache.
//!
//! Two families of types live here:
//!
//! - **Records** (`CustomerRecord`, `DraftOrderRecord`) - upstream-shaped
//!   snapshots produced by the Shopify client or a webhook payload. They are
//!   the only input accepted by repository upserts.
//! - **Entities** (`Customer`, `DraftOrder`, ...) - rows read back from the
//!   Entity Store with their direct relations loaded.

pub mod address;
pub mod customer;
pub mod draft_order;

pub use address::{Address, AddressRecord, Country};
pub use customer::{Company, Customer, CustomerRecord};
pub use draft_order::{CustomerSummary, DraftOrder, DraftOrderRecord, DraftOrderTag};

/// One page of a cursor-paginated upstream connection.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Records on this page, in upstream order.
    pub items: Vec<T>,
    /// Whether another page follows.
    pub has_next_page: bool,
    /// Cursor of the last edge; pass as `after` to fetch the next page.
    pub end_cursor: Option<String>,
}

impl<T> Page<T> {
    /// A final page holding `items`.
    #[must_use]
    pub const fn last(items: Vec<T>) -> Self {
        Self {
            items,
            has_next_page: false,
            end_cursor: None,
        }
    }
}
