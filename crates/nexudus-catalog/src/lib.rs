//! Nexudus tenant catalog client
//!
//! Fetches and caches the product catalog (membership plans and room
//! bookings) of a single Nexudus tenant. Requests are authenticated by
//! `nexudus-auth`; rejected tokens are refreshed once and the request
//! retried once before the failure surfaces.
//!
//! Fetch pipeline:
//! 1. `ProductService::get_products()` checks the partition cache
//! 2. On a miss, `ApiClient` walks the paginated listing endpoints
//! 3. Raw objects are normalized into `ProductRecord`s
//! 4. Results are cached per partition with the configured TTL
//! 5. Upstream failures fall back to a still-cached copy when one exists

pub mod client;
pub mod endpoints;
pub mod error;
pub mod products;
pub mod records;

pub use client::ApiClient;
pub use endpoints::*;
pub use error::{Error, Result};
pub use products::ProductService;
pub use records::{ProductRecord, ProductType};
