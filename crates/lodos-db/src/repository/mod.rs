//! # Repository Module
//!
//! Database repository implementations for Lodos POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Caller                                                             │
//! │    │  db.items().list()                                             │
//! │    ▼                                                                │
//! │  ItemRepository / CampaignRepository / SaleRepository               │
//! │    │  SQL isolated in one place per table                           │
//! │    ▼                                                                │
//! │  SQLite database                                                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories cover the single-statement read and management surfaces.
//! Multi-statement cart mutations live in [`crate::engine`], which runs
//! them inside one transaction per call; the executor-generic helper
//! functions in these modules are shared with it so the same SQL serves
//! both paths.
//!
//! ## Available Repositories
//!
//! - [`item::ItemRepository`] - Catalog reads and management
//! - [`campaign::CampaignRepository`] - Campaign rule reads and management
//! - [`sale::SaleRepository`] - Sale lookups, listings, report export

pub mod campaign;
pub mod item;
pub mod sale;
