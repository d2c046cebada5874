//! # lodos-db: Database Layer for Lodos POS
//!
//! Persistence and orchestration for the cart/discount/totals engine:
//! SQLite via sqlx, embedded migrations, repositories, and the
//! [`SaleEngine`] facade the presentation layer calls.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Lodos POS Data Flow                           │
//! │                                                                     │
//! │  Cashier screen (external)                                          │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │                   lodos-db (THIS CRATE)                     │   │
//! │  │                                                             │   │
//! │  │  ┌────────────┐   ┌──────────────┐   ┌──────────────────┐  │   │
//! │  │  │  Database  │   │ Repositories │   │    SaleEngine    │  │   │
//! │  │  │ (pool.rs)  │   │ item/campaign│   │ one transaction  │  │   │
//! │  │  │            │◄──│ /sale        │◄──│ per operation    │  │   │
//! │  │  └────────────┘   └──────────────┘   └──────────────────┘  │   │
//! │  │         embedded migrations (migrations/sqlite)             │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite database file (WAL mode, foreign keys on)                   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lodos_db::{Database, DbConfig};
//! use lodos_core::{LineDiscount, PaymentMethod};
//!
//! let db = Database::new(DbConfig::new("./lodos.db")).await?;
//! let engine = db.engine();
//!
//! let sale = engine.start_sale("ADA LOVELACE").await?;
//! engine.add_item(&sale.id, 1, 3, LineDiscount::NONE).await?;
//! let due = engine.amount_due(&sale.id).await?;
//! engine.finalize_payment(&sale.id, PaymentMethod::Cash, None).await?;
//! ```
//!
//! ## Concurrency Contract
//! One cashier terminal mutates one sale at a time; see [`engine`] for
//! the full statement of the single-caller assumption.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use engine::SaleEngine;
pub use error::{DbError, EngineError};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::campaign::CampaignRepository;
pub use repository::item::ItemRepository;
pub use repository::sale::SaleRepository;
