//! Pure computation: reconciliation, cost basis, portfolio view, formatting.

pub mod cost;
pub mod format;
pub mod portfolio;
pub mod reconcile;

pub use reconcile::reconcile;
