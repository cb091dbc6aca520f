//! # Repository Modules
//!
//! One repository per aggregate. Reads go through the pool; every
//! mutation takes the caller's `&mut SqliteConnection`, so a use case
//! threads one transaction through all the rows it touches.

pub mod correlative;
pub mod party;
pub mod product;
pub mod purchase;
pub mod sale;

pub use correlative::{format_document_number, CorrelativeRepository};
pub use party::PartyRepository;
pub use product::ProductRepository;
pub use purchase::PurchaseRepository;
pub use sale::SaleRepository;
