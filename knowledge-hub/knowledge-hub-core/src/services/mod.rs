pub mod accounts;
pub mod documents;

pub use accounts::{AccountService, Identity, ResetTicket, Session, DEFAULT_RESET_TTL};
pub use documents::{DocumentDetail, DocumentService, NewDocument};
