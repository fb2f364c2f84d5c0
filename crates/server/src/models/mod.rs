//! Domain models backing the transactional stores and the conversation log.

pub mod message;
pub mod order;
pub mod product;
pub mod wallet;

pub use message::ChatRecord;
pub use order::Order;
pub use product::Product;
pub use wallet::Wallet;
