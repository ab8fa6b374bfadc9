//! Pure cart and order rules. Nothing in here touches the database, so the
//! services can apply the rules inside their transactions and the rules can
//! be exercised directly in tests.

pub mod cart;
pub mod order;
