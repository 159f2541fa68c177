pub mod cost;
pub mod offers;
pub mod prices;
pub mod rank;
