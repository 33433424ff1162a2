pub mod bets;
pub mod headshots;
pub mod interactions;
pub mod pages;
pub mod share;
pub mod snap;
