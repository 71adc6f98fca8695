pub mod basin;
pub mod junction;
pub mod reach;
pub mod segment;
