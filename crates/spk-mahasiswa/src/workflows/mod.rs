pub mod potential;
pub mod saw;
