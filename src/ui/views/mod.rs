pub mod detail;
pub mod results;
