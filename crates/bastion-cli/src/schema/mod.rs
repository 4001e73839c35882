pub mod scenario;
pub mod solution;
