pub mod cli;
pub mod paths;
pub mod serve;
