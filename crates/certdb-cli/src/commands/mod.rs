pub mod config;
pub mod dispatch;
pub mod generate;
pub mod report;
pub mod run;
pub mod schema;
pub mod search;
pub mod serve;
pub mod states;
pub mod stats;
pub mod validate;
