mod pipeline_tests;
mod router_tests;
mod store_tests;
pub mod utils;
