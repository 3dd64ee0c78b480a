mod admin_tests;
mod query_tests;
