pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use setup::{
    cookie_pair, json_body, login_ann, set_cookie, TestApp, TestAppBuilder, PASSWORD,
};
