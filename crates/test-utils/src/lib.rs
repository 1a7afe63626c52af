//! Test helpers shared by the lidar crates.
//!
//! - [`LnaFileBuilder`] writes synthetic instrument files byte for byte
//! - [`generators`] builds timestamp series and small in-memory datasets
//! - [`fixtures`] holds vendor channel tokens and their display names
//!
//! ```ignore
//! use test_utils::{minute_timestamps, LnaFileBuilder};
//! ```

pub mod fixtures;
pub mod generators;
pub mod lna_builder;

pub use fixtures::*;
pub use generators::*;
pub use lna_builder::*;

/// Assert that two numbers differ by at most `epsilon`.
///
/// Both sides are compared as `f64`, so `f32` channel samples can be checked
/// against literal expectations directly.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        if !((left - right).abs() <= epsilon) {
            panic!(
                "approximate equality failed: {} vs {} (tolerance {})",
                left, right, epsilon
            );
        }
    }};
}
