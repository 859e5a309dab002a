pub mod build;

pub use build::{build, BuildArgs};
