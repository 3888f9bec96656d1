pub mod blink;
pub mod challenge;
pub mod config;
pub mod letters;
pub mod machine;
pub mod slides;
