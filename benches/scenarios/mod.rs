//! Scenario benchmarks: whole patches rather than single primitives.

mod render;
mod routing;

pub use render::bench_render;
pub use routing::bench_routing;
