pub mod mock_upstream;

#[allow(unused_imports)]
pub use mock_upstream::{build_query, build_query_with_edns, MockBehavior, MockUpstream};
