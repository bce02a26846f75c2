pub mod sources;
pub mod store;

#[allow(unused_imports)]
pub use sources::{FakeEol, FakeTags, build_app};
#[allow(unused_imports)]
pub use store::create_test_store;
