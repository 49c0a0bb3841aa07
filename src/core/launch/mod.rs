pub mod classpath;

pub use classpath::{build_classpath, get_classpath_separator, merge_libraries};
