pub mod executor;
pub mod options;

pub use executor::RequestExecutor;
pub use options::RequestOptions;
