pub mod envelope;
pub mod error;
pub mod http;
pub mod repository;

pub use error::ClientError;
pub use http::UniverseClient;
pub use repository::UniverseRepository;
