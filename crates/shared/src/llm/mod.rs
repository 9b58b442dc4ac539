pub mod extract;
pub mod gateway;
pub mod mistral;

pub use extract::extract_json_payload;
pub use gateway::{GenerateFuture, TextGenerationError, TextGenerator};
pub use mistral::{MistralGateway, MistralGatewayConfig};
