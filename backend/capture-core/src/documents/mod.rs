pub mod api;
pub mod pipeline;
pub mod qr;

pub use api::DocumentApi;
pub use pipeline::CompositionPipeline;
pub use qr::{PaymentQrCode, extraction_result_from_qr};
