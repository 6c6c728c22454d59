//! Response decoding contracts.
//!
//! A resource's contract is a type parameter, so each request kind carries
//! exactly one decode function and the transport never switches on the kind.

use crate::transport::response::HttpResponse;

use models::ExtractionResult;

use std::marker::PhantomData;

use serde::de::DeserializeOwned;

/// How a successful (200..400) response body becomes a typed value.
pub trait ResponseContract: Send + Sync + 'static {
    type Output: Send + 'static;

    /// Decode the response. The returned message ends up in `parse_error`.
    fn decode(response: &HttpResponse) -> Result<Self::Output, String>;
}

/// JSON body deserialized into `T`.
pub struct Json<T>(PhantomData<fn() -> T>);

impl<T> ResponseContract for Json<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Output = T;

    fn decode(response: &HttpResponse) -> Result<T, String> {
        serde_json::from_slice(&response.body).map_err(|e| e.to_string())
    }
}

/// Raw body bytes (binary download).
pub struct RawBytes;

impl ResponseContract for RawBytes {
    type Output = Vec<u8>;

    fn decode(response: &HttpResponse) -> Result<Vec<u8>, String> {
        Ok(response.body.clone())
    }
}

/// Body is ignored.
pub struct Empty;

impl ResponseContract for Empty {
    type Output = ();

    fn decode(_response: &HttpResponse) -> Result<(), String> {
        Ok(())
    }
}

/// `201 Created`; yields the `Location` header.
pub struct Created;

impl ResponseContract for Created {
    type Output = String;

    fn decode(response: &HttpResponse) -> Result<String, String> {
        response
            .header("location")
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| format!("HTTP {} without Location header", response.status))
    }
}

/// Extraction result JSON (`extractions`, `compoundExtractions`, `lineItems`).
pub struct Extractions;

impl ResponseContract for Extractions {
    type Output = ExtractionResult;

    fn decode(response: &HttpResponse) -> Result<ExtractionResult, String> {
        ExtractionResult::from_json(&response.body).map_err(|e| e.to_string())
    }
}
