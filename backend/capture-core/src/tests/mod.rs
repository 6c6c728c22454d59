mod api_error;
mod cancellation;
mod credentials;
mod logger;
mod qr;
mod resource;
