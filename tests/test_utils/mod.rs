pub mod collector;
pub mod mock_http;
