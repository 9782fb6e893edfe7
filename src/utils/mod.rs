pub mod curl_parser;
pub mod file_size;
