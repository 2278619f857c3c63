pub mod channel_sink;
pub mod json_lines_sink;
pub mod log_sink;
