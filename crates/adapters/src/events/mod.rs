pub mod json_lines_reader;
