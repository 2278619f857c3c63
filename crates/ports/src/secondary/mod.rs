pub mod enforcement_sink;
