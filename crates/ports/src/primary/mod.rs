pub mod controller_events;
