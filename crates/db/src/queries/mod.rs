pub mod favorite_channels;
pub mod fetched_ranges;
pub mod stream_events;
