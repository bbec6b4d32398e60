pub mod layered_map;
pub mod map_controls;
pub mod stats_bar;
