pub mod name_resolution;
