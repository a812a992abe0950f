pub mod immich;
