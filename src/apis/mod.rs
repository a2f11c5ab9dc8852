// Venue extractor contract and registry
pub mod base;
pub mod factory;

// One extractor per venue site
pub mod bottom_lounge;
pub mod double_door;
pub mod empty_bottle;
pub mod house_of_blues;
pub mod lh_st;
pub mod metro;
pub mod subterranean;
pub mod thalia_hall;
