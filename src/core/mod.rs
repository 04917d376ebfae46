pub mod callbacks;
pub mod context;
pub mod cursor;
pub mod interpolate;
pub mod rng;
pub mod vars;
