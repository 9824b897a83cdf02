mod canteen_world;
mod steps;

pub use canteen_world::CanteenWorld;
