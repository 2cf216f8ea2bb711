pub mod cart;
pub mod favorites;
pub mod ingredients;
pub mod recipes;
pub mod subscriptions;
pub mod tags;
pub mod users;
