pub mod debounce;
pub mod error;
pub mod favorites;
pub mod gateway;
pub mod models;
pub mod pager;
pub mod planner;
pub mod prefs;
pub mod service;
pub mod spoonacular;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
