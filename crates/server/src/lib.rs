pub mod errors;
pub mod loaders;
pub mod proxy;
pub mod routes;
pub mod startup;

pub use startup::run;
