mod auth;
mod customers;
mod employees;
mod health_check;
mod orders;
mod products;

pub use auth::*;
pub use customers::*;
pub use employees::*;
pub use health_check::*;
pub use orders::*;
pub use products::*;
