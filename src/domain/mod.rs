mod account;
mod aggregate;
mod asset;
mod money;

pub use account::*;
pub use aggregate::*;
pub use asset::*;
pub use money::*;
