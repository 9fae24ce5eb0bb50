pub mod subscription_state;
pub mod upgrade;

pub use subscription_state::*;
pub use upgrade::*;
