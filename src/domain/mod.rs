pub mod features;
pub mod plan;
pub mod subscription;
pub mod theme;

pub use features::*;
pub use plan::*;
pub use subscription::*;
pub use theme::*;
