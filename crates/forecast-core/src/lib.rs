pub mod error;
pub mod prepare;
pub mod traits;
pub mod types;
pub mod validate;

pub use error::*;
pub use prepare::*;
pub use traits::*;
pub use types::*;
pub use validate::*;
