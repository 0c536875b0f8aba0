mod traits;
pub use traits::*;

mod types;
pub use types::*;

mod machine;
pub use machine::*;

mod session;
pub use session::*;
