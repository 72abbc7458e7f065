//! Page queries and the polling window contract.

mod pages;
mod window;

pub use pages::paginate;
pub(crate) use pages::pages_for;
pub use window::PollWindow;
