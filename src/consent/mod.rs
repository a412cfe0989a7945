mod decision;
mod store;

pub use decision::{ConsentDecision, ConsentState};
pub use store::ConsentStore;
