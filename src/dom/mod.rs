//! In-memory model of the page surfaces the engine enforces against.
//!
//! There is no real browser here; the enforcement chokepoints the engine
//! needs (element creation, attribute writes, tree insertion, cookies,
//! persistent storage, the dataLayer push log) are modeled explicitly so
//! every call site goes through them. The [`NetworkLog`] records each
//! resource fetch the "browser" would issue, which is the observable the
//! blocking guarantees are stated against.

mod document;
mod node;
mod surfaces;

pub use self::document::{Document, MutationBatch};
pub use self::node::{Element, ElementNode};
pub(crate) use self::node::descendants_including_self;
pub use self::surfaces::{Cookie, CookieJar, DataLayer, NetworkLog, StorageArea};
