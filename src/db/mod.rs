//! Database layer: the document store port and its adapters.

pub mod firestore;
pub mod memory;
pub mod store;

pub use self::firestore::FirestoreStore;
pub use memory::MemoryStore;
pub use store::{
    CollectionPath, Direction, Document, DocumentId, DocumentPath, DocumentStore, DocumentWrite,
    Fields, OrderedQuery, SnapshotEvent, StoreError, Subscription, SubscriptionHandle,
};

/// Collection names as constants.
pub mod collections {
    /// User profiles, keyed by auth uid.
    pub const USERS: &str = "users";
    /// Rides, nested under each user document.
    pub const RIDES: &str = "rides";
}

/// Field names shared by the models and the queries.
pub mod fields {
    pub const PICKUP: &str = "pickup";
    pub const DROP: &str = "drop";
    pub const CREATED_AT: &str = "createdAt";
    pub const NAME: &str = "name";
    pub const EMAIL: &str = "email";
    pub const UPDATED_AT: &str = "updatedAt";
}

use collections::{RIDES, USERS};

/// `users/{uid}`
pub fn profile_path(uid: &str) -> DocumentPath {
    CollectionPath::root(USERS).doc(uid)
}

/// `users/{uid}/rides`
pub fn rides_collection(uid: &str) -> CollectionPath {
    profile_path(uid).sub_collection(RIDES)
}
