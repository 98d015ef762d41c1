//! Domain models shared by the repositories, services and routes.
//!
//! Models never carry password hashes. Repositories hand hashes out
//! separately so a model can be serialized without leaking secrets.

pub mod admin_user;
pub mod affiliate;
pub mod coupon;
pub mod order;
pub mod product;
pub mod store;
pub mod tracking_link;

pub use admin_user::{AdminUser, PlatformRole, PlatformUser};
pub use affiliate::{Affiliate, PublicAffiliate, Sale};
pub use coupon::Coupon;
pub use order::{CustomerAddress, Order, OrderItem};
pub use product::Product;
pub use store::{AdminStore, OwnerStore, PublicStore, Store, StoreCredential};
pub use tracking_link::TrackingLink;
