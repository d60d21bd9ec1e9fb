//! Entity models for the MicroCollab marketplace
//!
//! Plain records with string ids and timestamps. Referential integrity
//! between entities is by convention only; the services uphold it.

mod message;
mod notification;
mod offer;
mod request;
mod session;
mod user;

pub use message::{Message, MessageKind};
pub use notification::{Notification, NotificationKind};
pub use offer::{Offer, OfferStatus};
pub use request::{BudgetType, Request, RequestMode, RequestStatus, Urgency};
pub use session::{Session, SessionStatus};
pub use user::{AvailabilityStatus, User, UserRole};
